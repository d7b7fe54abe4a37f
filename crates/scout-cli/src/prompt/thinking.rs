use rand::seq::SliceRandom;

const THINKING_MESSAGES: &[&str] = &[
    "Thinking",
    "Scouting ahead",
    "Consulting the notes",
    "Following the thread",
    "Digging through the stacks",
    "Connecting the dots",
    "Checking the sources",
    "Chewing on it",
];

pub fn get_random_thinking_message() -> &'static str {
    THINKING_MESSAGES
        .choose(&mut rand::thread_rng())
        .unwrap_or(&THINKING_MESSAGES[0])
}
