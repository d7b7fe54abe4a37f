use anyhow::Result;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

use scout::models::message::Message;

pub fn ensure_session_dir() -> Result<PathBuf> {
    let home_dir =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    let config_dir = home_dir.join(".config").join("scout").join("sessions");

    if !config_dir.exists() {
        fs::create_dir_all(&config_dir)?;
    }

    Ok(config_dir)
}

/// Resolve the recording path for a session, creating the session directory
/// if needed. Unnamed sessions get a timestamp for a name.
pub fn session_file_path(name: Option<&str>) -> Result<PathBuf> {
    let dir = ensure_session_dir()?;
    let name = match name {
        Some(name) => name.to_string(),
        None => chrono::Local::now().format("%Y%m%d_%H%M%S").to_string(),
    };
    Ok(dir.join(format!("{}.jsonl", name)))
}

pub fn persist_messages(session_file: &PathBuf, messages: &[Message]) -> Result<()> {
    let file = fs::File::create(session_file)?; // Create or truncate the file
    let mut writer = std::io::BufWriter::new(file);

    for message in messages {
        serde_json::to_writer(&mut writer, message)?;
        writeln!(writer)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn load_messages(session_file: &PathBuf) -> Result<Vec<Message>> {
    let raw = fs::read_to_string(session_file)?;
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| Ok(serde_json::from_str(line)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persist_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.jsonl");

        let messages = vec![
            Message::user().with_text("hello"),
            Message::assistant().with_text("hi there"),
        ];
        persist_messages(&file, &messages).unwrap();

        let loaded = load_messages(&file).unwrap();
        assert_eq!(loaded, messages);
    }

    #[test]
    fn test_persist_truncates_previous_contents() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("session.jsonl");

        persist_messages(&file, &[Message::user().with_text("one")]).unwrap();
        persist_messages(&file, &[Message::user().with_text("two")]).unwrap();

        let loaded = load_messages(&file).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].content[0].as_text(), Some("two"));
    }
}
