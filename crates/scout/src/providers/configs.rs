/// Connection settings for an OpenAI-compatible chat completions endpoint.
/// Pointing `host` at any server speaking the same protocol works; the model
/// backend is a capability, not a vendor.
#[derive(Debug, Clone)]
pub struct OpenAiProviderConfig {
    pub host: String,
    pub api_key: String,
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<i32>,
}
