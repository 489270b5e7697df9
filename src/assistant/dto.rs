use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftMode {
    Announcement,
    #[default]
    General,
}

#[derive(Debug, Deserialize)]
pub struct DraftRequest {
    pub prompt: String,
    #[serde(default)]
    pub mode: DraftMode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DraftResponse {
    pub reply: String,
    /// False when `reply` is a placeholder rather than generated text.
    pub generated: bool,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionRequest {
    pub house_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub suggestions: Vec<String>,
    pub fallback: bool,
}
