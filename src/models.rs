use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    Question,
    Answer,
    /// A request that never produced an answer.
    Error,
}

/// One entry of the transcript. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: TurnRole,
    text: String,
}

impl Turn {
    pub fn question(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Question,
            text: text.into(),
        }
    }

    pub fn answer(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Answer,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Error,
            text: text.into(),
        }
    }

    pub const fn role(&self) -> TurnRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Overridden by `ENIGMA_API_KEY` when that is set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub theme: ThemeConfig,
}

fn default_api_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_model() -> String {
    "gemini-1.5-flash-latest".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            model: default_model(),
            api_key: None,
            theme: ThemeConfig::default(),
        }
    }
}

#[allow(clippy::struct_field_names)]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeConfig {
    pub question_color: String,
    pub answer_color: String,
    pub border_color: String,
    pub particle_color: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            question_color: "blue".to_string(),
            answer_color: "gray".to_string(),
            border_color: "darkgray".to_string(),
            particle_color: "white".to_string(),
        }
    }
}
