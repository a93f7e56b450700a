use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    /// Gemini REST API
    #[default]
    Gemini,
    /// Claude CLI (`claude -p`)
    Claude,
}

impl AiProvider {
    pub fn display_name(&self) -> &'static str {
        match self {
            AiProvider::Gemini => "gemini",
            AiProvider::Claude => "claude",
        }
    }

    /// APIキーが必要か
    pub fn requires_api_key(&self) -> bool {
        matches!(self, AiProvider::Gemini)
    }
}
