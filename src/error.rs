//! Generation errors and their user-facing messages

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GenerationError {
    #[error("API key is missing. Set GEMINI_API_KEY or providers.gemini.api_key")]
    MissingApiKey,

    #[error("Keywords must not be empty")]
    EmptyKeywords,

    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("API request failed: {0}")]
    Transport(String),

    #[error("No response text from model")]
    EmptyResponse,

    #[error("Malformed recipe: {0}")]
    MalformedRecipe(String),

    #[error("No image generated")]
    NoImage,

    #[error("Blocked by SAFETY filter: {0}")]
    Blocked(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => GenerationError::Api {
                status: status.as_u16(),
                message: e.to_string(),
            },
            None => GenerationError::Transport(e.to_string()),
        }
    }
}

impl GenerationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::MissingApiKey => ErrorKind::MissingCredential,
            GenerationError::Blocked(_) => ErrorKind::SafetyFiltered,
            GenerationError::EmptyResponse
            | GenerationError::MalformedRecipe(_)
            | GenerationError::NoImage => ErrorKind::MalformedResponse,
            GenerationError::Api { .. }
            | GenerationError::Transport(_)
            | GenerationError::EmptyKeywords => ErrorKind::classify(&self.to_string()),
        }
    }

    /// Localized message suitable for showing to the user
    pub fn user_message(&self, locale: Locale) -> &'static str {
        self.kind().message(locale)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingCredential,
    RateLimited,
    Overloaded,
    SafetyFiltered,
    MalformedResponse,
    Unknown,
}

/// Substring markers checked in order against the stringified error.
const MARKERS: &[(&str, ErrorKind)] = &[
    ("api key", ErrorKind::MissingCredential),
    ("api_key", ErrorKind::MissingCredential),
    ("429", ErrorKind::RateLimited),
    ("resource_exhausted", ErrorKind::RateLimited),
    ("quota", ErrorKind::RateLimited),
    ("503", ErrorKind::Overloaded),
    ("unavailable", ErrorKind::Overloaded),
    ("overloaded", ErrorKind::Overloaded),
    ("safety", ErrorKind::SafetyFiltered),
    ("blocked", ErrorKind::SafetyFiltered),
];

impl ErrorKind {
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        MARKERS
            .iter()
            .find(|(marker, _)| lower.contains(marker))
            .map(|(_, kind)| *kind)
            .unwrap_or(ErrorKind::Unknown)
    }

    pub fn message(self, locale: Locale) -> &'static str {
        match (locale, self) {
            (Locale::Ja, ErrorKind::MissingCredential) => {
                "APIキーが設定されていません。環境設定を確認してください。"
            }
            (Locale::Ja, ErrorKind::RateLimited) => {
                "リクエストが集中しています。1分ほど待ってから再度お試しください。"
            }
            (Locale::Ja, ErrorKind::Overloaded) => {
                "現在AIシェフの厨房が混み合っています。しばらくしてから再度お試しください。"
            }
            (Locale::Ja, ErrorKind::SafetyFiltered) => {
                "安全フィルターによりレシピを作成できませんでした。別のキーワードでお試しください。"
            }
            (Locale::Ja, ErrorKind::MalformedResponse) => {
                "シェフのレシピが正しく届きませんでした。もう一度お試しください。"
            }
            (Locale::Ja, ErrorKind::Unknown) => {
                "申し訳ありません。現在シェフが多忙のようです。少し時間を置いて再度お試しください。"
            }
            (Locale::En, ErrorKind::MissingCredential) => {
                "The API key is missing. Please check your environment configuration."
            }
            (Locale::En, ErrorKind::RateLimited) => {
                "Too many orders at once. Please wait a minute and try again."
            }
            (Locale::En, ErrorKind::Overloaded) => {
                "The AI kitchen is overloaded right now. Please try again shortly."
            }
            (Locale::En, ErrorKind::SafetyFiltered) => {
                "The safety filter declined this request. Please try different keywords."
            }
            (Locale::En, ErrorKind::MalformedResponse) => {
                "The chef's recipe did not arrive intact. Please try again."
            }
            (Locale::En, ErrorKind::Unknown) => {
                "Sorry, the chef is busy at the moment. Please try again later."
            }
        }
    }
}

/// Language for user-facing text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    Ja,
    En,
}

impl std::str::FromStr for Locale {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ja" | "jp" | "japanese" => Ok(Locale::Ja),
            "en" | "english" => Ok(Locale::En),
            other => anyhow::bail!("Unknown locale: {} (expected ja or en)", other),
        }
    }
}

impl std::fmt::Display for Locale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locale::Ja => write!(f, "ja"),
            Locale::En => write!(f, "en"),
        }
    }
}
