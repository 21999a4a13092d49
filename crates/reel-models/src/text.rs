//! Text overlay strategies.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Overlay used when no usable text was supplied.
pub const DEFAULT_OVERLAY_TEXT: &str = "AI Generated Video";

/// How per-segment overlay strings are chosen.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TextStrategy {
    /// Same overlay for every segment
    #[default]
    OneForAll,
    /// Language-model variations of a base text, base first
    BaseVary,
    /// Caller supplies one overlay per segment
    UniqueForAll,
}

impl TextStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextStrategy::OneForAll => "one_for_all",
            TextStrategy::BaseVary => "base_vary",
            TextStrategy::UniqueForAll => "unique_for_all",
        }
    }
}

/// Text input for the chosen strategy.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct TextInput {
    /// Overlay strategy
    #[serde(default)]
    pub strategy: TextStrategy,

    /// Base text for OneForAll and BaseVary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_text: Option<String>,

    /// Context passed verbatim to the language model (e.g. "sales",
    /// "engagement", "educational")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Individual text for each segment (UniqueForAll)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_texts: Option<Vec<String>>,
}

impl TextInput {
    /// OneForAll input with the given base text.
    pub fn one_for_all(base_text: impl Into<String>) -> Self {
        Self {
            strategy: TextStrategy::OneForAll,
            base_text: Some(base_text.into()),
            ..Default::default()
        }
    }

    /// BaseVary input with an optional context.
    pub fn base_vary(base_text: impl Into<String>, context: Option<String>) -> Self {
        Self {
            strategy: TextStrategy::BaseVary,
            base_text: Some(base_text.into()),
            context,
            ..Default::default()
        }
    }

    /// UniqueForAll input with per-segment texts.
    pub fn unique_for_all(texts: Vec<String>) -> Self {
        Self {
            strategy: TextStrategy::UniqueForAll,
            unique_texts: Some(texts),
            ..Default::default()
        }
    }

    /// The base text, defaulting to the fallback literal.
    pub fn base_or_default(&self) -> &str {
        self.base_text
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_OVERLAY_TEXT)
    }
}
