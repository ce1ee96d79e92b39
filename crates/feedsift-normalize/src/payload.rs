use serde::{Deserialize, Serialize};

/// Which family of adapter produced a payload.
///
/// Loaded as part of the adapter configuration table and passed explicitly
/// into [`crate::normalize`]; never read from ambient global state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Rss,
    Api,
    Search,
    Social,
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceKind::Rss => write!(f, "rss"),
            SourceKind::Api => write!(f, "api"),
            SourceKind::Search => write!(f, "search"),
            SourceKind::Social => write!(f, "social"),
        }
    }
}

/// Raw fields handed over by an external feed adapter, before normalization.
///
/// Every field except `url` is optional; adapters populate what their source
/// provides and the normalizer fills the rest with empty strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourcePayload {
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Raw timestamp string exactly as the source emitted it.
    #[serde(default)]
    pub published: Option<String>,
}
