// src/domain/filters.rs
//
// Filter configuration consumed from the UI layer. One configuration is
// active at a time; changing any field rebuilds the whole pipeline.

use serde::{Deserialize, Serialize};

/// Closed year range preset, or no period restriction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodPreset {
    #[default]
    Any,
    Range { from: i32, to: i32 },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedFilters {
    /// Free-text query forwarded to every source.
    pub query: String,
    pub medium: Option<String>,
    pub geography: Option<String>,
    #[serde(default)]
    pub period: PeriodPreset,
    /// Selected source subset by tag; `None` means all sources.
    pub allowed_sources: Option<Vec<String>>,
}

impl FeedFilters {
    pub fn allows_source(&self, tag: &str) -> bool {
        match &self.allowed_sources {
            Some(tags) => tags.iter().any(|t| t == tag),
            None => true,
        }
    }
}
