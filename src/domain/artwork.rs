// src/domain/artwork.rs
//
// Artwork record and tagged identifier.
//
// CRITICAL RULES:
// - Artwork is immutable once constructed by a source
// - Sources hand back complete records or a failure, never partial records
// - ArtworkId is the only artifact that crosses the pipeline boundary and
//   must round-trip through dispatch unchanged

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Tagged identifier in the form `"<tag>:<local-id>"`.
///
/// The tag is a short lowercase source code (met, aic, cma, getty, rijks,
/// yale, ...) used by the pool aggregator to dispatch resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtworkId(String);

impl ArtworkId {
    /// Build an identifier from a source tag and its local id.
    pub fn new(tag: &str, local_id: &str) -> Self {
        ArtworkId(format!("{}:{}", tag, local_id))
    }

    /// The source tag prefix.
    pub fn tag(&self) -> &str {
        // Constructed/parsed ids always contain the separator
        self.0.split(':').next().unwrap_or("")
    }

    /// The source-local part after the tag.
    pub fn local_id(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, local)) => local,
            None => "",
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ArtworkId {
    type Err = AppError;

    fn from_str(s: &str) -> AppResult<Self> {
        let (tag, local) = s
            .split_once(':')
            .ok_or_else(|| AppError::Malformed(format!("identifier without tag: '{}'", s)))?;

        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_lowercase()) {
            return Err(AppError::Malformed(format!(
                "identifier tag must be lowercase ascii: '{}'",
                s
            )));
        }
        if local.is_empty() {
            return Err(AppError::Malformed(format!(
                "identifier missing local id: '{}'",
                s
            )));
        }

        Ok(ArtworkId(s.to_string()))
    }
}

impl fmt::Display for ArtworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A resolved public-domain artwork.
///
/// Created by an `ArtSource` during resolution, never mutated afterwards,
/// discarded when evicted from history or the prefetch buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artwork {
    pub id: ArtworkId,
    pub title: String,
    pub artist: String,
    pub date: Option<String>,
    pub medium: Option<String>,
    pub image_url: String,
    pub source_name: String,
    pub source_url: Option<String>,
    /// Free-form string-keyed debug metadata from the source.
    pub metadata: serde_json::Value,
}

impl Artwork {
    pub fn new(
        id: ArtworkId,
        title: String,
        artist: String,
        image_url: String,
        source_name: String,
    ) -> Self {
        Self {
            id,
            title,
            artist,
            date: None,
            medium: None,
            image_url,
            source_name,
            source_url: None,
            metadata: serde_json::Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_round_trip() {
        let id: ArtworkId = "met:436535".parse().unwrap();
        assert_eq!(id.tag(), "met");
        assert_eq!(id.local_id(), "436535");
        assert_eq!(id.to_string(), "met:436535");

        let again: ArtworkId = id.to_string().parse().unwrap();
        assert_eq!(id, again);
    }

    #[test]
    fn test_local_id_may_contain_separator() {
        let id: ArtworkId = "rijks:SK-A-1505:v2".parse().unwrap();
        assert_eq!(id.tag(), "rijks");
        assert_eq!(id.local_id(), "SK-A-1505:v2");
    }

    #[test]
    fn test_malformed_identifiers_rejected() {
        assert!(matches!(
            "no-separator".parse::<ArtworkId>(),
            Err(AppError::Malformed(_))
        ));
        assert!(matches!(
            ":123".parse::<ArtworkId>(),
            Err(AppError::Malformed(_))
        ));
        assert!(matches!(
            "met:".parse::<ArtworkId>(),
            Err(AppError::Malformed(_))
        ));
        assert!(matches!(
            "MET:123".parse::<ArtworkId>(),
            Err(AppError::Malformed(_))
        ));
    }

    #[test]
    fn test_identifier_serde_transparent() {
        let id = ArtworkId::new("aic", "27992");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"aic:27992\"");
        let back: ArtworkId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
