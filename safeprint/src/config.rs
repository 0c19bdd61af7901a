//! Printer configuration.

use serde::{Deserialize, Serialize};

use crate::{
    error::ConfigError,
    policy::{KeyMatch, MASK_CHAR, MaskOptions},
};

/// Containers with more children than this render as a single diagnostic.
pub const DEFAULT_MAX_CONTAINER_LEN: usize = 128;

/// Replacement text for fully masked values.
pub const DEFAULT_MASK_TOKEN: &str = "***";

/// Composites nested deeper than this render as a single diagnostic.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Knobs for a [`Printer`](crate::Printer).
///
/// Every field has a default, so a partial JSON document is a valid config:
///
/// ```rust
/// use safeprint::PrinterConfig;
///
/// let config = PrinterConfig::from_json_str(r#"{"max_container_len": 16}"#).unwrap();
/// assert_eq!(config.max_container_len, 16);
/// assert_eq!(config.mask_token, "***");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PrinterConfig {
    /// Maximum element/field count rendered for one composite.
    pub max_container_len: usize,
    /// Maximum nesting depth of composites.
    pub max_depth: usize,
    /// Replacement text for fully masked values.
    pub mask_token: String,
    /// Character used by partial masks.
    pub mask_char: char,
    /// How selector names are compared with field names and map keys.
    pub key_match: KeyMatch,
    /// Prefix records with their short type name (`User{...}`).
    pub type_names: bool,
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self {
            max_container_len: DEFAULT_MAX_CONTAINER_LEN,
            max_depth: DEFAULT_MAX_DEPTH,
            mask_token: DEFAULT_MASK_TOKEN.to_owned(),
            mask_char: MASK_CHAR,
            key_match: KeyMatch::Exact,
            type_names: false,
        }
    }
}

impl PrinterConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn with_max_container_len(mut self, max_container_len: usize) -> Self {
        self.max_container_len = max_container_len;
        self
    }

    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    #[must_use]
    pub fn with_mask_token(mut self, mask_token: impl Into<String>) -> Self {
        self.mask_token = mask_token.into();
        self
    }

    #[must_use]
    pub fn with_mask_char(mut self, mask_char: char) -> Self {
        self.mask_char = mask_char;
        self
    }

    #[must_use]
    pub fn with_key_match(mut self, key_match: KeyMatch) -> Self {
        self.key_match = key_match;
        self
    }

    #[must_use]
    pub fn with_type_names(mut self, type_names: bool) -> Self {
        self.type_names = type_names;
        self
    }

    pub fn mask_options(&self) -> MaskOptions<'_> {
        MaskOptions {
            token: &self.mask_token,
            mask_char: self.mask_char,
            key_match: self.key_match,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = PrinterConfig::default();
        assert_eq!(config.max_container_len, 128);
        assert_eq!(config.mask_token, "***");
        assert_eq!(config.key_match, KeyMatch::Exact);
        assert!(!config.type_names);
    }

    #[test]
    fn json_overrides_selected_fields() {
        let config = PrinterConfig::from_json_str(
            r#"{"mask_token": "[MASKED]", "key_match": "ignore_ascii_case", "type_names": true}"#,
        )
        .unwrap();
        assert_eq!(config.mask_token, "[MASKED]");
        assert_eq!(config.key_match, KeyMatch::IgnoreAsciiCase);
        assert!(config.type_names);
        assert_eq!(config.max_container_len, DEFAULT_MAX_CONTAINER_LEN);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = PrinterConfig::from_json_str(r#"{"max_len": 3}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Decode(_)));
    }

    #[test]
    fn builder_methods_feed_mask_options() {
        let config = PrinterConfig::default()
            .with_mask_token("<x>")
            .with_mask_char('#')
            .with_key_match(KeyMatch::IgnoreAsciiCase);
        let options = config.mask_options();
        assert_eq!(options.token, "<x>");
        assert_eq!(options.mask_char, '#');
        assert_eq!(options.key_match, KeyMatch::IgnoreAsciiCase);
    }
}
