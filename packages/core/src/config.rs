//! Configuration for a value tree

use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Separator between property names in dotted paths
pub const PATH_SEPARATOR: char = '.';

/// Longest name accepted for the array schema pseudo-property
const MAX_SCHEMA_PROPERTY_NAME_LENGTH: usize = 128;

/// How property names are compared inside an object
///
/// The same policy is used for lookups, renames and unique-name generation,
/// so an object never holds two names that compare equal under it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NameComparison {
    /// Names must match exactly (`"Name"` and `"name"` are different properties)
    #[default]
    CaseSensitive,

    /// Names match regardless of letter case (`"Name"` collides with `"name"`)
    CaseInsensitive,
}

impl NameComparison {
    /// Fold a name into the form used for equality checks
    pub fn normalize<'a>(&self, name: &'a str) -> Cow<'a, str> {
        match self {
            Self::CaseSensitive => Cow::Borrowed(name),
            Self::CaseInsensitive => Cow::Owned(name.to_lowercase()),
        }
    }

    /// Whether two names refer to the same property under this policy
    pub fn matches(&self, left: &str, right: &str) -> bool {
        match self {
            Self::CaseSensitive => left == right,
            Self::CaseInsensitive => left == right || left.to_lowercase() == right.to_lowercase(),
        }
    }
}

/// Configuration shared by every node of a [`ValueTree`](crate::models::ValueTree)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ModelConfig {
    /// Property-name comparison policy
    pub name_comparison: NameComparison,

    /// Name under which an array's schema is exposed as a pseudo-property
    pub schema_property_name: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name_comparison: NameComparison::CaseSensitive,
            schema_property_name: "Schema".to_string(),
        }
    }
}

impl ModelConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_property_name.trim().is_empty() {
            return Err("schema_property_name cannot be empty".to_string());
        }

        if self.schema_property_name.len() > MAX_SCHEMA_PROPERTY_NAME_LENGTH {
            return Err(format!(
                "schema_property_name cannot exceed {} bytes",
                MAX_SCHEMA_PROPERTY_NAME_LENGTH
            ));
        }

        if self.schema_property_name.contains(PATH_SEPARATOR) {
            return Err(format!(
                "schema_property_name cannot contain the path separator '{}'",
                PATH_SEPARATOR
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config() {
        let config = ModelConfig::default();
        assert_eq!(config.name_comparison, NameComparison::CaseSensitive);
        assert_eq!(config.schema_property_name, "Schema");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = ModelConfig::default();

        // Invalid: blank schema name
        config.schema_property_name = "  ".to_string();
        assert!(config.validate().is_err());

        // Invalid: path separator
        config.schema_property_name = "items.schema".to_string();
        assert!(config.validate().is_err());

        // Invalid: oversized name
        config.schema_property_name = "s".repeat(MAX_SCHEMA_PROPERTY_NAME_LENGTH + 1);
        assert!(config.validate().is_err());

        config.schema_property_name = "Template".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialization_fills_defaults() {
        let config: ModelConfig =
            serde_json::from_value(json!({ "nameComparison": "caseInsensitive" })).unwrap();
        assert_eq!(config.name_comparison, NameComparison::CaseInsensitive);
        assert_eq!(config.schema_property_name, "Schema");
    }

    #[test]
    fn test_name_comparison() {
        assert!(NameComparison::CaseSensitive.matches("Name", "Name"));
        assert!(!NameComparison::CaseSensitive.matches("Name", "name"));
        assert!(NameComparison::CaseInsensitive.matches("Name", "nAME"));
        assert_eq!(NameComparison::CaseInsensitive.normalize("ABC"), "abc");
    }
}
