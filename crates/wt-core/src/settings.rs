//! User settings persisted alongside activity data.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::classifier::Overrides;
use crate::retention::DEFAULT_RETENTION_DAYS;
use crate::types::{Category, ValidationError};

/// Categories that ship with the tracker and cannot be removed.
pub const BUILTIN_CATEGORIES: &[&str] = &[
    "Work",
    "Social",
    "Entertainment",
    "Shopping",
    "News",
    "Education",
    "Other",
];

/// Categories configured on first run.
const INITIAL_CATEGORIES: &[&str] = &["Work", "Social", "Entertainment", "Shopping", "Other"];

static CATEGORY_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9\s\-_.#@&!]{1,24}$").unwrap());

static OVERRIDE_DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9\-_.]+\.[a-zA-Z]{2,}$").unwrap());

/// A user-added rule pattern, re-applied to the rule set at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomPattern {
    pub category: Category,
    pub pattern: String,
}

/// Settings owned by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Category names shown to the user, in display order.
    pub categories: Vec<Category>,
    /// Domain → category overrides.
    #[serde(rename = "customCategories")]
    pub overrides: Overrides,
    pub retention_days: u32,
    #[serde(default)]
    pub custom_patterns: Vec<CustomPattern>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            categories: INITIAL_CATEGORIES
                .iter()
                .filter_map(|name| Category::new(*name).ok())
                .collect(),
            overrides: Overrides::new(),
            retention_days: DEFAULT_RETENTION_DAYS,
            custom_patterns: Vec::new(),
        }
    }
}

impl Settings {
    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|category| category.as_str() == name)
    }

    /// Adds a user category after validating its name.
    pub fn add_category(&mut self, name: &str) -> Result<Category, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty { field: "category" });
        }
        if !CATEGORY_NAME_RE.is_match(name) {
            return Err(ValidationError::InvalidCategoryName {
                name: name.to_string(),
            });
        }
        if self.has_category(name) {
            return Err(ValidationError::DuplicateCategory {
                name: name.to_string(),
            });
        }
        let category = Category::new(name)?;
        self.categories.push(category.clone());
        Ok(category)
    }

    /// Removes a user category. Built-in categories are protected.
    ///
    /// A category that overrides or custom patterns still map to cannot be
    /// removed until those are gone.
    pub fn remove_category(&mut self, name: &str) -> Result<(), ValidationError> {
        if BUILTIN_CATEGORIES.contains(&name) {
            return Err(ValidationError::ProtectedCategory {
                name: name.to_string(),
            });
        }
        let overrides = self
            .overrides
            .values()
            .filter(|category| category.as_str() == name)
            .count();
        let patterns = self
            .custom_patterns
            .iter()
            .filter(|custom| custom.category.as_str() == name)
            .count();
        if overrides > 0 || patterns > 0 {
            return Err(ValidationError::CategoryInUse {
                name: name.to_string(),
                overrides,
                patterns,
            });
        }
        let before = self.categories.len();
        self.categories.retain(|category| category.as_str() != name);
        if self.categories.len() == before {
            return Err(ValidationError::UnknownCategory {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Maps `domain` to a configured category, replacing any previous override.
    ///
    /// Returns the normalized (lowercase) domain key.
    pub fn set_override(&mut self, domain: &str, category: &str) -> Result<String, ValidationError> {
        let domain = normalize_override_domain(domain)?;
        if category.trim().is_empty() {
            return Err(ValidationError::Empty { field: "category" });
        }
        if !self.has_category(category) {
            return Err(ValidationError::UnknownCategory {
                name: category.to_string(),
            });
        }
        self.overrides
            .insert(domain.clone(), Category::new(category)?);
        Ok(domain)
    }

    /// Removes an override, returning whether one existed.
    pub fn remove_override(&mut self, domain: &str) -> bool {
        let key = domain.trim().to_ascii_lowercase();
        self.overrides.remove(&key).is_some()
    }

    pub fn set_retention_days(&mut self, days: u32) -> Result<(), ValidationError> {
        if days == 0 {
            return Err(ValidationError::RetentionOutOfRange { days });
        }
        self.retention_days = days;
        Ok(())
    }
}

/// Validates an override domain and returns its lowercase form.
pub fn normalize_override_domain(domain: &str) -> Result<String, ValidationError> {
    let domain = domain.trim();
    if domain.is_empty() {
        return Err(ValidationError::Empty { field: "domain" });
    }
    if !OVERRIDE_DOMAIN_RE.is_match(domain) {
        return Err(ValidationError::InvalidDomain {
            domain: domain.to_string(),
        });
    }
    Ok(domain.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(settings: &Settings) -> Vec<&str> {
        settings.categories.iter().map(Category::as_str).collect()
    }

    #[test]
    fn defaults_match_first_run_settings() {
        let settings = Settings::default();
        assert_eq!(
            names(&settings),
            vec!["Work", "Social", "Entertainment", "Shopping", "Other"]
        );
        assert!(settings.overrides.is_empty());
        assert_eq!(settings.retention_days, 30);
    }

    #[test]
    fn add_category_validates_name() {
        let mut settings = Settings::default();
        assert!(settings.add_category("Side Projects").is_ok());
        assert_eq!(
            settings.add_category("Side Projects"),
            Err(ValidationError::DuplicateCategory {
                name: "Side Projects".to_string()
            })
        );
        assert!(matches!(
            settings.add_category("-leading-dash"),
            Err(ValidationError::InvalidCategoryName { .. })
        ));
        assert!(matches!(
            settings.add_category("x"),
            Err(ValidationError::InvalidCategoryName { .. })
        ));
        assert!(matches!(
            settings.add_category("a name that is far too long to accept"),
            Err(ValidationError::InvalidCategoryName { .. })
        ));
        assert!(matches!(
            settings.add_category("  "),
            Err(ValidationError::Empty { .. })
        ));
    }

    #[test]
    fn builtin_categories_cannot_be_removed() {
        let mut settings = Settings::default();
        assert!(matches!(
            settings.remove_category("Work"),
            Err(ValidationError::ProtectedCategory { .. })
        ));
        settings.add_category("Reading").unwrap();
        settings.remove_category("Reading").unwrap();
        assert!(!settings.has_category("Reading"));
        assert!(matches!(
            settings.remove_category("Reading"),
            Err(ValidationError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn referenced_category_cannot_be_removed() {
        let mut settings = Settings::default();
        settings.add_category("Reading").unwrap();
        settings.set_override("lwn.net", "Reading").unwrap();
        settings.custom_patterns.push(CustomPattern {
            category: Category::new("Reading").unwrap(),
            pattern: r"arxiv\.org$".to_string(),
        });

        assert_eq!(
            settings.remove_category("Reading"),
            Err(ValidationError::CategoryInUse {
                name: "Reading".to_string(),
                overrides: 1,
                patterns: 1,
            })
        );
        assert!(settings.has_category("Reading"));

        settings.remove_override("lwn.net");
        settings.custom_patterns.clear();
        settings.remove_category("Reading").unwrap();
        assert!(!settings.has_category("Reading"));
    }

    #[test]
    fn override_domain_is_validated_and_lowercased() {
        let mut settings = Settings::default();
        let key = settings.set_override("GitHub.com", "Social").unwrap();
        assert_eq!(key, "github.com");
        assert_eq!(settings.overrides["github.com"].as_str(), "Social");

        assert!(matches!(
            settings.set_override("https://github.com", "Work"),
            Err(ValidationError::InvalidDomain { .. })
        ));
        assert!(matches!(
            settings.set_override("localhost", "Work"),
            Err(ValidationError::InvalidDomain { .. })
        ));
        assert!(matches!(
            settings.set_override("example.com", "Nope"),
            Err(ValidationError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn remove_override_reports_presence() {
        let mut settings = Settings::default();
        settings.set_override("news.ycombinator.com", "Work").unwrap();
        assert!(settings.remove_override("News.YCombinator.com"));
        assert!(!settings.remove_override("news.ycombinator.com"));
    }

    #[test]
    fn retention_must_keep_a_day() {
        let mut settings = Settings::default();
        assert_eq!(
            settings.set_retention_days(0),
            Err(ValidationError::RetentionOutOfRange { days: 0 })
        );
        settings.set_retention_days(7).unwrap();
        assert_eq!(settings.retention_days, 7);
    }

    #[test]
    fn settings_use_extension_field_names() {
        let mut settings = Settings::default();
        settings.set_override("github.com", "Work").unwrap();
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["customCategories"]["github.com"], "Work");
        assert_eq!(json["retentionDays"], 30);

        let legacy = r#"{"categories":["Work","Other"],"customCategories":{},"retentionDays":14}"#;
        let parsed: Settings = serde_json::from_str(legacy).unwrap();
        assert_eq!(parsed.retention_days, 14);
        assert!(parsed.custom_patterns.is_empty());
    }
}
