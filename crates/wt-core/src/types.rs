//! Core type definitions with validation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the category every unmatched domain falls into.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Validation errors for core types and user settings.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The provided value was empty.
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },

    /// A category name does not follow the naming rules.
    #[error(
        "invalid category name {name:?}: must start with a letter or number and be 2-25 characters long"
    )]
    InvalidCategoryName { name: String },

    /// The category is already configured.
    #[error("category already exists: {name}")]
    DuplicateCategory { name: String },

    /// The category ships with the tracker and cannot be removed.
    #[error("cannot remove built-in category: {name}")]
    ProtectedCategory { name: String },

    /// Overrides or custom patterns still point at the category.
    #[error("category {name} is still used by {overrides} override(s) and {patterns} pattern(s)")]
    CategoryInUse {
        name: String,
        overrides: usize,
        patterns: usize,
    },

    /// The category is not configured.
    #[error("unknown category: {name}")]
    UnknownCategory { name: String },

    /// An override domain is not a plain hostname.
    #[error("invalid domain format: {domain}")]
    InvalidDomain { domain: String },

    /// The retention window must keep at least one day.
    #[error("retention must be at least 1 day, got {days}")]
    RetentionOutOfRange { days: u32 },
}

/// Generates a validated, non-empty string newtype with common trait implementations.
macro_rules! define_label {
    (
        $(#[$meta:meta])*
        $name:ident, $field_name:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Creates a new value after validation.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(ValidationError::Empty { field: $field_name });
                }
                Ok(Self(value))
            }

            /// Returns the value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_label!(
    /// A category label such as "Work" or "Social".
    ///
    /// Categories only need to be non-empty here. The stricter naming rules
    /// for user-created categories live in the settings module.
    Category, "category"
);

define_label!(
    /// A validated browser tab identifier.
    TabId, "tab ID"
);

impl Category {
    /// The fallback category for domains nothing else matched.
    #[must_use]
    pub fn other() -> Self {
        Self(DEFAULT_CATEGORY.to_string())
    }

    /// Whether this is the fallback category.
    #[must_use]
    pub fn is_other(&self) -> bool {
        self.0 == DEFAULT_CATEGORY
    }
}

impl From<u32> for TabId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}
