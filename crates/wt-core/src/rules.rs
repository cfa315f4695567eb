//! Category rules: ordered, compiled domain patterns per category.
//!
//! Rules come from a versioned JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "categories": {
//!     "Work": { "patterns": ["github\\.com$", "gitlab\\.com$"] },
//!     "Social": { "patterns": ["twitter\\.com$"] }
//!   }
//! }
//! ```
//!
//! Category order is the order in the document. Matching is first match
//! wins in that order, so a domain matched by both "Work" and "Social" above
//! is always "Work".

use std::fmt;

use regex::Regex;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use thiserror::Error;

use crate::domain::Domain;
use crate::types::Category;

/// Highest rule document version this build understands.
pub const RULES_VERSION: u32 = 1;

/// Rules shipped with the tracker.
const DEFAULT_RULES: &str = include_str!("../data/default_categories.json");

/// Errors raised while building or extending a rule set.
#[derive(Debug, Error)]
pub enum RuleError {
    /// A pattern failed to compile.
    #[error("invalid pattern {pattern:?} for category {category}")]
    InvalidPattern {
        category: String,
        pattern: String,
        #[source]
        source: Box<regex::Error>,
    },
    /// The category name was empty.
    #[error("category name cannot be empty")]
    EmptyCategory,
    /// The rule document could not be parsed.
    #[error("invalid rule document")]
    Parse(#[from] serde_json::Error),
    /// The rule document uses a newer format.
    #[error("unsupported rule document version {found} (expected at most {RULES_VERSION})")]
    UnsupportedVersion { found: u32 },
}

/// The raw, uncompiled rule document.
#[derive(Debug, Clone, Deserialize)]
pub struct RuleDocument {
    pub version: u32,
    #[serde(deserialize_with = "ordered_categories")]
    pub categories: Vec<(String, CategoryPatterns)>,
}

/// Pattern strings for one category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryPatterns {
    pub patterns: Vec<String>,
}

/// Deserializes a JSON object into a list that keeps document order.
fn ordered_categories<'de, D>(deserializer: D) -> Result<Vec<(String, CategoryPatterns)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<(String, CategoryPatterns)>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of category name to patterns")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries: Vec<(String, CategoryPatterns)> = Vec::new();
            while let Some((name, patterns)) = map.next_entry::<String, CategoryPatterns>()? {
                if entries.iter().any(|(existing, _)| *existing == name) {
                    return Err(de::Error::custom(format!("duplicate category: {name}")));
                }
                entries.push((name, patterns));
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedVisitor)
}

/// A category and its compiled patterns.
#[derive(Debug, Clone)]
pub struct CategoryRule {
    category: Category,
    patterns: Vec<Regex>,
}

impl CategoryRule {
    pub const fn category(&self) -> &Category {
        &self.category
    }

    /// Returns the source strings of the compiled patterns.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(Regex::as_str)
    }

    fn matches(&self, domain: &str) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(domain))
    }
}

/// All category rules in insertion order.
#[derive(Debug, Clone, Default)]
pub struct CategoryRuleSet {
    rules: Vec<CategoryRule>,
}

impl CategoryRuleSet {
    /// Builds the built-in rule set.
    pub fn builtin() -> Result<Self, RuleError> {
        Self::from_json(DEFAULT_RULES)
    }

    /// Parses and compiles a JSON rule document.
    pub fn from_json(json: &str) -> Result<Self, RuleError> {
        let document: RuleDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    /// Compiles every pattern of the document, failing on the first bad one.
    pub fn from_document(document: RuleDocument) -> Result<Self, RuleError> {
        if document.version > RULES_VERSION {
            return Err(RuleError::UnsupportedVersion {
                found: document.version,
            });
        }
        let mut rules = Vec::with_capacity(document.categories.len());
        for (name, CategoryPatterns { patterns }) in document.categories {
            let category = Category::new(name).map_err(|_| RuleError::EmptyCategory)?;
            let patterns = patterns
                .iter()
                .map(|pattern| compile(&category, pattern))
                .collect::<Result<Vec<_>, _>>()?;
            rules.push(CategoryRule { category, patterns });
        }
        tracing::debug!(categories = rules.len(), "loaded category rules");
        Ok(Self { rules })
    }

    /// Appends a pattern to a category.
    ///
    /// Unknown categories are created at the end of the order. A pattern that
    /// fails to compile leaves the rule set untouched.
    pub fn add_pattern(&mut self, category: &str, pattern: &str) -> Result<(), RuleError> {
        let category = Category::new(category).map_err(|_| RuleError::EmptyCategory)?;
        let compiled = compile(&category, pattern)?;
        match self.rules.iter_mut().find(|rule| rule.category == category) {
            Some(rule) => rule.patterns.push(compiled),
            None => self.rules.push(CategoryRule {
                category,
                patterns: vec![compiled],
            }),
        }
        Ok(())
    }

    /// Returns the first category, in insertion order, with a matching pattern.
    pub fn find_match(&self, domain: &Domain) -> Option<&Category> {
        self.rules
            .iter()
            .find(|rule| rule.matches(domain.as_str()))
            .map(CategoryRule::category)
    }

    /// Category names in insertion order.
    pub fn categories(&self) -> Vec<Category> {
        self.rules.iter().map(|rule| rule.category.clone()).collect()
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn get(&self, category: &str) -> Option<&CategoryRule> {
        self.rules
            .iter()
            .find(|rule| rule.category.as_str() == category)
    }
}

/// Compiles a single pattern, tagging failures with the category.
pub fn compile(category: &Category, pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
        category: category.to_string(),
        pattern: pattern.to_string(),
        source: Box::new(source),
    })
}
