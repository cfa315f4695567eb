//! URL classification: overrides, then cache, then rules, then "Other".

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::cache::ClassificationCache;
use crate::domain::Domain;
use crate::rules::{CategoryRuleSet, RuleError};
use crate::types::Category;

/// User-supplied domain → category overrides, keyed by lowercase hostname.
pub type Overrides = BTreeMap<String, Category>;

/// Which layer decided a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassificationSource {
    /// The user override map.
    Override,
    /// A fresh cache entry.
    Cache,
    /// A category rule pattern.
    Rule,
    /// No rule matched.
    Default,
    /// The URL had no usable hostname.
    InvalidUrl,
}

impl ClassificationSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Cache => "cache",
            Self::Rule => "rule",
            Self::Default => "default",
            Self::InvalidUrl => "invalid-url",
        }
    }
}

/// A classification decision with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub domain: Option<Domain>,
    pub category: Category,
    pub source: ClassificationSource,
}

/// Resolves URLs to categories.
///
/// Safe to share across threads: the cache sits behind a mutex and the rule
/// set behind a read/write lock, so classifications only contend with
/// pattern additions.
#[derive(Debug, Default)]
pub struct Classifier {
    rules: RwLock<CategoryRuleSet>,
    cache: Mutex<ClassificationCache>,
}

impl Classifier {
    pub fn new(rules: CategoryRuleSet) -> Self {
        Self::with_cache(rules, ClassificationCache::new())
    }

    pub fn with_cache(rules: CategoryRuleSet, cache: ClassificationCache) -> Self {
        Self {
            rules: RwLock::new(rules),
            cache: Mutex::new(cache),
        }
    }

    /// Returns the category for `url`. Never fails.
    pub fn categorize(&self, url: &str, overrides: &Overrides) -> Category {
        self.classify(url, overrides).category
    }

    /// Like [`Classifier::categorize`], but reports which layer decided.
    pub fn classify(&self, url: &str, overrides: &Overrides) -> Classification {
        self.classify_at(url, overrides, Utc::now())
    }

    pub fn classify_at(
        &self,
        url: &str,
        overrides: &Overrides,
        now: DateTime<Utc>,
    ) -> Classification {
        let Some(domain) = Domain::from_url(url) else {
            return Classification {
                domain: None,
                category: Category::other(),
                source: ClassificationSource::InvalidUrl,
            };
        };

        if let Some(category) = overrides.get(domain.as_str()) {
            return Classification {
                category: category.clone(),
                domain: Some(domain),
                source: ClassificationSource::Override,
            };
        }

        let cached = self.cache().lookup_at(&domain, now).cloned();
        if let Some(category) = cached {
            return Classification {
                category,
                domain: Some(domain),
                source: ClassificationSource::Cache,
            };
        }

        // cache stays unlocked while the rules are matched
        let matched = self.rules().find_match(&domain).cloned();
        let (category, source) = match matched {
            Some(category) => (category, ClassificationSource::Rule),
            None => (Category::other(), ClassificationSource::Default),
        };
        tracing::debug!(domain = %domain, category = %category, source = source.as_str(), "classified domain");

        self.cache().insert_at(domain.clone(), category.clone(), now);
        Classification {
            domain: Some(domain),
            category,
            source,
        }
    }

    /// Appends a pattern to a category's rule list.
    pub fn add_pattern(&self, category: &str, pattern: &str) -> Result<(), RuleError> {
        self.rules_mut().add_pattern(category, pattern)?;
        tracing::debug!(category, pattern, "added category pattern");
        Ok(())
    }

    /// Category names from the rule set, in matching order.
    pub fn categories(&self) -> Vec<Category> {
        self.rules().categories()
    }

    /// Invalidates every cached classification.
    ///
    /// Call this whenever the override map changes.
    pub fn clear_cache(&self) {
        self.cache().clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache().len()
    }

    fn cache(&self) -> MutexGuard<'_, ClassificationCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn rules(&self) -> RwLockReadGuard<'_, CategoryRuleSet> {
        self.rules.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn rules_mut(&self) -> RwLockWriteGuard<'_, CategoryRuleSet> {
        self.rules.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;

    use crate::cache::CACHE_TTL;

    fn work_rules() -> CategoryRuleSet {
        CategoryRuleSet::from_json(
            r#"{"version": 1, "categories": {"Work": {"patterns": ["github\\.com$"]}}}"#,
        )
        .unwrap()
    }

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339)
            .unwrap()
            .with_timezone(&Utc)
    }

    fn overrides(pairs: &[(&str, &str)]) -> Overrides {
        pairs
            .iter()
            .map(|(domain, category)| ((*domain).to_string(), Category::new(*category).unwrap()))
            .collect()
    }

    #[test]
    fn rule_match_then_cache_hit() {
        let classifier = Classifier::new(work_rules());
        let now = at("2025-01-01T09:00:00Z");

        let first = classifier.classify_at("https://github.com/x", &Overrides::new(), now);
        assert_eq!(first.category.as_str(), "Work");
        assert_eq!(first.source, ClassificationSource::Rule);

        let second = classifier.classify_at(
            "https://github.com/x",
            &Overrides::new(),
            now + Duration::minutes(5),
        );
        assert_eq!(second.category.as_str(), "Work");
        assert_eq!(second.source, ClassificationSource::Cache);
    }

    #[test]
    fn override_beats_stale_cache_entry() {
        let classifier = Classifier::new(work_rules());
        let now = at("2025-01-01T09:00:00Z");
        classifier.classify_at("https://github.com/x", &Overrides::new(), now);

        let overrides = overrides(&[("github.com", "Personal")]);
        let result = classifier.classify_at("https://github.com/x", &overrides, now);
        assert_eq!(result.category.as_str(), "Personal");
        assert_eq!(result.source, ClassificationSource::Override);
    }

    #[test]
    fn override_results_are_not_cached() {
        let classifier = Classifier::new(work_rules());
        let overrides = overrides(&[("example.org", "Reading")]);
        classifier.categorize("https://example.org/", &overrides);
        assert_eq!(classifier.cache_len(), 0);
    }

    #[test]
    fn unmatched_domain_defaults_to_other_and_is_cached() {
        let classifier = Classifier::new(work_rules());
        let now = at("2025-01-01T09:00:00Z");

        let first = classifier.classify_at("https://unknown.example/", &Overrides::new(), now);
        assert!(first.category.is_other());
        assert_eq!(first.source, ClassificationSource::Default);

        let second = classifier.classify_at("https://unknown.example/", &Overrides::new(), now);
        assert!(second.category.is_other());
        assert_eq!(second.source, ClassificationSource::Cache);
    }

    #[test]
    fn invalid_url_is_other_without_touching_cache() {
        let classifier = Classifier::new(work_rules());
        let result = classifier.classify("::not a url::", &Overrides::new());
        assert!(result.category.is_other());
        assert_eq!(result.source, ClassificationSource::InvalidUrl);
        assert!(result.domain.is_none());
        assert_eq!(classifier.cache_len(), 0);
    }

    #[test]
    fn stale_cache_entry_is_recomputed() {
        let classifier = Classifier::new(work_rules());
        let now = at("2025-01-01T09:00:00Z");
        classifier.classify_at("https://github.com/", &Overrides::new(), now);

        let later = now + CACHE_TTL + Duration::seconds(1);
        let result = classifier.classify_at("https://github.com/", &Overrides::new(), later);
        assert_eq!(result.source, ClassificationSource::Rule);
    }

    #[test]
    fn cached_category_survives_until_cache_is_cleared() {
        let classifier = Classifier::new(work_rules());
        let now = at("2025-01-01T09:00:00Z");
        let first = classifier.classify_at("https://linear.app/", &Overrides::new(), now);
        assert!(first.category.is_other());

        classifier.add_pattern("Work", r"linear\.app$").unwrap();
        let cached = classifier.classify_at("https://linear.app/", &Overrides::new(), now);
        assert!(cached.category.is_other());

        classifier.clear_cache();
        let fresh = classifier.classify_at("https://linear.app/", &Overrides::new(), now);
        assert_eq!(fresh.category.as_str(), "Work");
    }

    #[test]
    fn rejected_pattern_keeps_existing_rules() {
        let classifier = Classifier::new(work_rules());
        assert!(classifier.add_pattern("Work", "(").is_err());
        assert_eq!(
            classifier.categorize("https://github.com/", &Overrides::new()).as_str(),
            "Work"
        );
    }

    #[test]
    fn results_come_from_configured_categories_or_other() {
        let classifier = Classifier::new(CategoryRuleSet::builtin().unwrap());
        let configured = classifier.categories();
        for url in [
            "https://www.youtube.com/watch?v=1",
            "https://github.com/rust-lang/rust",
            "https://en.wikipedia.org/wiki/Rust",
            "https://nowhere.example/",
            "http://localhost:8080/",
        ] {
            let category = classifier.categorize(url, &Overrides::new());
            assert!(!category.as_str().is_empty());
            assert!(
                category.is_other() || configured.contains(&category),
                "{url} classified as unconfigured {category}"
            );
        }
    }

    #[test]
    fn cache_hits_do_not_wait_for_rule_matching() {
        let classifier = Classifier::new(work_rules());
        classifier.categorize("https://github.com/", &Overrides::new());

        let (sender, receiver) = std::sync::mpsc::channel();
        std::thread::scope(|scope| {
            let rules = classifier.rules_mut();
            // blocks on the rule set until the write guard is released
            scope.spawn(|| classifier.categorize("https://unknown.example/", &Overrides::new()));
            std::thread::sleep(std::time::Duration::from_millis(50));
            scope.spawn(|| {
                let result = classifier.classify("https://github.com/", &Overrides::new());
                sender.send(result.source).unwrap();
            });

            let received = receiver.recv_timeout(std::time::Duration::from_secs(5));
            drop(rules);
            assert_eq!(received, Ok(ClassificationSource::Cache));
        });
        assert_eq!(classifier.cache_len(), 2);
    }

    #[test]
    fn classifier_is_shareable_across_threads() {
        let classifier = std::sync::Arc::new(Classifier::new(work_rules()));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let classifier = std::sync::Arc::clone(&classifier);
                std::thread::spawn(move || {
                    if i == 0 {
                        classifier.add_pattern("Work", r"gitlab\.com$").unwrap();
                    }
                    classifier
                        .categorize("https://github.com/", &Overrides::new())
                        .to_string()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), "Work");
        }
    }
}
