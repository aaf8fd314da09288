//! Domain categorization
//!
//! Maps a visited domain to the set of categories it belongs to. The lookup
//! itself is a collaborator behind [`DomainCategorizer`]; this module
//! provides a static, configuration-driven categorizer and a caching layer
//! that remembers resolved domains in the store.

mod catalogue;

pub use catalogue::{all_categories, canonical_category};

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::CategorizationConfig;
use crate::store::{KeywordStore, StoreError};

/// Categorization failures. None of them are recovered internally.
#[derive(Debug, Error)]
pub enum CategorizeError {
    /// The service reported a category outside the known catalogue
    #[error("categorization schema changed: unknown category '{0}'")]
    SchemaChanged(String),

    #[error("categorization service unavailable: {0}")]
    Unavailable(String),

    #[error("category cache error: {0}")]
    Store(#[from] StoreError),
}

/// Domain -> categories lookup
pub trait DomainCategorizer: Send + Sync {
    /// Categories of `domain`; an uncategorized domain yields an empty set
    fn categories(&self, domain: &str) -> Result<BTreeSet<String>, CategorizeError>;
}

/// Resolve externally reported names against the catalogue
pub fn canonicalize<I, S>(names: I) -> Result<BTreeSet<String>, CategorizeError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|name| {
            canonical_category(name.as_ref())
                .map(str::to_string)
                .ok_or_else(|| CategorizeError::SchemaChanged(name.as_ref().to_string()))
        })
        .collect()
}

/// Categorizer over a fixed domain table
#[derive(Debug, Clone, Default)]
pub struct StaticCategorizer {
    domains: BTreeMap<String, Vec<String>>,
}

impl StaticCategorizer {
    pub fn new(domains: BTreeMap<String, Vec<String>>) -> Self {
        let domains = domains
            .into_iter()
            .map(|(domain, categories)| (domain.trim().to_lowercase(), categories))
            .collect();
        Self { domains }
    }

    pub fn from_config(config: &CategorizationConfig) -> Self {
        Self::new(config.domains.clone())
    }

    /// Exact host first, then the host without a leading `www.`
    fn lookup(&self, domain: &str) -> Option<&Vec<String>> {
        let domain = domain.trim().to_lowercase();
        self.domains.get(&domain).or_else(|| {
            domain
                .strip_prefix("www.")
                .and_then(|bare| self.domains.get(bare))
        })
    }
}

impl DomainCategorizer for StaticCategorizer {
    fn categories(&self, domain: &str) -> Result<BTreeSet<String>, CategorizeError> {
        match self.lookup(domain) {
            Some(names) => canonicalize(names),
            None => Ok(BTreeSet::new()),
        }
    }
}

/// Consults the store's domain cache before the wrapped categorizer
pub struct CachingCategorizer<C> {
    inner: C,
    store: Arc<dyn KeywordStore>,
}

impl<C: DomainCategorizer> CachingCategorizer<C> {
    pub fn new(inner: C, store: Arc<dyn KeywordStore>) -> Self {
        Self { inner, store }
    }
}

impl<C: DomainCategorizer> DomainCategorizer for CachingCategorizer<C> {
    fn categories(&self, domain: &str) -> Result<BTreeSet<String>, CategorizeError> {
        if let Some(cached) = self.store.cached_categories(domain)? {
            debug!("Category cache hit for {}", domain);
            return Ok(cached);
        }

        let categories = self.inner.categories(domain)?;
        self.store.cache_categories(domain, &categories)?;
        debug!("Categorized {} as {:?}", domain, categories);
        Ok(categories)
    }
}

/// Domains a user visited, grouped by their cached categories
pub fn domains_by_category(
    store: &dyn KeywordStore,
    user: &str,
) -> Result<BTreeMap<String, BTreeSet<String>>, StoreError> {
    let mut grouped: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let domains: BTreeSet<String> = store
        .page_visits(user)?
        .into_iter()
        .map(|visit| visit.domain)
        .collect();

    for domain in domains {
        for category in store.cached_categories(&domain)?.unwrap_or_default() {
            grouped.entry(category).or_default().insert(domain.clone());
        }
    }
    Ok(grouped)
}
