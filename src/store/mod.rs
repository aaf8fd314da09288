//! Document store
//!
//! The pipeline reads and writes page visit records, user keyword profiles,
//! searches, plain visits, category counters and the domain-category cache
//! through the [`KeywordStore`] trait. Two backends:
//! - [`SledStore`]: sled trees with bincode values, persistent
//! - [`MemoryStore`]: lock-protected maps, for tests and dry runs

mod disk;
mod memory;

pub use disk::SledStore;
pub use memory::MemoryStore;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::config::{StorageBackend, StorageConfig};
use crate::types::{
    CategoryVisits, PageVisit, PageVisitRecord, RecordId, SearchRecord, UserKeywordProfile,
};

/// Store failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] sled::Error),

    #[error("failed to encode or decode stored value: {0}")]
    Codec(#[from] bincode::Error),

    #[error("page record {0} not found")]
    RecordNotFound(RecordId),

    #[error("page record {0} already exists")]
    DuplicateRecord(RecordId),

    /// The store refused the operation for a reason outside the data
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Selection of page visit records
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFilter {
    pub user: Option<String>,
    pub processed: Option<bool>,
}

impl PageFilter {
    /// Every record
    pub fn all() -> Self {
        Self::default()
    }

    /// Records not yet folded into a profile
    pub fn unprocessed() -> Self {
        Self {
            user: None,
            processed: Some(false),
        }
    }

    /// Restrict to one user
    pub fn for_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn matches(&self, record: &PageVisitRecord) -> bool {
        self.user.as_ref().map_or(true, |u| *u == record.user)
            && self.processed.map_or(true, |p| p == record.processed)
    }
}

/// Collection sizes, for the `stats` command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreStats {
    pub pages: usize,
    pub unprocessed_pages: usize,
    pub profiles: usize,
    pub searches: usize,
    pub visits: usize,
    pub cached_domains: usize,
}

/// Storage abstraction consumed by the pipeline.
///
/// Listings come back in a stable order: pages by (timestamp, id), searches
/// and visits by date.
pub trait KeywordStore: Send + Sync {
    /// Store a new page visit record
    fn insert_page(&self, record: &PageVisitRecord) -> Result<(), StoreError>;

    /// Page visit records matching `filter`
    fn find_pages(&self, filter: &PageFilter) -> Result<Vec<PageVisitRecord>, StoreError>;

    /// Insert or overwrite a page visit record
    fn save_page(&self, record: &PageVisitRecord) -> Result<(), StoreError>;

    /// Profile of `user`, or an empty profile if none is stored
    fn load_profile(&self, user: &str) -> Result<UserKeywordProfile, StoreError>;

    fn save_profile(&self, profile: &UserKeywordProfile) -> Result<(), StoreError>;

    /// Save `profile` and mark record `id` processed as one atomic write.
    ///
    /// Fails with [`StoreError::RecordNotFound`] without writing anything if
    /// the record does not exist.
    fn commit_merge(&self, profile: &UserKeywordProfile, id: RecordId) -> Result<(), StoreError>;

    fn insert_search(&self, search: &SearchRecord) -> Result<(), StoreError>;

    /// Searches of `user` dated at or after `since`
    fn find_searches(
        &self,
        user: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchRecord>, StoreError>;

    fn insert_visit(&self, visit: &PageVisit) -> Result<(), StoreError>;

    fn page_visits(&self, user: &str) -> Result<Vec<PageVisit>, StoreError>;

    /// Increment the visit counter of every category in `categories` for
    /// `user`, returning the updated counters
    fn add_category_visits(
        &self,
        user: &str,
        categories: &BTreeSet<String>,
    ) -> Result<CategoryVisits, StoreError>;

    fn category_visits(&self, user: &str) -> Result<CategoryVisits, StoreError>;

    /// Previously resolved categories of `domain`
    fn cached_categories(&self, domain: &str) -> Result<Option<BTreeSet<String>>, StoreError>;

    fn cache_categories(&self, domain: &str, categories: &BTreeSet<String>)
        -> Result<(), StoreError>;

    fn stats(&self) -> Result<StoreStats, StoreError>;

    /// Persist buffered writes
    fn flush(&self) -> Result<(), StoreError>;
}

/// Open the backend selected in the configuration
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeywordStore>, StoreError> {
    match config.backend {
        StorageBackend::Sled => {
            info!("Opening sled store at {:?}", config.data_dir);
            Ok(Arc::new(SledStore::open(&config.data_dir)?))
        }
        StorageBackend::Memory => {
            info!("Using in-memory store; nothing will be persisted");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

/// Sort pages by (timestamp, id)
pub(crate) fn sort_pages(pages: &mut [PageVisitRecord]) {
    pages.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::types::{FrequencyTable, KeywordFreqs, Language};
    use chrono::TimeZone;

    pub fn page(user: &str, text: &[(&str, u64)], metadata: &[(&str, u64)]) -> PageVisitRecord {
        PageVisitRecord {
            id: RecordId::new(),
            page_url: "http://www.elpais.es/".to_string(),
            user: user.to_string(),
            timestamp: Utc::now(),
            raw_html: String::new(),
            clean_text: String::new(),
            language: Language::Spanish,
            metadata: Default::default(),
            keyword_freqs: KeywordFreqs {
                text: text.iter().copied().collect::<FrequencyTable>(),
                metadata: metadata.iter().copied().collect::<FrequencyTable>(),
            },
            processed: false,
        }
    }

    pub fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()
    }

    /// Behaviour every backend must share
    pub fn exercise_store(store: &dyn KeywordStore) {
        // Pages
        let mut first = page("alfredo", &[("limpito", 1)], &[]);
        first.timestamp = day(2);
        let mut second = page("alfredo", &[("lol", 1)], &[]);
        second.timestamp = day(1);
        let other = page("maria", &[("playa", 3)], &[]);

        store.insert_page(&first).unwrap();
        store.insert_page(&second).unwrap();
        store.insert_page(&other).unwrap();
        assert!(matches!(
            store.insert_page(&first),
            Err(StoreError::DuplicateRecord(id)) if id == first.id
        ));

        let alfredo = store.find_pages(&PageFilter::all().for_user("alfredo")).unwrap();
        assert_eq!(
            alfredo.iter().map(|p| p.id).collect::<Vec<_>>(),
            vec![second.id, first.id]
        );
        assert_eq!(store.find_pages(&PageFilter::unprocessed()).unwrap().len(), 3);

        // Profiles
        let mut profile = store.load_profile("alfredo").unwrap();
        assert_eq!(profile, UserKeywordProfile::empty("alfredo"));
        assert!(profile.merge_record(&first));
        store.commit_merge(&profile, first.id).unwrap();

        assert_eq!(store.load_profile("alfredo").unwrap(), profile);
        let unprocessed = store.find_pages(&PageFilter::unprocessed()).unwrap();
        assert_eq!(unprocessed.len(), 2);
        assert!(unprocessed.iter().all(|p| p.id != first.id));

        // Committing against a missing record writes nothing
        let mut ghost_profile = store.load_profile("maria").unwrap();
        let ghost = page("maria", &[("fantasma", 1)], &[]);
        ghost_profile.merge_record(&ghost);
        assert!(matches!(
            store.commit_merge(&ghost_profile, ghost.id),
            Err(StoreError::RecordNotFound(_))
        ));
        assert_eq!(
            store.load_profile("maria").unwrap(),
            UserKeywordProfile::empty("maria")
        );

        // Searches
        store.insert_search(&SearchRecord::new("alfredo", "comprar bici", day(1))).unwrap();
        store.insert_search(&SearchRecord::new("alfredo", "hotel roma", day(5))).unwrap();
        store.insert_search(&SearchRecord::new("maria", "vuelo paris", day(5))).unwrap();
        let searches = store.find_searches("alfredo", None).unwrap();
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0].search_query, "comprar bici");
        let recent = store.find_searches("alfredo", Some(day(3))).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].search_query, "hotel roma");

        // Visits and categories
        store
            .insert_visit(&PageVisit {
                id: RecordId::new(),
                user: "alfredo".to_string(),
                page_url: "http://www.elpais.es/".to_string(),
                domain: "www.elpais.es".to_string(),
                date: day(1),
            })
            .unwrap();
        assert_eq!(store.page_visits("alfredo").unwrap().len(), 1);
        assert!(store.page_visits("maria").unwrap().is_empty());

        let news: BTreeSet<String> = ["News/Media".to_string()].into();
        let both: BTreeSet<String> = ["News/Media".to_string(), "Sports".to_string()].into();
        store.add_category_visits("alfredo", &news).unwrap();
        let counts = store.add_category_visits("alfredo", &both).unwrap();
        assert_eq!(counts.get("News/Media"), Some(&2));
        assert_eq!(counts.get("Sports"), Some(&1));
        assert_eq!(store.category_visits("alfredo").unwrap(), counts);
        assert!(store.category_visits("maria").unwrap().is_empty());

        assert_eq!(store.cached_categories("www.elpais.es").unwrap(), None);
        store.cache_categories("www.elpais.es", &news).unwrap();
        assert_eq!(store.cached_categories("www.elpais.es").unwrap(), Some(news));

        let stats = store.stats().unwrap();
        assert_eq!(stats.pages, 3);
        assert_eq!(stats.unprocessed_pages, 2);
        assert_eq!(stats.profiles, 1);
        assert_eq!(stats.searches, 3);
        assert_eq!(stats.visits, 1);
        assert_eq!(stats.cached_domains, 1);

        store.flush().unwrap();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_page_filter() {
        let record = test_support::page("alfredo", &[], &[]);
        assert!(PageFilter::all().matches(&record));
        assert!(PageFilter::unprocessed().matches(&record));
        assert!(PageFilter::unprocessed().for_user("alfredo").matches(&record));
        assert!(!PageFilter::all().for_user("maria").matches(&record));

        let mut processed = record.clone();
        processed.processed = true;
        assert!(!PageFilter::unprocessed().matches(&processed));
    }

    #[test]
    fn test_open_store_backends() {
        let temp_dir = TempDir::new().unwrap();
        let sled_config = StorageConfig {
            backend: StorageBackend::Sled,
            data_dir: temp_dir.path().to_path_buf(),
        };
        let store = open_store(&sled_config).unwrap();
        assert_eq!(store.stats().unwrap(), StoreStats::default());

        let memory_config = StorageConfig {
            backend: StorageBackend::Memory,
            ..Default::default()
        };
        let store = open_store(&memory_config).unwrap();
        assert_eq!(store.stats().unwrap(), StoreStats::default());
    }
}
