//! Keyword aggregation
//!
//! Folds every not-yet-aggregated page visit record into its user's
//! cumulative keyword profile. The profile update and the record's
//! `processed` flag are committed together, and the profile remembers which
//! records it already holds, so a pass can be interrupted or replayed at any
//! point without counting a record twice.

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::store::{KeywordStore, PageFilter, StoreError};
use crate::types::PageVisitRecord;

/// Outcome of one aggregation pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregationReport {
    /// Unprocessed records found at the start of the pass
    pub scanned: usize,
    /// Records added to a profile
    pub merged: usize,
    /// Records already held by their profile; only the flag was set
    pub duplicates: usize,
    /// Records left unprocessed after an error
    pub failed: usize,
    /// Distinct users whose profile changed
    pub users_touched: usize,
    pub elapsed: Duration,
}

impl fmt::Display for AggregationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scanned, {} merged, {} duplicates, {} failed, {} users in {:.2?}",
            self.scanned, self.merged, self.duplicates, self.failed, self.users_touched, self.elapsed
        )
    }
}

/// What happened to a single record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged,
    AlreadyMerged,
}

/// Batch job merging page keyword tables into user profiles
pub struct KeywordAggregator {
    store: Arc<dyn KeywordStore>,
}

impl KeywordAggregator {
    pub fn new(store: Arc<dyn KeywordStore>) -> Self {
        Self { store }
    }

    /// Merge every unprocessed record.
    ///
    /// Only failing to list the records aborts the pass; a record that fails
    /// to commit stays unprocessed and is retried by the next pass.
    pub fn run_aggregation_pass(&self) -> Result<AggregationReport, StoreError> {
        let start = Instant::now();
        let records = self.store.find_pages(&PageFilter::unprocessed())?;

        let mut report = AggregationReport {
            scanned: records.len(),
            ..Default::default()
        };
        let mut users = BTreeSet::new();

        for record in &records {
            match self.merge_one(record) {
                Ok(MergeOutcome::Merged) => {
                    report.merged += 1;
                    users.insert(record.user.as_str());
                }
                Ok(MergeOutcome::AlreadyMerged) => report.duplicates += 1,
                Err(e) => {
                    warn!("Failed to aggregate record {} of {}: {}", record.id, record.user, e);
                    report.failed += 1;
                }
            }
        }

        report.users_touched = users.len();
        report.elapsed = start.elapsed();

        if report.scanned > 0 {
            info!("Aggregation pass: {}", report);
        } else {
            debug!("Aggregation pass: nothing to do");
        }
        Ok(report)
    }

    /// Merge a single record into its user's profile and mark it processed
    pub fn merge_one(&self, record: &PageVisitRecord) -> Result<MergeOutcome, StoreError> {
        let mut profile = self.store.load_profile(&record.user)?;
        let outcome = if profile.merge_record(record) {
            MergeOutcome::Merged
        } else {
            MergeOutcome::AlreadyMerged
        };

        self.store.commit_merge(&profile, record.id)?;
        debug!("Record {} for {}: {:?}", record.id, record.user, outcome);
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::PageExtractor;
    use crate::store::test_support::page;
    use crate::store::{MemoryStore, StoreStats};
    use crate::types::{
        CategoryVisits, FrequencyTable, KeywordKind, PageVisit, RecordId, SearchRecord,
        UserKeywordProfile,
    };
    use chrono::{DateTime, Utc};
    use parking_lot::Mutex;
    use std::collections::HashSet;

    fn table(entries: &[(&str, u64)]) -> FrequencyTable {
        entries.iter().copied().collect()
    }

    #[test]
    fn test_end_to_end_cumulative_profile() {
        let store = Arc::new(MemoryStore::new());
        let extractor = PageExtractor::default();
        let aggregator = KeywordAggregator::new(store.clone());

        let first = extractor.build_record(
            "alfredo",
            "http://example.com/1",
            "<a>limpito</a><div>lol</div><p>lolazo lolazo</p>",
            Utc::now(),
        );
        store.insert_page(&first).unwrap();
        aggregator.run_aggregation_pass().unwrap();

        let profile = store.load_profile("alfredo").unwrap();
        assert_eq!(
            profile.site_keywords_freq,
            table(&[("limpito", 1), ("lol", 1), ("lolazo", 2)])
        );

        let second = extractor.build_record(
            "alfredo",
            "http://example.com/2",
            "<p>limpito limpito</p><p>lol lolazo lolazo</p>",
            Utc::now(),
        );
        store.insert_page(&second).unwrap();
        let report = aggregator.run_aggregation_pass().unwrap();
        assert_eq!(report.merged, 1);

        let profile = store.load_profile("alfredo").unwrap();
        assert_eq!(
            profile.site_keywords_freq,
            table(&[("limpito", 3), ("lol", 2), ("lolazo", 4)])
        );
        assert!(profile.metadata_keywords_freq.is_empty());
    }

    #[test]
    fn test_tables_kept_separate_per_user() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_page(&page("alfredo", &[("playa", 2)], &[("viajes", 1)]))
            .unwrap();
        store.insert_page(&page("maria", &[("futbol", 5)], &[])).unwrap();

        let report = KeywordAggregator::new(store.clone())
            .run_aggregation_pass()
            .unwrap();
        assert_eq!(report.scanned, 2);
        assert_eq!(report.merged, 2);
        assert_eq!(report.users_touched, 2);
        assert_eq!(report.failed, 0);

        let alfredo = store.load_profile("alfredo").unwrap();
        assert_eq!(alfredo.table(KeywordKind::Site), &table(&[("playa", 2)]));
        assert_eq!(alfredo.table(KeywordKind::Metadata), &table(&[("viajes", 1)]));
        assert_eq!(
            store.load_profile("maria").unwrap().site_keywords_freq,
            table(&[("futbol", 5)])
        );
    }

    #[test]
    fn test_merge_order_does_not_matter() {
        let r1 = page("alfredo", &[("lol", 1), ("limpito", 2)], &[("a1", 1)]);
        let r2 = page("alfredo", &[("lol", 4), ("lolazo", 1)], &[("a1", 2)]);

        let forward = Arc::new(MemoryStore::new());
        let agg = KeywordAggregator::new(forward.clone());
        for r in [&r1, &r2] {
            forward.insert_page(r).unwrap();
            agg.merge_one(r).unwrap();
        }

        let backward = Arc::new(MemoryStore::new());
        let agg = KeywordAggregator::new(backward.clone());
        for r in [&r2, &r1] {
            backward.insert_page(r).unwrap();
            agg.merge_one(r).unwrap();
        }

        assert_eq!(
            forward.load_profile("alfredo").unwrap(),
            backward.load_profile("alfredo").unwrap()
        );
    }

    #[test]
    fn test_rerun_is_noop() {
        let store = Arc::new(MemoryStore::new());
        store.insert_page(&page("alfredo", &[("lol", 1)], &[])).unwrap();
        let aggregator = KeywordAggregator::new(store.clone());

        aggregator.run_aggregation_pass().unwrap();
        let before = store.load_profile("alfredo").unwrap();

        let report = aggregator.run_aggregation_pass().unwrap();
        assert_eq!(report.scanned, 0);
        assert_eq!(report.merged, 0);
        assert_eq!(store.load_profile("alfredo").unwrap(), before);
    }

    #[test]
    fn test_replayed_commit_does_not_double_count() {
        let store = Arc::new(MemoryStore::new());
        let record = page("alfredo", &[("lol", 3)], &[]);
        store.insert_page(&record).unwrap();

        // Profile written but the processed flag lost, as after a crash
        let mut profile = UserKeywordProfile::empty("alfredo");
        profile.merge_record(&record);
        store.save_profile(&profile).unwrap();

        let report = KeywordAggregator::new(store.clone())
            .run_aggregation_pass()
            .unwrap();
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.merged, 0);
        assert_eq!(store.load_profile("alfredo").unwrap().site_keywords_freq.get("lol"), 3);
        assert!(store.find_pages(&PageFilter::unprocessed()).unwrap().is_empty());
    }

    /// Memory store whose commits fail for selected records
    struct FlakyStore {
        inner: MemoryStore,
        failing: Mutex<HashSet<RecordId>>,
    }

    impl KeywordStore for FlakyStore {
        fn insert_page(&self, record: &PageVisitRecord) -> Result<(), StoreError> {
            self.inner.insert_page(record)
        }
        fn find_pages(&self, filter: &PageFilter) -> Result<Vec<PageVisitRecord>, StoreError> {
            self.inner.find_pages(filter)
        }
        fn save_page(&self, record: &PageVisitRecord) -> Result<(), StoreError> {
            self.inner.save_page(record)
        }
        fn load_profile(&self, user: &str) -> Result<UserKeywordProfile, StoreError> {
            self.inner.load_profile(user)
        }
        fn save_profile(&self, profile: &UserKeywordProfile) -> Result<(), StoreError> {
            self.inner.save_profile(profile)
        }
        fn commit_merge(&self, profile: &UserKeywordProfile, id: RecordId) -> Result<(), StoreError> {
            if self.failing.lock().contains(&id) {
                return Err(StoreError::Unavailable("injected failure".to_string()));
            }
            self.inner.commit_merge(profile, id)
        }
        fn insert_search(&self, search: &SearchRecord) -> Result<(), StoreError> {
            self.inner.insert_search(search)
        }
        fn find_searches(
            &self,
            user: &str,
            since: Option<DateTime<Utc>>,
        ) -> Result<Vec<SearchRecord>, StoreError> {
            self.inner.find_searches(user, since)
        }
        fn insert_visit(&self, visit: &PageVisit) -> Result<(), StoreError> {
            self.inner.insert_visit(visit)
        }
        fn page_visits(&self, user: &str) -> Result<Vec<PageVisit>, StoreError> {
            self.inner.page_visits(user)
        }
        fn add_category_visits(
            &self,
            user: &str,
            categories: &BTreeSet<String>,
        ) -> Result<CategoryVisits, StoreError> {
            self.inner.add_category_visits(user, categories)
        }
        fn category_visits(&self, user: &str) -> Result<CategoryVisits, StoreError> {
            self.inner.category_visits(user)
        }
        fn cached_categories(&self, domain: &str) -> Result<Option<BTreeSet<String>>, StoreError> {
            self.inner.cached_categories(domain)
        }
        fn cache_categories(
            &self,
            domain: &str,
            categories: &BTreeSet<String>,
        ) -> Result<(), StoreError> {
            self.inner.cache_categories(domain, categories)
        }
        fn stats(&self) -> Result<StoreStats, StoreError> {
            self.inner.stats()
        }
        fn flush(&self) -> Result<(), StoreError> {
            self.inner.flush()
        }
    }

    #[test]
    fn test_failed_record_stays_unprocessed_and_pass_continues() {
        let store = Arc::new(FlakyStore {
            inner: MemoryStore::new(),
            failing: Mutex::new(HashSet::new()),
        });
        let bad = page("alfredo", &[("lol", 1)], &[]);
        let good = page("maria", &[("playa", 1)], &[]);
        store.insert_page(&bad).unwrap();
        store.insert_page(&good).unwrap();
        store.failing.lock().insert(bad.id);

        let aggregator = KeywordAggregator::new(store.clone());
        let report = aggregator.run_aggregation_pass().unwrap();
        assert_eq!(report.failed, 1);
        assert_eq!(report.merged, 1);
        assert!(store.load_profile("alfredo").unwrap().site_keywords_freq.is_empty());
        assert_eq!(store.load_profile("maria").unwrap().site_keywords_freq.get("playa"), 1);

        let pending = store.find_pages(&PageFilter::unprocessed()).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, bad.id);

        // Recovered on the next pass
        store.failing.lock().clear();
        let report = aggregator.run_aggregation_pass().unwrap();
        assert_eq!(report.merged, 1);
        assert_eq!(store.load_profile("alfredo").unwrap().site_keywords_freq.get("lol"), 1);
    }
}
