//! In-memory store backend

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

use super::{sort_pages, KeywordStore, PageFilter, StoreError, StoreStats};
use crate::types::{
    CategoryVisits, PageVisit, PageVisitRecord, RecordId, SearchRecord, UserId,
    UserKeywordProfile,
};

/// Process-local store.
///
/// `pages` is always locked before `profiles` when both are needed.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pages: RwLock<HashMap<RecordId, PageVisitRecord>>,
    profiles: RwLock<HashMap<UserId, UserKeywordProfile>>,
    searches: RwLock<Vec<SearchRecord>>,
    visits: RwLock<Vec<PageVisit>>,
    category_visits: RwLock<HashMap<UserId, CategoryVisits>>,
    domain_categories: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeywordStore for MemoryStore {
    fn insert_page(&self, record: &PageVisitRecord) -> Result<(), StoreError> {
        let mut pages = self.pages.write();
        if pages.contains_key(&record.id) {
            return Err(StoreError::DuplicateRecord(record.id));
        }
        pages.insert(record.id, record.clone());
        Ok(())
    }

    fn find_pages(&self, filter: &PageFilter) -> Result<Vec<PageVisitRecord>, StoreError> {
        let mut found: Vec<PageVisitRecord> = self
            .pages
            .read()
            .values()
            .filter(|record| filter.matches(record))
            .cloned()
            .collect();
        sort_pages(&mut found);
        Ok(found)
    }

    fn save_page(&self, record: &PageVisitRecord) -> Result<(), StoreError> {
        self.pages.write().insert(record.id, record.clone());
        Ok(())
    }

    fn load_profile(&self, user: &str) -> Result<UserKeywordProfile, StoreError> {
        Ok(self
            .profiles
            .read()
            .get(user)
            .cloned()
            .unwrap_or_else(|| UserKeywordProfile::empty(user)))
    }

    fn save_profile(&self, profile: &UserKeywordProfile) -> Result<(), StoreError> {
        self.profiles
            .write()
            .insert(profile.user.clone(), profile.clone());
        Ok(())
    }

    fn commit_merge(&self, profile: &UserKeywordProfile, id: RecordId) -> Result<(), StoreError> {
        let mut pages = self.pages.write();
        let mut profiles = self.profiles.write();

        let record = pages.get_mut(&id).ok_or(StoreError::RecordNotFound(id))?;
        record.processed = true;
        profiles.insert(profile.user.clone(), profile.clone());
        Ok(())
    }

    fn insert_search(&self, search: &SearchRecord) -> Result<(), StoreError> {
        self.searches.write().push(search.clone());
        Ok(())
    }

    fn find_searches(
        &self,
        user: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchRecord>, StoreError> {
        let mut found: Vec<SearchRecord> = self
            .searches
            .read()
            .iter()
            .filter(|s| s.user == user && since.map_or(true, |since| s.date >= since))
            .cloned()
            .collect();
        found.sort_by_key(|s| s.date);
        Ok(found)
    }

    fn insert_visit(&self, visit: &PageVisit) -> Result<(), StoreError> {
        self.visits.write().push(visit.clone());
        Ok(())
    }

    fn page_visits(&self, user: &str) -> Result<Vec<PageVisit>, StoreError> {
        let mut found: Vec<PageVisit> = self
            .visits
            .read()
            .iter()
            .filter(|v| v.user == user)
            .cloned()
            .collect();
        found.sort_by_key(|v| v.date);
        Ok(found)
    }

    fn add_category_visits(
        &self,
        user: &str,
        categories: &BTreeSet<String>,
    ) -> Result<CategoryVisits, StoreError> {
        let mut all = self.category_visits.write();
        let counts = all.entry(user.to_string()).or_default();
        for category in categories {
            *counts.entry(category.clone()).or_insert(0) += 1;
        }
        Ok(counts.clone())
    }

    fn category_visits(&self, user: &str) -> Result<CategoryVisits, StoreError> {
        Ok(self
            .category_visits
            .read()
            .get(user)
            .cloned()
            .unwrap_or_default())
    }

    fn cached_categories(&self, domain: &str) -> Result<Option<BTreeSet<String>>, StoreError> {
        Ok(self.domain_categories.read().get(domain).cloned())
    }

    fn cache_categories(
        &self,
        domain: &str,
        categories: &BTreeSet<String>,
    ) -> Result<(), StoreError> {
        self.domain_categories
            .write()
            .insert(domain.to_string(), categories.clone());
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        let pages = self.pages.read();
        Ok(StoreStats {
            pages: pages.len(),
            unprocessed_pages: pages.values().filter(|p| !p.processed).count(),
            profiles: self.profiles.read().len(),
            searches: self.searches.read().len(),
            visits: self.visits.read().len(),
            cached_domains: self.domain_categories.read().len(),
        })
    }

    fn flush(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
