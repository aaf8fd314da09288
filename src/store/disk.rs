//! Persistent store backed by sled
//!
//! One tree per collection, values bincode-encoded:
//! - `pages`: record id -> PageVisitRecord
//! - `pending`: record id -> empty value, for every page not yet aggregated
//! - `profiles`: user -> UserKeywordProfile
//! - `searches`, `visits`: user \0 record id -> SearchRecord / PageVisit
//! - `category_visits`: user -> CategoryVisits
//! - `domain_categories`: domain -> category set

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::{ConflictableTransactionError, TransactionError};
use sled::Transactional;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::debug;

use super::{sort_pages, KeywordStore, PageFilter, StoreError, StoreStats};
use crate::types::{
    CategoryVisits, PageVisit, PageVisitRecord, RecordId, SearchRecord, UserKeywordProfile,
};

/// Store on an embedded sled database
pub struct SledStore {
    db: sled::Db,
    pages: sled::Tree,
    pending: sled::Tree,
    profiles: sled::Tree,
    searches: sled::Tree,
    visits: sled::Tree,
    category_visits: sled::Tree,
    domain_categories: sled::Tree,
}

impl SledStore {
    /// Open or create the database under `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = data_dir.as_ref().join("store.sled");
        let db = sled::open(&db_path)?;
        debug!("Opened sled database at {:?}", db_path);

        let indexed = db.tree_names().iter().any(|name| name.as_ref() == PENDING_TREE);
        let store = Self {
            pages: db.open_tree("pages")?,
            pending: db.open_tree(PENDING_TREE)?,
            profiles: db.open_tree("profiles")?,
            searches: db.open_tree("searches")?,
            visits: db.open_tree("visits")?,
            category_visits: db.open_tree("category_visits")?,
            domain_categories: db.open_tree("domain_categories")?,
            db,
        };
        if !indexed {
            store.rebuild_pending()?;
        }
        Ok(store)
    }

    /// Recreate the pending index from the page records
    fn rebuild_pending(&self) -> Result<(), StoreError> {
        self.pending.clear()?;
        let mut count = 0;
        for entry in self.pages.iter() {
            let (key, data) = entry?;
            let record: PageVisitRecord = decode(&data)?;
            if !record.processed {
                self.pending.insert(key, PENDING_MARK)?;
                count += 1;
            }
        }
        debug!("Indexed {} pending page records", count);
        Ok(())
    }

    fn scan_user<T: DeserializeOwned>(tree: &sled::Tree, user: &str) -> Result<Vec<T>, StoreError> {
        let mut found = Vec::new();
        for entry in tree.scan_prefix(user_prefix(user)) {
            let (_, data) = entry?;
            found.push(decode(&data)?);
        }
        Ok(found)
    }
}

const PENDING_TREE: &[u8] = b"pending";
const PENDING_MARK: &[u8] = b"";

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(data: &[u8]) -> Result<T, StoreError> {
    Ok(bincode::deserialize(data)?)
}

fn abort(err: impl Into<StoreError>) -> ConflictableTransactionError<StoreError> {
    ConflictableTransactionError::Abort(err.into())
}

fn from_transaction(err: TransactionError<StoreError>) -> StoreError {
    match err {
        TransactionError::Abort(e) => e,
        TransactionError::Storage(e) => StoreError::Backend(e),
    }
}

fn page_key(id: &RecordId) -> &[u8] {
    id.as_bytes()
}

fn user_prefix(user: &str) -> Vec<u8> {
    let mut prefix = Vec::with_capacity(user.len() + 1);
    prefix.extend_from_slice(user.as_bytes());
    prefix.push(0);
    prefix
}

fn user_key(user: &str, id: &RecordId) -> Vec<u8> {
    let mut key = user_prefix(user);
    key.extend_from_slice(id.as_bytes());
    key
}

impl KeywordStore for SledStore {
    fn insert_page(&self, record: &PageVisitRecord) -> Result<(), StoreError> {
        let data = encode(record)?;

        (&self.pages, &self.pending)
            .transaction(|(pages, pending)| {
                let key = page_key(&record.id);
                if pages.get(key)?.is_some() {
                    return Err(abort(StoreError::DuplicateRecord(record.id)));
                }
                pages.insert(key, data.clone())?;
                if !record.processed {
                    pending.insert(key, PENDING_MARK)?;
                }
                Ok(())
            })
            .map_err(from_transaction)
    }

    fn find_pages(&self, filter: &PageFilter) -> Result<Vec<PageVisitRecord>, StoreError> {
        let mut found = Vec::new();
        if filter.processed == Some(false) {
            for entry in self.pending.iter() {
                let (key, _) = entry?;
                if let Some(data) = self.pages.get(key)? {
                    let record: PageVisitRecord = decode(&data)?;
                    if filter.matches(&record) {
                        found.push(record);
                    }
                }
            }
        } else {
            for entry in self.pages.iter() {
                let (_, data) = entry?;
                let record: PageVisitRecord = decode(&data)?;
                if filter.matches(&record) {
                    found.push(record);
                }
            }
        }
        sort_pages(&mut found);
        Ok(found)
    }

    fn save_page(&self, record: &PageVisitRecord) -> Result<(), StoreError> {
        let data = encode(record)?;

        (&self.pages, &self.pending)
            .transaction(|(pages, pending)| {
                let key = page_key(&record.id);
                pages.insert(key, data.clone())?;
                if record.processed {
                    pending.remove(key)?;
                } else {
                    pending.insert(key, PENDING_MARK)?;
                }
                Ok(())
            })
            .map_err(from_transaction)
    }

    fn load_profile(&self, user: &str) -> Result<UserKeywordProfile, StoreError> {
        match self.profiles.get(user.as_bytes())? {
            Some(data) => decode(&data),
            None => Ok(UserKeywordProfile::empty(user)),
        }
    }

    fn save_profile(&self, profile: &UserKeywordProfile) -> Result<(), StoreError> {
        self.profiles.insert(profile.user.as_bytes(), encode(profile)?)?;
        Ok(())
    }

    fn commit_merge(&self, profile: &UserKeywordProfile, id: RecordId) -> Result<(), StoreError> {
        let profile_data = encode(profile)?;

        (&self.pages, &self.pending, &self.profiles)
            .transaction(|(pages, pending, profiles)| {
                let key = page_key(&id);
                let Some(data) = pages.get(key)? else {
                    return Err(abort(StoreError::RecordNotFound(id)));
                };
                let mut record: PageVisitRecord = bincode::deserialize(&data).map_err(abort)?;
                record.processed = true;

                pages.insert(key, bincode::serialize(&record).map_err(abort)?)?;
                pending.remove(key)?;
                profiles.insert(profile.user.as_bytes(), profile_data.clone())?;
                Ok(())
            })
            .map_err(from_transaction)
    }

    fn insert_search(&self, search: &SearchRecord) -> Result<(), StoreError> {
        self.searches
            .insert(user_key(&search.user, &search.id), encode(search)?)?;
        Ok(())
    }

    fn find_searches(
        &self,
        user: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<SearchRecord>, StoreError> {
        let mut found: Vec<SearchRecord> = Self::scan_user(&self.searches, user)?;
        if let Some(since) = since {
            found.retain(|s| s.date >= since);
        }
        found.sort_by_key(|s| s.date);
        Ok(found)
    }

    fn insert_visit(&self, visit: &PageVisit) -> Result<(), StoreError> {
        self.visits
            .insert(user_key(&visit.user, &visit.id), encode(visit)?)?;
        Ok(())
    }

    fn page_visits(&self, user: &str) -> Result<Vec<PageVisit>, StoreError> {
        let mut found: Vec<PageVisit> = Self::scan_user(&self.visits, user)?;
        found.sort_by_key(|v| v.date);
        Ok(found)
    }

    fn add_category_visits(
        &self,
        user: &str,
        categories: &BTreeSet<String>,
    ) -> Result<CategoryVisits, StoreError> {
        self.category_visits
            .transaction(|tree| {
                let mut counts: CategoryVisits = match tree.get(user.as_bytes())? {
                    Some(data) => bincode::deserialize(&data).map_err(abort)?,
                    None => CategoryVisits::new(),
                };
                for category in categories {
                    *counts.entry(category.clone()).or_insert(0) += 1;
                }
                tree.insert(user.as_bytes(), bincode::serialize(&counts).map_err(abort)?)?;
                Ok(counts)
            })
            .map_err(from_transaction)
    }

    fn category_visits(&self, user: &str) -> Result<CategoryVisits, StoreError> {
        match self.category_visits.get(user.as_bytes())? {
            Some(data) => decode(&data),
            None => Ok(CategoryVisits::new()),
        }
    }

    fn cached_categories(&self, domain: &str) -> Result<Option<BTreeSet<String>>, StoreError> {
        self.domain_categories
            .get(domain.as_bytes())?
            .map(|data| decode(&data))
            .transpose()
    }

    fn cache_categories(
        &self,
        domain: &str,
        categories: &BTreeSet<String>,
    ) -> Result<(), StoreError> {
        self.domain_categories
            .insert(domain.as_bytes(), encode(categories)?)?;
        Ok(())
    }

    fn stats(&self) -> Result<StoreStats, StoreError> {
        Ok(StoreStats {
            pages: self.pages.len(),
            unprocessed_pages: self.pending.len(),
            profiles: self.profiles.len(),
            searches: self.searches.len(),
            visits: self.visits.len(),
            cached_domains: self.domain_categories.len(),
        })
    }

    fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }
}
