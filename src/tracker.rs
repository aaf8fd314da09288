//! Ingestion of client events
//!
//! One entry point per event a tracking client reports: a visited URL, the
//! HTML of a visited page, and a search query. Every call goes through the
//! store handed to [`Tracker::new`].

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};
use url::Url;

use crate::categorize::{CategorizeError, DomainCategorizer};
use crate::extractor::PageExtractor;
use crate::store::{KeywordStore, StoreError};
use crate::types::{PageVisit, PageVisitRecord, RecordId, SearchRecord};

/// Ingestion failures
#[derive(Debug, Error)]
pub enum TrackError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error(transparent)]
    Categorize(#[from] CategorizeError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A logged visit and the categories its domain resolved to
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedVisit {
    pub visit: PageVisit,
    pub categories: BTreeSet<String>,
}

/// Ingestion façade over the store, extractor and categorizer
pub struct Tracker {
    store: Arc<dyn KeywordStore>,
    extractor: PageExtractor,
    categorizer: Box<dyn DomainCategorizer>,
}

impl Tracker {
    pub fn new(
        store: Arc<dyn KeywordStore>,
        extractor: PageExtractor,
        categorizer: Box<dyn DomainCategorizer>,
    ) -> Self {
        Self {
            store,
            extractor,
            categorizer,
        }
    }

    /// Log a visit to `page_url` and count it against the domain's categories.
    ///
    /// The visit is stored before categorization; a categorization failure
    /// is returned afterwards and leaves category counters untouched.
    pub fn record_page_visit(
        &self,
        user: &str,
        page_url: &str,
        date: DateTime<Utc>,
    ) -> Result<TrackedVisit, TrackError> {
        validate_user(user)?;
        let domain = domain_of(page_url)?;

        let visit = PageVisit {
            id: RecordId::new(),
            user: user.to_string(),
            page_url: page_url.to_string(),
            domain: domain.clone(),
            date,
        };
        self.store.insert_visit(&visit)?;

        let categories = self.categorizer.categories(&domain)?;
        if !categories.is_empty() {
            self.store.add_category_visits(user, &categories)?;
        }

        debug!("Visit of {} to {} ({:?})", user, domain, categories);
        Ok(TrackedVisit { visit, categories })
    }

    /// Extract features from `html` and store them as an unprocessed record
    pub fn record_page_html(
        &self,
        user: &str,
        page_url: &str,
        html: &str,
        date: DateTime<Utc>,
    ) -> Result<PageVisitRecord, TrackError> {
        validate_user(user)?;
        domain_of(page_url)?;

        let record = self.extractor.build_record(user, page_url, html, date);
        self.store.insert_page(&record)?;

        info!(
            "Stored page record {} for {} ({} text keywords, {} metadata keywords)",
            record.id,
            user,
            record.keyword_freqs.text.len(),
            record.keyword_freqs.metadata.len()
        );
        Ok(record)
    }

    pub fn record_search(
        &self,
        user: &str,
        query: &str,
        date: DateTime<Utc>,
    ) -> Result<SearchRecord, TrackError> {
        validate_user(user)?;
        if query.trim().is_empty() {
            return Err(TrackError::InvalidInput("search query is empty".to_string()));
        }

        let search = SearchRecord::new(user, query.trim(), date);
        self.store.insert_search(&search)?;
        debug!("Search of {}: {:?}", user, search.search_query);
        Ok(search)
    }
}

fn validate_user(user: &str) -> Result<(), TrackError> {
    if user.trim().is_empty() {
        return Err(TrackError::InvalidInput("user is empty".to_string()));
    }
    Ok(())
}

/// Host of an absolute URL, lowercased
pub fn domain_of(page_url: &str) -> Result<String, TrackError> {
    let invalid = |reason: String| TrackError::InvalidUrl {
        url: page_url.to_string(),
        reason,
    };
    let url = Url::parse(page_url).map_err(|e| invalid(e.to_string()))?;
    url.host_str()
        .filter(|host| !host.is_empty())
        .map(str::to_lowercase)
        .ok_or_else(|| invalid("no host".to_string()))
}
