//! Core types for the interest mining pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

/// Identifier of a tracked user
pub type UserId = String;

/// Visits per category for one user
pub type CategoryVisits = BTreeMap<String, u64>;

// ============================================================================
// Identity
// ============================================================================

/// Identity of a stored record (page visit record, search, visit log entry)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordId(pub Uuid);

impl RecordId {
    /// Generate a fresh random id
    pub fn new() -> Self {
        RecordId(Uuid::new_v4())
    }

    /// Raw bytes, used as storage key
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// Rebuild an id from a storage key
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        Uuid::from_slice(bytes).ok().map(RecordId)
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Language
// ============================================================================

/// Languages the pipeline processes natively.
///
/// Anything the classifier reports outside this set is processed as English.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Spanish,
    #[default]
    English,
}

impl Language {
    /// Map an ISO 639 code ("es", "spa", "en", ...) to a supported language
    pub fn from_code(code: &str) -> Self {
        match code.trim().to_ascii_lowercase().as_str() {
            "es" | "spa" | "spanish" => Language::Spanish,
            _ => Language::English,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Spanish => "spanish",
            Language::English => "english",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Keyword frequencies
// ============================================================================

/// Word -> occurrence count. Ordering carries no meaning, only counts do.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrequencyTable(BTreeMap<String, u64>);

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every word of a sequence
    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for word in words {
            table.add(word.into(), 1);
        }
        table
    }

    /// Add `count` occurrences of `word`
    pub fn add(&mut self, word: String, count: u64) {
        *self.0.entry(word).or_insert(0) += count;
    }

    /// Key-wise sum of `other` into `self`
    pub fn merge(&mut self, other: &FrequencyTable) {
        for (word, count) in &other.0 {
            self.add(word.clone(), *count);
        }
    }

    pub fn get(&self, word: &str) -> u64 {
        self.0.get(word).copied().unwrap_or(0)
    }

    pub fn contains(&self, word: &str) -> bool {
        self.0.contains_key(word)
    }

    /// Number of distinct words
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all counts
    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.0.iter().map(|(w, c)| (w.as_str(), *c))
    }

    /// Most frequent words first; ties broken alphabetically
    pub fn top(&self, limit: Option<usize>) -> Vec<(String, u64)> {
        let mut entries: Vec<(String, u64)> =
            self.0.iter().map(|(w, c)| (w.clone(), *c)).collect();
        entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        entries
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for FrequencyTable {
    fn from_iter<T: IntoIterator<Item = (S, u64)>>(iter: T) -> Self {
        let mut table = Self::new();
        for (word, count) in iter {
            table.add(word.into(), count);
        }
        table
    }
}

/// Which of a profile's two keyword tables an operation targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeywordKind {
    /// Keywords from the visible page text
    Site,
    /// Keywords from title/description/keywords metadata
    Metadata,
}

impl fmt::Display for KeywordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeywordKind::Site => f.write_str("site"),
            KeywordKind::Metadata => f.write_str("metadata"),
        }
    }
}

/// The two frequency tables computed for a page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KeywordFreqs {
    pub text: FrequencyTable,
    pub metadata: FrequencyTable,
}

// ============================================================================
// Page visit records
// ============================================================================

/// Metadata properties kept from a page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetaProperty {
    Title,
    Description,
    Keywords,
}

impl MetaProperty {
    /// Resolve a `<meta name="...">` value against the allow-list.
    /// `title` comes from the `<title>` element, never from a meta tag.
    pub fn from_meta_name(name: &str) -> Option<Self> {
        match name.trim() {
            "description" => Some(MetaProperty::Description),
            "keywords" => Some(MetaProperty::Keywords),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetaProperty::Title => "title",
            MetaProperty::Description => "description",
            MetaProperty::Keywords => "keywords",
        }
    }
}

/// One HTML submission for a (user, url, timestamp).
///
/// All derived fields are computed before the record is first stored; the
/// only later mutation is `processed` flipping to true during aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageVisitRecord {
    pub id: RecordId,
    pub page_url: String,
    pub user: UserId,
    pub timestamp: DateTime<Utc>,
    /// Entity-unescaped markup as received
    pub raw_html: String,
    /// Markup-stripped text
    pub clean_text: String,
    pub language: Language,
    pub metadata: BTreeMap<MetaProperty, String>,
    pub keyword_freqs: KeywordFreqs,
    #[serde(default)]
    pub processed: bool,
}

impl PageVisitRecord {
    /// Frequency table feeding the given profile table
    pub fn freqs(&self, kind: KeywordKind) -> &FrequencyTable {
        match kind {
            KeywordKind::Site => &self.keyword_freqs.text,
            KeywordKind::Metadata => &self.keyword_freqs.metadata,
        }
    }
}

// ============================================================================
// User keyword profiles
// ============================================================================

/// Cumulative keyword counts for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserKeywordProfile {
    pub user: UserId,
    pub site_keywords_freq: FrequencyTable,
    pub metadata_keywords_freq: FrequencyTable,
    /// Records already folded into this profile
    #[serde(default)]
    pub merged_records: BTreeSet<RecordId>,
}

impl UserKeywordProfile {
    /// Empty profile, used when a user has none stored yet
    pub fn empty(user: impl Into<UserId>) -> Self {
        Self {
            user: user.into(),
            site_keywords_freq: FrequencyTable::new(),
            metadata_keywords_freq: FrequencyTable::new(),
            merged_records: BTreeSet::new(),
        }
    }

    pub fn table(&self, kind: KeywordKind) -> &FrequencyTable {
        match kind {
            KeywordKind::Site => &self.site_keywords_freq,
            KeywordKind::Metadata => &self.metadata_keywords_freq,
        }
    }

    pub fn table_mut(&mut self, kind: KeywordKind) -> &mut FrequencyTable {
        match kind {
            KeywordKind::Site => &mut self.site_keywords_freq,
            KeywordKind::Metadata => &mut self.metadata_keywords_freq,
        }
    }

    pub fn has_merged(&self, id: &RecordId) -> bool {
        self.merged_records.contains(id)
    }

    /// Add a record's tables into this profile.
    ///
    /// Returns false and leaves the profile untouched if the record was
    /// merged before.
    pub fn merge_record(&mut self, record: &PageVisitRecord) -> bool {
        if !self.merged_records.insert(record.id) {
            return false;
        }
        for kind in [KeywordKind::Site, KeywordKind::Metadata] {
            self.table_mut(kind).merge(record.freqs(kind));
        }
        true
    }

    /// Keywords of one kind, most frequent first
    pub fn top_keywords(&self, kind: KeywordKind, limit: Option<usize>) -> Vec<(String, u64)> {
        self.table(kind).top(limit)
    }
}

// ============================================================================
// Searches and visits
// ============================================================================

/// A search query issued by a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRecord {
    pub id: RecordId,
    pub user: UserId,
    pub search_query: String,
    pub date: DateTime<Utc>,
}

impl SearchRecord {
    pub fn new(user: impl Into<UserId>, search_query: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            id: RecordId::new(),
            user: user.into(),
            search_query: search_query.into(),
            date,
        }
    }
}

/// Plain page-visit log entry (no HTML)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageVisit {
    pub id: RecordId,
    pub user: UserId,
    pub page_url: String,
    pub domain: String,
    pub date: DateTime<Utc>,
}
