//! Intention scoring from search history
//!
//! A search is relevant when one of its stemmed words appears in an
//! intention lexicon. Relevant searches are grouped by their remaining
//! "object" words, and every group gets three time-decay indices in [0, 1):
//!
//! - immediate: recent searches weigh more, `(2/π)·atan(Σ idx / (days + 1))`
//! - continuous: searches recurring over a long span weigh more,
//!   `(2/π)·atan(Σ_{i<j} (days_j - days_i)·avg(idx_i, idx_j) / 40)`
//! - smart: the mean of the two

mod lexicon;

pub use lexicon::{load_lexicons, IntentionLexicon, LexiconError, BUILTIN_LEXICONS};

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::f64::consts::PI;
use std::sync::Arc;
use tracing::debug;

use crate::store::{KeywordStore, StoreError};
use crate::text::TextNormalizer;
use crate::types::SearchRecord;

/// Default look-back window for searches, in days
pub const RELEVANT_INTENTION_DAYS: i64 = 40;

/// Divisor of the continuous interest sum
pub const CONTINUOUS_WINDOW_DAYS: f64 = 40.0;

/// Object words identifying what an interest is about
pub type Subject = BTreeSet<String>;

/// A search that matched the lexicon
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelevantSearch {
    pub query: String,
    pub date: DateTime<Utc>,
    pub intention_words: Vec<String>,
    pub object_words: Vec<String>,
    /// Summed lexicon weight, capped at 1
    pub intention_index: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InterestScores {
    pub smart_index: f64,
    pub immediate_index: f64,
    pub continuous_index: f64,
}

/// All relevant searches about one subject
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InterestGroup {
    pub subject: Subject,
    /// Most recent first
    pub dates: Vec<DateTime<Utc>>,
    /// Parallel to `dates`
    pub intention_indexes: Vec<f64>,
    pub scores: InterestScores,
}

impl InterestGroup {
    /// Subject words joined by a space
    pub fn label(&self) -> String {
        self.subject.iter().map(String::as_str).collect::<Vec<_>>().join(" ")
    }
}

fn normalize_atan(value: f64) -> f64 {
    2.0 / PI * value.atan()
}

/// Decay indices for a group, `days_ago` and `indexes` ordered most recent first
pub fn interest_scores(days_ago: &[i64], indexes: &[f64]) -> InterestScores {
    let immediate_sum: f64 = days_ago
        .iter()
        .zip(indexes)
        .map(|(&days, &index)| index / (days as f64 + 1.0))
        .sum();
    let immediate_index = normalize_atan(immediate_sum);

    let mut continuous_sum = 0.0;
    for i in 0..days_ago.len() {
        for j in (i + 1)..days_ago.len() {
            let average = (indexes[i] + indexes[j]) / 2.0;
            continuous_sum += (days_ago[j] - days_ago[i]) as f64 * average;
        }
    }
    let continuous_index = normalize_atan(continuous_sum / CONTINUOUS_WINDOW_DAYS);

    InterestScores {
        smart_index: (immediate_index + continuous_index) / 2.0,
        immediate_index,
        continuous_index,
    }
}

/// Whole days between `date` and `now`, floored and never negative
pub fn days_between(date: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - date).num_days().max(0)
}

/// Split stemmed query words into intention and object words.
///
/// Scanning starts at the first lexicon word. Words before it are object
/// words; after it, lexicon words add to the intention and everything else
/// is an object word. Returns `None` when no word is in the lexicon.
pub fn split_query(
    words: &[String],
    lexicon: &IntentionLexicon,
) -> Option<(Vec<String>, Vec<String>, f64)> {
    let first = words.iter().position(|w| lexicon.contains(w))?;

    let mut intention_words = vec![words[first].clone()];
    let mut intention_index = lexicon.weight(&words[first]).unwrap_or(0.0);
    let mut object_words: Vec<String> = words[..first].to_vec();

    for word in &words[first + 1..] {
        match lexicon.weight(word) {
            Some(weight) => {
                intention_words.push(word.clone());
                intention_index += weight;
            }
            None => object_words.push(word.clone()),
        }
    }

    Some((intention_words, object_words, intention_index.min(1.0)))
}

/// Computes interest groups from a user's searches
pub struct IntentionScorer {
    store: Arc<dyn KeywordStore>,
    normalizer: Arc<TextNormalizer>,
}

impl IntentionScorer {
    pub fn new(store: Arc<dyn KeywordStore>, normalizer: Arc<TextNormalizer>) -> Self {
        Self { store, normalizer }
    }

    /// Analyze one search against `lexicon`
    pub fn relevant_search(
        &self,
        search: &SearchRecord,
        lexicon: &IntentionLexicon,
    ) -> Option<RelevantSearch> {
        let words = self
            .normalizer
            .normalize(&search.search_query, lexicon.language(), true);
        let (intention_words, object_words, intention_index) = split_query(&words, lexicon)?;

        Some(RelevantSearch {
            query: search.search_query.clone(),
            date: search.date,
            intention_words,
            object_words,
            intention_index,
        })
    }

    /// Interest groups of `user` over the last `window_days` days
    pub fn compute_intentions(
        &self,
        user: &str,
        lexicon: &IntentionLexicon,
        window_days: i64,
    ) -> Result<BTreeMap<Subject, InterestGroup>, StoreError> {
        self.compute_intentions_at(user, lexicon, window_days, Utc::now())
    }

    /// Interest groups of `user` evaluated at instant `now`
    pub fn compute_intentions_at(
        &self,
        user: &str,
        lexicon: &IntentionLexicon,
        window_days: i64,
        now: DateTime<Utc>,
    ) -> Result<BTreeMap<Subject, InterestGroup>, StoreError> {
        let since = Duration::try_days(window_days)
            .and_then(|window| now.checked_sub_signed(window))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let searches = self.store.find_searches(user, Some(since))?;

        let mut entries: BTreeMap<Subject, Vec<(DateTime<Utc>, f64)>> = BTreeMap::new();
        let mut relevant = 0;
        for search in searches.iter().filter(|s| s.date <= now) {
            if let Some(found) = self.relevant_search(search, lexicon) {
                relevant += 1;
                let subject: Subject = found.object_words.into_iter().collect();
                entries
                    .entry(subject)
                    .or_default()
                    .push((found.date, found.intention_index));
            }
        }

        let groups: BTreeMap<Subject, InterestGroup> = entries
            .into_iter()
            .map(|(subject, mut pairs)| {
                pairs.sort_by(|a, b| b.0.cmp(&a.0));
                let days_ago: Vec<i64> = pairs.iter().map(|(d, _)| days_between(*d, now)).collect();
                let (dates, intention_indexes): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();
                let scores = interest_scores(&days_ago, &intention_indexes);
                let group = InterestGroup {
                    subject: subject.clone(),
                    dates,
                    intention_indexes,
                    scores,
                };
                (subject, group)
            })
            .collect();

        debug!(
            "Intentions of {} with lexicon '{}': {} searches, {} relevant, {} groups",
            user,
            lexicon.name(),
            searches.len(),
            relevant,
            groups.len()
        );
        Ok(groups)
    }
}

/// Groups ordered by descending smart index
pub fn ranked(groups: BTreeMap<Subject, InterestGroup>) -> Vec<InterestGroup> {
    let mut ranked: Vec<InterestGroup> = groups.into_values().collect();
    ranked.sort_by(|a, b| b.scores.smart_index.total_cmp(&a.scores.smart_index));
    ranked
}
