//! Integration tests for interest-miner
//!
//! These tests drive the pipeline through its public API, from client
//! events to profiles and intention scores, on a sled store.

use chrono::{Duration, TimeZone, Utc};
use interest_miner::{
    aggregation::KeywordAggregator,
    categorize::{domains_by_category, CachingCategorizer, StaticCategorizer},
    config::{Config, StorageBackend, StorageConfig},
    extractor::PageExtractor,
    intention::{ranked, IntentionLexicon, IntentionScorer},
    store::{open_store, KeywordStore, PageFilter, StoreError},
    text::TextNormalizer,
    tracker::Tracker,
    types::{KeywordKind, Language, MetaProperty},
};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tempfile::TempDir;

struct Pipeline {
    store: Arc<dyn KeywordStore>,
    normalizer: Arc<TextNormalizer>,
    tracker: Tracker,
}

/// Open the configured store, waiting out the file lock of a database
/// dropped moments ago
fn open_with_retry(config: &Config) -> Arc<dyn KeywordStore> {
    let mut attempt = 0;
    loop {
        match open_store(&config.storage) {
            Ok(store) => return store,
            Err(StoreError::Backend(ref e))
                if attempt < 100 && e.to_string().contains("could not acquire lock") => {}
            Err(e) => panic!("failed to open store: {}", e),
        }
        attempt += 1;
        std::thread::sleep(StdDuration::from_millis(20));
    }
}

fn pipeline(config: &Config) -> Pipeline {
    let store = open_with_retry(config);
    let normalizer = Arc::new(TextNormalizer::new(&config.text));
    let categorizer = CachingCategorizer::new(
        StaticCategorizer::from_config(&config.categorization),
        store.clone(),
    );
    let tracker = Tracker::new(
        store.clone(),
        PageExtractor::new(normalizer.clone(), &config.text),
        Box::new(categorizer),
    );
    Pipeline {
        store,
        normalizer,
        tracker,
    }
}

fn sled_config(temp_dir: &TempDir) -> Config {
    let mut domains = BTreeMap::new();
    domains.insert("elpais.com".to_string(), vec!["News/Media".to_string()]);
    domains.insert(
        "booking.com".to_string(),
        vec!["Travel".to_string(), "Ecommerce/Shopping".to_string()],
    );

    let mut config = Config::default();
    config.storage = StorageConfig {
        backend: StorageBackend::Sled,
        data_dir: temp_dir.path().to_path_buf(),
    };
    config.categorization.domains = domains;
    config
}

#[test]
fn test_pages_to_profile() {
    let temp_dir = TempDir::new().unwrap();
    let config = sled_config(&temp_dir);
    let p = pipeline(&config);

    let first = p
        .tracker
        .record_page_html(
            "alfredo",
            "http://example.com/1",
            "<a>limpito</a><div>lol</div><p>lolazo lolazo</p>",
            Utc::now(),
        )
        .unwrap();
    assert!(first.metadata.is_empty());

    p.tracker
        .record_page_html(
            "alfredo",
            "http://example.com/2",
            "<p>limpito</p><p>limpito lol</p><p>lolazo lolazo</p>",
            Utc::now(),
        )
        .unwrap();

    let aggregator = KeywordAggregator::new(p.store.clone());
    let report = aggregator.run_aggregation_pass().unwrap();
    assert_eq!(report.scanned, 2);
    assert_eq!(report.merged, 2);
    assert_eq!(report.users_touched, 1);

    let profile = p.store.load_profile("alfredo").unwrap();
    assert_eq!(
        profile.top_keywords(KeywordKind::Site, None),
        vec![
            ("lolazo".to_string(), 4),
            ("limpito".to_string(), 3),
            ("lol".to_string(), 2),
        ]
    );

    // A second pass finds nothing
    let report = aggregator.run_aggregation_pass().unwrap();
    assert_eq!(report.scanned, 0);
    assert_eq!(p.store.load_profile("alfredo").unwrap(), profile);
}

#[test]
fn test_metadata_feeds_metadata_table() {
    let temp_dir = TempDir::new().unwrap();
    let p = pipeline(&sled_config(&temp_dir));

    let html = r#"<html><head>
        <meta name="description" content="Noticias de última">
        <title>Noticias de última</title>
        </head><body><p>El gobierno ha anunciado hoy que las nuevas medidas
        económicas entrarán en vigor la próxima semana en todo el país.</p></body></html>"#;
    let record = p
        .tracker
        .record_page_html("alfredo", "http://elpais.com/", html, Utc::now())
        .unwrap();
    assert_eq!(
        record.metadata.get(&MetaProperty::Description).map(String::as_str),
        Some("Noticias de última")
    );
    assert_eq!(
        record.metadata.get(&MetaProperty::Title).map(String::as_str),
        Some("Noticias de última")
    );
    assert_eq!(record.language, Language::Spanish);

    KeywordAggregator::new(p.store.clone())
        .run_aggregation_pass()
        .unwrap();
    let profile = p.store.load_profile("alfredo").unwrap();
    assert_eq!(profile.metadata_keywords_freq.get("noticias"), 2);
    // The title is visible text as well
    assert_eq!(profile.site_keywords_freq.get("noticias"), 1);
    assert_eq!(profile.site_keywords_freq.get("económicas"), 1);
}

#[test]
fn test_profiles_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let config = sled_config(&temp_dir);

    {
        let p = pipeline(&config);
        p.tracker
            .record_page_html("maria", "http://example.com/", "<p>playa playa</p>", Utc::now())
            .unwrap();
        p.tracker
            .record_page_html("maria", "http://example.com/b", "<p>montaña</p>", Utc::now())
            .unwrap();
        KeywordAggregator::new(p.store.clone())
            .run_aggregation_pass()
            .unwrap();
        p.tracker
            .record_page_html("maria", "http://example.com/c", "<p>playa</p>", Utc::now())
            .unwrap();
        p.store.flush().unwrap();
    }

    let p = pipeline(&config);
    assert_eq!(p.store.find_pages(&PageFilter::unprocessed()).unwrap().len(), 1);
    assert_eq!(
        p.store.load_profile("maria").unwrap().site_keywords_freq.get("playa"),
        2
    );

    KeywordAggregator::new(p.store.clone())
        .run_aggregation_pass()
        .unwrap();
    let profile = p.store.load_profile("maria").unwrap();
    assert_eq!(profile.site_keywords_freq.get("playa"), 3);
    assert_eq!(profile.merged_records.len(), 3);
}

#[test]
fn test_visits_categorized_and_counted() {
    let temp_dir = TempDir::new().unwrap();
    let p = pipeline(&sled_config(&temp_dir));

    for url in [
        "http://elpais.com/",
        "http://www.booking.com/hotel/roma",
        "https://booking.com/",
        "http://desconocido.org/",
    ] {
        p.tracker.record_page_visit("alfredo", url, Utc::now()).unwrap();
    }

    let counts = p.store.category_visits("alfredo").unwrap();
    assert_eq!(counts.get("Travel"), Some(&2));
    assert_eq!(counts.get("Ecommerce/Shopping"), Some(&2));
    assert_eq!(counts.get("News/Media"), Some(&1));
    assert_eq!(p.store.page_visits("alfredo").unwrap().len(), 4);

    let grouped = domains_by_category(p.store.as_ref(), "alfredo").unwrap();
    assert_eq!(grouped["Travel"].len(), 2);
    assert!(grouped["News/Media"].contains("elpais.com"));
}

#[test]
fn test_search_intentions() {
    let temp_dir = TempDir::new().unwrap();
    let p = pipeline(&sled_config(&temp_dir));
    let now = Utc.with_ymd_and_hms(2024, 6, 15, 9, 30, 0).unwrap();

    for (query, days_ago) in [
        ("comprar televisor samsung", 0),
        ("televisor samsung barato", 12),
        ("samsung televisor precio", 30),
        ("regalo bicicleta", 2),
        ("hotel roma", 1),
        ("resultados liga", 0),
        ("comprar patinete", 45),
    ] {
        p.tracker
            .record_search("alfredo", query, now - Duration::days(days_ago))
            .unwrap();
    }

    let scorer = IntentionScorer::new(p.store.clone(), p.normalizer.clone());
    let buy = IntentionLexicon::buy(&p.normalizer);
    let groups = scorer.compute_intentions_at("alfredo", &buy, 40, now).unwrap();
    assert_eq!(groups.len(), 2);

    let ranking = ranked(groups);
    let tv = &ranking[0];
    assert_eq!(tv.dates.len(), 3);
    assert_eq!(tv.dates[0], now);
    assert!(tv.scores.continuous_index > 0.0);
    assert!(tv.scores.smart_index > ranking[1].scores.smart_index);

    let travel = IntentionLexicon::travel(&p.normalizer);
    let groups = scorer.compute_intentions_at("alfredo", &travel, 40, now).unwrap();
    assert_eq!(groups.len(), 1);
}
