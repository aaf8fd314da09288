//! Intention lexicons: stemmed word -> weight in [0, 1]

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::text::TextNormalizer;
use crate::types::Language;

const BUY_WORDS_ES: &[(&str, f64)] = &[
    ("comprar", 1.0),
    ("comparativa", 1.0),
    ("barato", 1.0),
    ("precio", 1.0),
    ("regalo", 1.0),
    ("mejores", 1.0),
    ("recomendacion", 1.0),
    ("calidad", 0.5),
    ("tiendas", 0.5),
    ("saldo", 0.5),
    ("amazon", 1.0),
    ("ebay", 1.0),
    ("chollo", 1.0),
    ("opinion", 1.0),
    ("descuento", 1.0),
    ("venta", 1.0),
    ("outlet", 1.0),
    ("disponibilidad", 1.0),
    ("stock", 1.0),
    ("bueno", 1.0),
    ("valoracion", 1.0),
    ("economico", 1.0),
    ("ofertas", 1.0),
    ("promociones", 1.0),
    ("rebajas", 1.0),
    ("marcas", 1.0),
    ("caro", 1.0),
    ("liquidacion", 1.0),
    ("sales", 1.0),
];

const TRAVEL_WORDS_ES: &[(&str, f64)] = &[
    ("viaje", 1.0),
    ("tours", 1.0),
    ("hotel", 1.0),
    ("hostal", 1.0),
    ("mapa", 1.0),
    ("guia", 1.0),
    ("que ver", 1.0),
    ("como ir", 1.0),
    ("turismo", 1.0),
    ("como llegar", 1.0),
    ("viajar", 1.0),
    ("museos", 1.0),
    ("atracciones", 1.0),
    ("aeropuertos", 1.0),
    ("tren", 1.0),
    ("restaurante", 1.0),
    ("playa", 1.0),
    ("vuelo", 1.0),
    ("low-cost", 1.0),
    ("transportes", 1.0),
    ("aventura", 1.0),
    ("temporada", 1.0),
    ("monumentos", 1.0),
    ("rutas", 1.0),
    ("vacaciones", 1.0),
    ("crucero", 1.0),
];

/// Names of the lexicons compiled into the binary
pub const BUILTIN_LEXICONS: &[&str] = &["buy", "travel"];

/// Lexicon loading and validation errors
#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("failed to read lexicon file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse lexicon file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("lexicon '{lexicon}': weight {weight} of '{word}' is outside [0, 1]")]
    InvalidWeight {
        lexicon: String,
        word: String,
        weight: f64,
    },

    #[error("lexicon '{0}' has no words")]
    Empty(String),

    #[error("unknown lexicon '{0}'")]
    Unknown(String),
}

/// On-disk lexicon format
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LexiconFile {
    name: String,
    #[serde(default = "default_language")]
    language: Language,
    words: BTreeMap<String, f64>,
}

fn default_language() -> Language {
    Language::Spanish
}

/// Words signalling an intention, keyed by stem
#[derive(Debug, Clone, PartialEq)]
pub struct IntentionLexicon {
    name: String,
    language: Language,
    weights: BTreeMap<String, f64>,
}

impl IntentionLexicon {
    /// Build a lexicon from plain words, stemming every key for `language`.
    ///
    /// Keys are lowercased and trimmed before stemming. When two words share
    /// a stem the larger weight is kept.
    pub fn from_words<I, S>(
        name: impl Into<String>,
        language: Language,
        words: I,
        normalizer: &TextNormalizer,
    ) -> Result<Self, LexiconError>
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let name = name.into();
        let words: Vec<(S, f64)> = words.into_iter().collect();

        for (word, weight) in &words {
            if !(0.0..=1.0).contains(weight) {
                return Err(LexiconError::InvalidWeight {
                    lexicon: name,
                    word: word.as_ref().to_string(),
                    weight: *weight,
                });
            }
        }
        if words.is_empty() {
            return Err(LexiconError::Empty(name));
        }

        Ok(Self::build(name, language, words, normalizer))
    }

    fn build<I, S>(name: String, language: Language, words: I, normalizer: &TextNormalizer) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut weights = BTreeMap::new();
        for (word, weight) in words {
            let key = normalizer.stem(word.as_ref().trim().to_lowercase().as_str(), language);
            let entry = weights.entry(key).or_insert(weight);
            if weight > *entry {
                *entry = weight;
            }
        }
        Self {
            name,
            language,
            weights,
        }
    }

    /// Spanish purchase-intention words
    pub fn buy(normalizer: &TextNormalizer) -> Self {
        Self::build(
            "buy".to_string(),
            Language::Spanish,
            BUY_WORDS_ES.iter().copied(),
            normalizer,
        )
    }

    /// Spanish travel-intention words
    pub fn travel(normalizer: &TextNormalizer) -> Self {
        Self::build(
            "travel".to_string(),
            Language::Spanish,
            TRAVEL_WORDS_ES.iter().copied(),
            normalizer,
        )
    }

    /// Built-in lexicon by name
    pub fn builtin(name: &str, normalizer: &TextNormalizer) -> Result<Self, LexiconError> {
        match name {
            "buy" => Ok(Self::buy(normalizer)),
            "travel" => Ok(Self::travel(normalizer)),
            other => Err(LexiconError::Unknown(other.to_string())),
        }
    }

    /// Load a lexicon from a TOML file
    pub fn load(path: &Path, normalizer: &TextNormalizer) -> Result<Self, LexiconError> {
        let content = std::fs::read_to_string(path).map_err(|source| LexiconError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: LexiconFile = toml::from_str(&content).map_err(|source| LexiconError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        let lexicon = Self::from_words(file.name, file.language, file.words, normalizer)?;
        debug!("Loaded lexicon '{}' ({} stems) from {:?}", lexicon.name, lexicon.len(), path);
        Ok(lexicon)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Language queries are normalized in before matching
    pub fn language(&self) -> Language {
        self.language
    }

    /// Weight of an already stemmed word
    pub fn weight(&self, stem: &str) -> Option<f64> {
        self.weights.get(stem).copied()
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.weights.contains_key(stem)
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// Built-in lexicons followed by every configured lexicon file
pub fn load_lexicons(
    paths: &[PathBuf],
    normalizer: &TextNormalizer,
) -> Result<Vec<IntentionLexicon>, LexiconError> {
    let mut lexicons = vec![
        IntentionLexicon::buy(normalizer),
        IntentionLexicon::travel(normalizer),
    ];
    for path in paths {
        lexicons.push(IntentionLexicon::load(path, normalizer)?);
    }
    Ok(lexicons)
}
