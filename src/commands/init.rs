use anyhow::{Context, Result};
use interest_miner::config::Config;
use std::path::Path;

pub fn init_config(path: &Path) -> Result<()> {
    let config = Config::default();
    let config_path = path.join("interest-miner.toml");

    if config_path.exists() {
        anyhow::bail!("{} already exists", config_path.display());
    }

    let toml_content = format!(
        r#"# interest-miner configuration

[storage]
# "sled" (persistent) or "memory"
backend = "sled"
data_dir = "{}"

[text]
max_word_length = {}
# Page keyword tables are stored unstemmed unless enabled
stem_page_keywords = {}
extra_stopwords = []

[aggregation]
# Seconds between passes for `aggregate --watch`
interval_secs = {}

[intention]
window_days = {}
# Extra lexicons: TOML files with `name`, optional `language` and a [words] table
lexicon_paths = []

[categorization.domains]
# "elpais.com" = ["News/Media"]

[logging]
# "text" or "json"
format = "text"
level = "{}"
"#,
        config.storage.data_dir.display(),
        config.text.max_word_length,
        config.text.stem_page_keywords,
        config.aggregation.interval_secs,
        config.intention.window_days,
        config.logging.level,
    );

    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    std::fs::write(&config_path, toml_content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created configuration file: {}", config_path.display());

    // Written file must load back
    Config::load(&config_path)?;

    Ok(())
}
