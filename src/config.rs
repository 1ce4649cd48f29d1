use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::quiz::{ContentKind, ContentSource};

pub const VOCABULARY_SOURCE_VAR: &str = "QUIZ_VOCABULARY_SOURCE";
pub const GRAMMAR_SOURCE_VAR: &str = "QUIZ_GRAMMAR_SOURCE";
pub const TIME_LIMIT_VAR: &str = "QUIZ_TIME_LIMIT_SECS";
pub const REFRESH_TIMEOUT_VAR: &str = "QUIZ_REFRESH_TIMEOUT_SECS";
pub const DATA_DIR_VAR: &str = "QUIZ_DATA_DIR";

const DEFAULT_TIME_LIMIT_SECS: u64 = 15;
const DEFAULT_REFRESH_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a whole number of seconds, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub vocabulary_source: ContentSource,
    pub grammar_source: ContentSource,
    /// `None` turns the per-question timer off.
    pub question_time_limit: Option<Duration>,
    pub refresh_timeout: Duration,
    pub data_dir: PathBuf,
}

impl Config {
    /// Reads the process environment. Call `dotenv` first to pick up a `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var: &str| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let seconds = |var: &'static str, default: u64| -> Result<u64, ConfigError> {
            match lookup(var) {
                Some(value) => value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber { var, value }),
                None => Ok(default),
            }
        };

        let time_limit = seconds(TIME_LIMIT_VAR, DEFAULT_TIME_LIMIT_SECS)?;
        let refresh_timeout = seconds(REFRESH_TIMEOUT_VAR, DEFAULT_REFRESH_TIMEOUT_SECS)?;

        Ok(Self {
            vocabulary_source: ContentSource::new(
                lookup(VOCABULARY_SOURCE_VAR).unwrap_or_else(|| "data/vocabulary.csv".to_string()),
                ContentKind::Vocabulary,
            ),
            grammar_source: ContentSource::new(
                lookup(GRAMMAR_SOURCE_VAR).unwrap_or_else(|| "data/grammar.csv".to_string()),
                ContentKind::Grammar,
            ),
            question_time_limit: (time_limit > 0).then(|| Duration::from_secs(time_limit)),
            refresh_timeout: Duration::from_secs(refresh_timeout),
            data_dir: lookup(DATA_DIR_VAR)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(".")),
        })
    }

    pub fn source(&self, kind: ContentKind) -> &ContentSource {
        match kind {
            ContentKind::Vocabulary => &self.vocabulary_source,
            ContentKind::Grammar => &self.grammar_source,
        }
    }

    pub fn weak_items_path(&self) -> PathBuf {
        self.data_dir.join("weak_items.json")
    }

    pub fn dialogue_db_path(&self) -> PathBuf {
        self.data_dir.join("dialogues.sqlite")
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.vocabulary_source.name, "data/vocabulary.csv");
        assert_eq!(config.grammar_source.kind, ContentKind::Grammar);
        assert_eq!(config.question_time_limit, Some(Duration::from_secs(15)));
        assert_eq!(config.refresh_timeout, Duration::from_secs(10));
        assert_eq!(config.weak_items_path(), PathBuf::from("./weak_items.json"));
    }

    #[test]
    fn zero_time_limit_disables_timer() {
        let config = Config::from_lookup(lookup(&[
            (TIME_LIMIT_VAR, "0"),
            (VOCABULARY_SOURCE_VAR, "https://example.com/words.csv"),
            (DATA_DIR_VAR, "/var/lib/quiz"),
        ]))
        .unwrap();
        assert_eq!(config.question_time_limit, None);
        assert!(config.source(ContentKind::Vocabulary).is_remote());
        assert_eq!(config.dialogue_db_path(), PathBuf::from("/var/lib/quiz/dialogues.sqlite"));
    }

    #[test]
    fn rejects_non_numeric_seconds() {
        let result = Config::from_lookup(lookup(&[(REFRESH_TIMEOUT_VAR, "soon")]));
        assert_eq!(
            result.unwrap_err(),
            ConfigError::InvalidNumber {
                var: REFRESH_TIMEOUT_VAR,
                value: "soon".to_string()
            }
        );
    }
}
