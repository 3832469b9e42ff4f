use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::Result;
use crate::scrapers::Selectors;

pub const DEFAULT_CONCURRENCY: usize = 6;
pub const CONFIG_ENV_PREFIX: &str = "CLASSROOM_INGEST";
pub const CONFIG_PATH_ENV: &str = "CLASSROOM_INGEST_CONFIG";

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/108.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed page for a live run.
    pub url: Option<String>,
    pub selectors: SelectorConfig,
    /// Extra headers sent with every request.
    pub headers: HashMap<String, String>,
    pub user_agent: String,
    /// Max in-flight detail page requests.
    pub concurrency: usize,
    pub timeout_seconds: u64,
    /// Overall budget for the detail page phase; unfinished pages are skipped.
    pub detail_deadline_seconds: Option<u64>,
    pub follow_links: bool,
    pub database_path: PathBuf,
    pub output_path: Option<PathBuf>,
}

/// Optional CSS selectors overriding the extraction heuristics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub row: Option<String>,
    pub name: Option<String>,
    pub class: Option<String>,
    pub grade: Option<String>,
    pub email: Option<String>,
    pub age: Option<String>,
    pub link: Option<String>,
}

impl SelectorConfig {
    pub fn compile(&self) -> Result<Selectors> {
        Selectors::compile(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            url: None,
            selectors: SelectorConfig::default(),
            headers: HashMap::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            concurrency: DEFAULT_CONCURRENCY,
            timeout_seconds: 25,
            detail_deadline_seconds: None,
            follow_links: true,
            database_path: PathBuf::from("classroom.db"),
            output_path: None,
        }
    }
}

impl Config {
    /// Defaults, then an optional `classroom_ingest.*` file (or `$CLASSROOM_INGEST_CONFIG`),
    /// then `CLASSROOM_INGEST__*` environment variables.
    pub fn load() -> Result<Self> {
        let file = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "classroom_ingest".to_string());

        let config: Config = ::config::Config::builder()
            .add_source(::config::File::with_name(&file).required(false))
            .add_source(
                ::config::Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config.sanitized())
    }

    fn sanitized(mut self) -> Self {
        if self.concurrency == 0 {
            self.concurrency = DEFAULT_CONCURRENCY;
        }
        self
    }
}
