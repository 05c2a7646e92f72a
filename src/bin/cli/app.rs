use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};

use cogni_lib::ai::OpenAiClient;
use cogni_lib::flashcards::SqliteRepository;
use cogni_lib::{AppConfig, StudyLab};

/// Shared application state for CLI commands
pub struct App {
    pub lab: StudyLab<SqliteRepository, OpenAiClient>,
    pub db_path: PathBuf,
}

impl App {
    /// Load config, open the card store and build the API client
    pub fn new(config_path: Option<&Path>, db_path: Option<&Path>) -> Result<Self> {
        let config = AppConfig::load(config_path).context("Failed to load configuration")?;

        let db_path = match db_path {
            Some(p) => p.to_path_buf(),
            None => config
                .database_path()
                .context("Failed to get data directory")?,
        };
        let repo = SqliteRepository::open(&db_path)
            .with_context(|| format!("Failed to open database at {}", db_path.display()))?;

        let client = OpenAiClient::from_config(&config).context("Failed to create API client")?;
        if !client.has_credentials() {
            log::debug!("No API key configured; synthesis, solve and imagine are unavailable");
        }

        Ok(Self {
            lab: StudyLab::new(repo, client, config),
            db_path,
        })
    }

    pub fn config(&self) -> &AppConfig {
        self.lab.config()
    }

    pub fn client(&self) -> &OpenAiClient {
        self.lab.provider()
    }

    /// The local calendar day reviews are scheduled against
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
