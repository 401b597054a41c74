//! Server configuration, read from command line flags or the environment.

use std::{
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use clap::{Parser, ValueEnum};
use rusqlite::Connection;

use crate::{
    AppState, Database, Error, JsonServerTransactions, LocalBackend, LocalStorage, Queries,
    StorageService, SupabaseAuth, SupabaseStorage, SupabaseTransactions, initialize_db,
};

/// Which backend serves users, transactions and files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// The hosted Supabase project.
    Supabase,
    /// A SQLite database and a directory on disk.
    Local,
    /// Transactions from a JSON mock server, everything else local.
    Mock,
}

/// The REST API server for bytebank.
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Config {
    /// The backend to use.
    #[arg(long, env = "BYTEBANK_BACKEND", value_enum, default_value_t = BackendKind::Local)]
    pub backend: BackendKind,

    /// The URL of the Supabase project, e.g. "https://xyz.supabase.co".
    #[arg(long, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// The anonymous (public) API key of the Supabase project.
    #[arg(long, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_anon_key: Option<String>,

    /// File path to the SQLite database of the local backend.
    #[arg(long, env = "BYTEBANK_DB_PATH", default_value = "bytebank.db")]
    pub db_path: PathBuf,

    /// Directory the local backend stores attachments in.
    #[arg(long, env = "BYTEBANK_STORAGE_DIR", default_value = "storage")]
    pub storage_dir: PathBuf,

    /// The URL of the JSON mock server, e.g. "http://localhost:3001".
    #[arg(long, env = "MOCK_API_URL")]
    pub mock_api_url: Option<String>,

    /// The storage bucket for attachments.
    #[arg(long, env = "ATTACHMENTS_BUCKET", default_value = "attachments")]
    pub attachments_bucket: String,

    /// The secret the cookie key is derived from.
    #[arg(long, env = "SECRET", hide_env_values = true)]
    pub secret: String,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Where password recovery links should send the user.
    #[arg(long, env = "PASSWORD_RESET_REDIRECT_URL")]
    pub password_reset_redirect_url: Option<String>,

    /// File path for the debug log.
    #[arg(long, env = "LOG_PATH", default_value = "debug.log")]
    pub log_path: PathBuf,
}

/// A checked backend configuration, see [Config::backend].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// Use the hosted Supabase project.
    Supabase {
        /// The project URL.
        url: String,
        /// The project's anonymous API key.
        anon_key: String,
    },
    /// Use a SQLite database and a directory on disk.
    Local {
        /// The SQLite database file.
        db_path: PathBuf,
        /// The attachments directory.
        storage_dir: PathBuf,
    },
    /// Like [BackendConfig::Local], but transactions come from a JSON mock server.
    Mock {
        /// The mock server URL.
        api_url: String,
        /// The SQLite database file for users and sessions.
        db_path: PathBuf,
        /// The attachments directory.
        storage_dir: PathBuf,
    },
}

fn require(value: &Option<String>, name: &str, backend: &str) -> Result<String, Error> {
    match value.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(value.to_owned()),
        _ => Err(Error::InvalidConfig(format!(
            "{name} must be set to use the {backend} backend"
        ))),
    }
}

impl Config {
    /// Check that the settings needed by the chosen backend are present.
    ///
    /// # Errors
    /// Returns [Error::InvalidConfig] naming the first missing setting.
    pub fn backend(&self) -> Result<BackendConfig, Error> {
        match self.backend {
            BackendKind::Supabase => Ok(BackendConfig::Supabase {
                url: require(&self.supabase_url, "SUPABASE_URL", "supabase")?,
                anon_key: require(&self.supabase_anon_key, "SUPABASE_ANON_KEY", "supabase")?,
            }),
            BackendKind::Local => Ok(BackendConfig::Local {
                db_path: self.db_path.clone(),
                storage_dir: self.storage_dir.clone(),
            }),
            BackendKind::Mock => Ok(BackendConfig::Mock {
                api_url: require(&self.mock_api_url, "MOCK_API_URL", "mock")?,
                db_path: self.db_path.clone(),
                storage_dir: self.storage_dir.clone(),
            }),
        }
    }

    /// Connect to the configured backend and build the server state.
    ///
    /// # Errors
    /// Returns an error if the configuration is incomplete or the local
    /// database cannot be opened.
    pub fn app_state(&self) -> Result<AppState, Error> {
        let (queries, storage) = match self.backend()? {
            BackendConfig::Supabase { url, anon_key } => {
                tracing::info!("Using the Supabase backend at {url}");
                let database = Database::connect(&url, &anon_key)?;
                let queries = Queries {
                    auth: Arc::new(SupabaseAuth::new(&database)),
                    transactions: Arc::new(SupabaseTransactions::new(database.clone())),
                };
                let storage = SupabaseStorage::new(&database);

                (queries, StorageService::new(Arc::new(storage), &self.attachments_bucket))
            }
            BackendConfig::Local {
                db_path,
                storage_dir,
            } => {
                tracing::info!("Using the local backend at {}", db_path.display());
                let backend = open_local_backend(&db_path)?;
                let storage = LocalStorage::new(storage_dir);

                (
                    Queries::local(backend),
                    StorageService::new(Arc::new(storage), &self.attachments_bucket),
                )
            }
            BackendConfig::Mock {
                api_url,
                db_path,
                storage_dir,
            } => {
                tracing::info!("Using transactions from the mock server at {api_url}");
                let backend = open_local_backend(&db_path)?;
                let queries = Queries {
                    auth: Arc::new(backend),
                    transactions: Arc::new(JsonServerTransactions::new(&api_url)),
                };
                let storage = LocalStorage::new(storage_dir);

                (queries, StorageService::new(Arc::new(storage), &self.attachments_bucket))
            }
        };

        Ok(AppState::new(
            &self.secret,
            queries,
            storage,
            self.password_reset_redirect_url.clone(),
        ))
    }
}

fn open_local_backend(db_path: &Path) -> Result<LocalBackend, Error> {
    let connection = Connection::open(db_path)?;
    initialize_db(&connection)?;

    Ok(LocalBackend::new(Arc::new(Mutex::new(connection))))
}
