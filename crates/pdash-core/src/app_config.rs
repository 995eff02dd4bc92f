use std::net::SocketAddr;
use std::path::PathBuf;

/// Reference chunk size for batched product upserts.
pub const DEFAULT_INGEST_BATCH_SIZE: usize = 500;

/// Upper bound on the chunk size. Each product binds twelve parameters and
/// Postgres caps a single statement at 65 535 binds.
pub const MAX_INGEST_BATCH_SIZE: usize = 5000;

/// Upload cap enforced by the HTTP boundary (50 MiB).
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 50 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// TLS settings for the database connection.
#[derive(Clone, PartialEq, Eq)]
pub enum DbSsl {
    /// Leave TLS negotiation to whatever `DATABASE_URL` specifies.
    Disabled,
    Required {
        /// Verify the server certificate chain and hostname.
        verify: bool,
        ca_path: Option<PathBuf>,
        /// Inline PEM bundle, used when no `ca_path` is configured.
        ca_pem: Option<String>,
    },
}

impl std::fmt::Debug for DbSsl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DbSsl::Disabled => write!(f, "Disabled"),
            DbSsl::Required {
                verify,
                ca_path,
                ca_pem,
            } => f
                .debug_struct("Required")
                .field("verify", verify)
                .field("ca_path", ca_path)
                .field("ca_pem", &ca_pem.as_ref().map(|_| "[pem]"))
                .finish(),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub db_ssl: DbSsl,
    pub ingest_batch_size: usize,
    pub upload_max_bytes: usize,
    /// Bearer tokens accepted by the HTTP API. Empty means none configured.
    pub api_keys: Vec<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("db_ssl", &self.db_ssl)
            .field("ingest_batch_size", &self.ingest_batch_size)
            .field("upload_max_bytes", &self.upload_max_bytes)
            .field("api_keys", &format_args!("[{} redacted]", self.api_keys.len()))
            .finish()
    }
}
