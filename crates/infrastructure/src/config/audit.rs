//! Audit sink configuration.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where audit records are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditBackend {
    /// Process memory, lost on restart
    #[default]
    Memory,
    /// SQLite database at `database_url`
    Sqlite,
}

impl fmt::Display for AuditBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Memory => write!(f, "memory"),
            Self::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Audit sink configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditAppConfig {
    #[serde(default)]
    pub backend: AuditBackend,

    /// sqlx database URL used by the SQLite backend
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Maximum pooled connections for the SQLite backend
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_url() -> String {
    "sqlite:tenantry-audit.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for AuditAppConfig {
    fn default() -> Self {
        Self {
            backend: AuditBackend::default(),
            database_url: default_database_url(),
            max_connections: default_max_connections(),
        }
    }
}
