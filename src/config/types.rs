// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub presign: PresignConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    pub max_body_size: u64,
}

/// Storage configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    /// Page size used when a list request carries no `limit`
    #[serde(default = "default_list_limit")]
    pub default_list_limit: usize,
    #[serde(default)]
    pub tables: TableNames,
}

#[allow(clippy::missing_const_for_fn)]
fn default_list_limit() -> usize {
    50
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_list_limit: default_list_limit(),
            tables: TableNames::default(),
        }
    }
}

/// Backing table name per resource
///
/// Overridable per deployment, mirroring the original per-table environment
/// variables. The names only surface in log lines for this backend.
#[derive(Debug, Deserialize, Clone)]
pub struct TableNames {
    pub forms: String,
    pub cases: String,
    pub messages: String,
    pub appointments: String,
    pub services: String,
    pub files: String,
}

impl TableNames {
    /// Table name for a registry resource; unknown names pass through
    pub fn for_resource<'a>(&'a self, resource: &'a str) -> &'a str {
        match resource {
            "forms" => &self.forms,
            "cases" => &self.cases,
            "messages" => &self.messages,
            "appointments" => &self.appointments,
            "services" => &self.services,
            "files" => &self.files,
            other => other,
        }
    }
}

impl Default for TableNames {
    fn default() -> Self {
        Self {
            forms: "intake-forms".to_string(),
            cases: "intake-cases".to_string(),
            messages: "intake-messages".to_string(),
            appointments: "intake-appointments".to_string(),
            services: "intake-services".to_string(),
            files: "intake-files".to_string(),
        }
    }
}

/// Upload presign configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PresignConfig {
    pub secret: String,
    pub public_base_url: String,
    pub url_ttl_secs: i64,
}

impl Default for PresignConfig {
    fn default() -> Self {
        Self {
            secret: "dev-secret".to_string(),
            public_base_url: "http://127.0.0.1:8080/files".to_string(),
            url_ttl_secs: 900,
        }
    }
}

#[cfg(test)]
impl Config {
    /// Fixed configuration for unit tests, independent of files and env
    pub fn test_defaults() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                workers: None,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                access_log: false,
            },
            http: HttpConfig {
                max_body_size: 10_485_760,
            },
            storage: StorageConfig::default(),
            presign: PresignConfig::default(),
        }
    }
}
