//! Client configuration
//!
//! Identity of the target service instance, the application principal used
//! to authenticate, and client tuning. Loaded from TOML or built in code.
//!
//! ```toml
//! instance_name = "orders-prod"
//! tenant_id = "00000000-0000-0000-0000-000000000001"
//! subscription_id = "00000000-0000-0000-0000-000000000002"
//! database_name = "Orders"
//! app_id = "00000000-0000-0000-0000-000000000003"
//! app_secret = "..."
//! create_database_if_not_exists = true
//!
//! # Optional tuning
//! # page_size = 100
//! # max_batch_concurrency = 8
//! # default_group_field = "Name"
//! ```

use crate::error::{Error, Result};
use crate::table::is_identifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Largest page the client will request
pub const MAX_PAGE_SIZE: usize = 1000;

fn default_page_size() -> usize {
    100
}

fn default_max_batch_concurrency() -> usize {
    8
}

fn default_group_field() -> String {
    "Name".to_string()
}

/// Connection and tuning configuration
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Name of the database account/instance
    pub instance_name: String,
    /// Directory tenant of the application principal
    pub tenant_id: String,
    /// Subscription owning the instance
    pub subscription_id: String,
    /// Database holding the tables
    pub database_name: String,
    /// Application (client) id
    pub app_id: String,
    /// Application secret
    pub app_secret: String,
    /// Provision the database on connect when it does not exist
    #[serde(default)]
    pub create_database_if_not_exists: bool,
    /// Maximum documents requested per query page
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Maximum in-flight writes during batch upsert/delete
    #[serde(default = "default_max_batch_concurrency")]
    pub max_batch_concurrency: usize,
    /// Field used for partition-scoped counts on tables without a partition field
    #[serde(default = "default_group_field")]
    pub default_group_field: String,
}

impl StorageConfig {
    /// Configuration with the given identity and default tuning.
    pub fn new(
        instance_name: impl Into<String>,
        subscription_id: impl Into<String>,
        database_name: impl Into<String>,
        principal: ServicePrincipal,
    ) -> Self {
        StorageConfig {
            instance_name: instance_name.into(),
            tenant_id: principal.tenant_id,
            subscription_id: subscription_id.into(),
            database_name: database_name.into(),
            app_id: principal.app_id,
            app_secret: principal.app_secret,
            create_database_if_not_exists: false,
            page_size: default_page_size(),
            max_batch_concurrency: default_max_batch_concurrency(),
            default_group_field: default_group_field(),
        }
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: StorageConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content).map_err(|e| match e {
            Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    /// Serialize to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize configuration: {}", e)))
    }

    /// Check that identity fields are present and tuning is in range.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("instance_name", &self.instance_name),
            ("tenant_id", &self.tenant_id),
            ("subscription_id", &self.subscription_id),
            ("database_name", &self.database_name),
            ("app_id", &self.app_id),
            ("app_secret", &self.app_secret),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Config(format!("{} must not be empty", name)));
            }
        }
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(Error::Config(format!(
                "page_size must be between 1 and {}, got {}",
                MAX_PAGE_SIZE, self.page_size
            )));
        }
        if self.max_batch_concurrency == 0 {
            return Err(Error::Config("max_batch_concurrency must be at least 1".into()));
        }
        if !is_identifier(&self.default_group_field) {
            return Err(Error::Config(format!(
                "default_group_field '{}' is not a plain field name",
                self.default_group_field
            )));
        }
        Ok(())
    }

    /// The principal presented to the service
    pub fn principal(&self) -> ServicePrincipal {
        ServicePrincipal {
            tenant_id: self.tenant_id.clone(),
            app_id: self.app_id.clone(),
            app_secret: self.app_secret.clone(),
        }
    }
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("instance_name", &self.instance_name)
            .field("tenant_id", &self.tenant_id)
            .field("subscription_id", &self.subscription_id)
            .field("database_name", &self.database_name)
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .field(
                "create_database_if_not_exists",
                &self.create_database_if_not_exists,
            )
            .field("page_size", &self.page_size)
            .field("max_batch_concurrency", &self.max_batch_concurrency)
            .field("default_group_field", &self.default_group_field)
            .finish()
    }
}

/// Application credential presented to the document service
#[derive(Clone, PartialEq, Eq)]
pub struct ServicePrincipal {
    /// Directory tenant
    pub tenant_id: String,
    /// Application id
    pub app_id: String,
    /// Application secret
    pub app_secret: String,
}

impl ServicePrincipal {
    /// Build a principal
    pub fn new(
        tenant_id: impl Into<String>,
        app_id: impl Into<String>,
        app_secret: impl Into<String>,
    ) -> Self {
        ServicePrincipal {
            tenant_id: tenant_id.into(),
            app_id: app_id.into(),
            app_secret: app_secret.into(),
        }
    }
}

impl fmt::Debug for ServicePrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServicePrincipal")
            .field("tenant_id", &self.tenant_id)
            .field("app_id", &self.app_id)
            .field("app_secret", &"<redacted>")
            .finish()
    }
}
