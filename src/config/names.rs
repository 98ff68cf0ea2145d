// ABOUTME: Bucket and table names used by the bootstrap stacks.
// ABOUTME: Derived from scope, client and region unless configured explicitly.

use serde::Deserialize;

use crate::error::Result;

use super::Config;

/// Explicit table names. Unset entries are derived.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TableNames {
    #[serde(default)]
    pub clients: Option<String>,
    #[serde(default)]
    pub portfolios: Option<String>,
    #[serde(default)]
    pub zones: Option<String>,
    #[serde(default)]
    pub apps: Option<String>,
    #[serde(default)]
    pub items: Option<String>,
    #[serde(default)]
    pub events: Option<String>,
}

/// Fully resolved names of the platform's storage resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceNames {
    pub automation_bucket: String,
    pub artefact_bucket: String,
    pub clients_table: String,
    pub portfolios_table: String,
    pub zones_table: String,
    pub apps_table: String,
    /// Per-client table.
    pub items_table: String,
    /// Per-client table.
    pub events_table: String,
}

impl ResourceNames {
    pub fn derive(config: &Config) -> Result<Self> {
        let client = config.client()?;
        let scope = config.scope.as_str();
        let bucket_region = config.bucket_region();
        let tables = &config.tables;

        let shared = |explicit: &Option<String>, name: &str| {
            explicit
                .clone()
                .unwrap_or_else(|| format!("{scope}core-automation-{name}"))
        };
        let per_client = |explicit: &Option<String>, name: &str| {
            explicit
                .clone()
                .unwrap_or_else(|| format!("{scope}{client}-core-automation-{name}"))
        };

        Ok(Self {
            automation_bucket: config
                .bucket_name
                .clone()
                .unwrap_or_else(|| format!("{scope}{client}-core-automation-{bucket_region}")),
            artefact_bucket: config.artefact_bucket_name.clone().unwrap_or_else(|| {
                format!("{scope}{client}-core-automation-artefacts-{bucket_region}")
            }),
            clients_table: shared(&tables.clients, "clients"),
            portfolios_table: shared(&tables.portfolios, "portfolios"),
            zones_table: shared(&tables.zones, "zones"),
            apps_table: shared(&tables.apps, "apps"),
            items_table: per_client(&tables.items, "items"),
            events_table: per_client(&tables.events, "events"),
        })
    }
}
