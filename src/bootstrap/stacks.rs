// ABOUTME: The platform stacks deployed by the bootstrap wizard.
// ABOUTME: Builds names, templates, parameters and tags for roles, database and storage.

use std::collections::BTreeMap;

use crate::config::{Config, ResourceNames};
use crate::stack::{DeployError, StackDeploymentRequest};

pub const PORTFOLIO: &str = "core";
pub const BRANCH: &str = "main";
pub const ENVIRONMENT: &str = "prod";

pub const ROLES_TEMPLATE: &str = "core-roles.yaml";
pub const STORAGE_TEMPLATE: &str = "core-storage.yaml";
pub const DB_FACTS_TEMPLATE: &str = "core-automation-db-facts.yaml";
pub const DB_ITEMS_TEMPLATE: &str = "core-automation-db-items.yaml";

/// Who the platform stacks are deployed for.
#[derive(Debug, Clone, Copy)]
pub struct Owner<'a> {
    pub client: &'a str,
    pub scope: &'a str,
}

/// Standard tags for a platform stack of the given app.
pub fn stack_tags(owner: Owner<'_>, app: &str) -> BTreeMap<String, String> {
    [
        ("Client", owner.client),
        ("Scope", owner.scope),
        ("Portfolio", PORTFOLIO),
        ("App", app),
        ("Branch", BRANCH),
        ("Build", env!("CARGO_PKG_VERSION")),
        ("Environment", ENVIRONMENT),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

fn platform_stack(
    config: &Config,
    owner: Owner<'_>,
    app: &str,
    stack_name: &str,
    template: &str,
    region: &str,
    parameters: &[(&str, &str)],
) -> Result<StackDeploymentRequest, DeployError> {
    let tags = stack_tags(owner, app);
    StackDeploymentRequest::new(stack_name, config.template_path(template), region).map(|r| {
        r.parameters(parameters.iter().copied())
            // The templates declare the tags as parameters too.
            .parameters(tags.clone())
            .tags(tags)
    })
}

/// IAM roles for the API and pipelines, in the master region.
pub fn roles_stack(
    config: &Config,
    owner: Owner<'_>,
    names: &ResourceNames,
) -> Result<StackDeploymentRequest, DeployError> {
    platform_stack(
        config,
        owner,
        "roles",
        &format!("{}core-automation-roles", owner.scope),
        ROLES_TEMPLATE,
        &config.region,
        &[
            ("ClientsTableName", names.clients_table.as_str()),
            ("ZonesTableName", names.zones_table.as_str()),
            ("PortfoliosTableName", names.portfolios_table.as_str()),
            ("AppsTableName", names.apps_table.as_str()),
            ("BucketName", names.automation_bucket.as_str()),
            ("ArtefactBucketName", names.artefact_bucket.as_str()),
        ],
    )
}

/// The shared facts tables, in the DynamoDB region.
pub fn db_facts_stack(
    config: &Config,
    owner: Owner<'_>,
    names: &ResourceNames,
) -> Result<StackDeploymentRequest, DeployError> {
    platform_stack(
        config,
        owner,
        "facts",
        &format!("{}core-automation-db-facts", owner.scope),
        DB_FACTS_TEMPLATE,
        config.dynamodb_region(),
        &[
            ("ClientsTableName", names.clients_table.as_str()),
            ("PortfoliosTableName", names.portfolios_table.as_str()),
            ("AppsTableName", names.apps_table.as_str()),
            ("ZonesTableName", names.zones_table.as_str()),
        ],
    )
}

/// The per-client deployment items and events tables, in the DynamoDB region.
pub fn db_items_stack(
    config: &Config,
    owner: Owner<'_>,
    names: &ResourceNames,
) -> Result<StackDeploymentRequest, DeployError> {
    platform_stack(
        config,
        owner,
        "db",
        &format!("{}{}-core-automation-db-items", owner.scope, owner.client),
        DB_ITEMS_TEMPLATE,
        config.dynamodb_region(),
        &[
            ("ItemTableName", names.items_table.as_str()),
            ("EventTableName", names.events_table.as_str()),
        ],
    )
}

/// The packages and artefacts buckets, in the bucket region.
pub fn storage_stack(
    config: &Config,
    owner: Owner<'_>,
    names: &ResourceNames,
    organization_id: &str,
) -> Result<StackDeploymentRequest, DeployError> {
    platform_stack(
        config,
        owner,
        "storage",
        &format!("{}core-automation-storage", owner.scope),
        STORAGE_TEMPLATE,
        config.bucket_region(),
        &[
            ("OrganizationId", organization_id),
            ("AutomationBucketName", names.automation_bucket.as_str()),
            ("ArtefactsBucketName", names.artefact_bucket.as_str()),
        ],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            client: Some("acme".to_string()),
            region: "ap-southeast-1".to_string(),
            bucket_region: Some("us-west-2".to_string()),
            dynamodb_region: Some("eu-west-1".to_string()),
            ..Config::default()
        }
    }

    const OWNER: Owner<'static> = Owner {
        client: "acme",
        scope: "",
    };

    #[test]
    fn tags_carry_platform_identity() {
        let tags = stack_tags(OWNER, "roles");
        assert_eq!(tags["Client"], "acme");
        assert_eq!(tags["Scope"], "");
        assert_eq!(tags["Portfolio"], "core");
        assert_eq!(tags["App"], "roles");
        assert_eq!(tags["Build"], env!("CARGO_PKG_VERSION"));
        assert_eq!(tags.len(), 7);
    }

    #[test]
    fn roles_stack_in_master_region_with_tags_as_parameters() {
        let config = config();
        let names = config.resource_names().unwrap();
        let request = roles_stack(&config, OWNER, &names).unwrap();

        assert_eq!(request.stack_name.as_str(), "core-automation-roles");
        assert_eq!(request.region, "ap-southeast-1");
        assert_eq!(request.template, config.templates_dir.join(ROLES_TEMPLATE));
        assert_eq!(
            request.parameters["BucketName"],
            "acme-core-automation-us-west-2"
        );
        assert_eq!(request.parameters["App"], "roles");
        assert_eq!(request.tags["Environment"], "prod");
    }

    #[test]
    fn database_stacks_use_dynamodb_region() {
        let config = config();
        let names = config.resource_names().unwrap();
        let owner = Owner {
            client: "acme",
            scope: "dev-",
        };

        let facts = db_facts_stack(&config, owner, &names).unwrap();
        let items = db_items_stack(&config, owner, &names).unwrap();

        assert_eq!(facts.stack_name.as_str(), "dev-core-automation-db-facts");
        assert_eq!(items.stack_name.as_str(), "dev-acme-core-automation-db-items");
        assert_eq!(facts.region, "eu-west-1");
        assert_eq!(items.parameters["ItemTableName"], "acme-core-automation-items");
        assert_eq!(items.tags["App"], "db");
    }

    #[test]
    fn storage_stack_uses_bucket_region() {
        let config = config();
        let names = config.resource_names().unwrap();
        let request = storage_stack(&config, OWNER, &names, "o-abc123").unwrap();

        assert_eq!(request.region, "us-west-2");
        assert_eq!(request.parameters["OrganizationId"], "o-abc123");
        assert_eq!(request.tags["App"], "storage");
    }
}
