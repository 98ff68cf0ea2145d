// ABOUTME: Memoized assume-role credentials for the automation account.
// ABOUTME: The first successful assume-role result is reused for the rest of the process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snafu::{ResultExt, Snafu};
use tokio::sync::OnceCell;

use crate::provider::ProviderError;

/// Temporary credentials returned by STS.
#[derive(Clone)]
pub struct AssumedCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for AssumedCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssumedCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Something that can exchange the ambient credentials for a role's.
#[async_trait]
pub trait RoleAssumer: Send + Sync {
    async fn assume_role(
        &self,
        role_arn: &str,
        session_name: &str,
    ) -> Result<AssumedCredentials, ProviderError>;
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CredentialError {
    #[snafu(display("failed to assume role {role_arn}: {source}"))]
    AssumeRole {
        role_arn: String,
        source: ProviderError,
    },
}

/// Hands out credentials for the automation role, assuming it at most once.
pub struct CredentialProvider<A> {
    assumer: A,
    role_arn: String,
    session_name: String,
    cache: OnceCell<AssumedCredentials>,
}

impl<A: RoleAssumer> CredentialProvider<A> {
    pub fn new(assumer: A, role_arn: impl Into<String>) -> Self {
        Self {
            assumer,
            role_arn: role_arn.into(),
            session_name: default_session_name(),
            cache: OnceCell::new(),
        }
    }

    /// Override the STS session name (defaults to `coreauto-<hostname>`).
    pub fn session_name(mut self, name: impl Into<String>) -> Self {
        self.session_name = name.into();
        self
    }

    pub fn role_arn(&self) -> &str {
        &self.role_arn
    }

    /// Return cached credentials, assuming the role on first use.
    ///
    /// A failed attempt is not cached; the next call tries again.
    pub async fn get_or_assume(&self) -> Result<&AssumedCredentials, CredentialError> {
        self.cache
            .get_or_try_init(|| async {
                tracing::debug!("Assuming role {}", self.role_arn);
                self.assumer
                    .assume_role(&self.role_arn, &self.session_name)
                    .await
                    .context(AssumeRoleSnafu {
                        role_arn: self.role_arn.clone(),
                    })
            })
            .await
    }
}

/// STS session names allow `[\w+=,.@-]`; hostnames may carry other characters.
fn default_session_name() -> String {
    let host = gethostname::gethostname().to_string_lossy().into_owned();
    let host: String = host
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect();
    let mut name = format!("coreauto-{}", host);
    name.truncate(64);
    name
}
