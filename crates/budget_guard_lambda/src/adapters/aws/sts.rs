use std::time::SystemTime;

use aws_config::SdkConfig;
use aws_sdk_organizations::config::Credentials;
use aws_sdk_sts::error::DisplayErrorContext;
use budget_guard_core::arn::RoleArn;
use budget_guard_core::resolver::{OrganizationDirectory, Page};

use super::block_on_sdk;
use super::organizations::OrganizationsDirectory;
use crate::adapters::identity::RoleAssumer;

const PROVIDER_NAME: &str = "budget-guard-assume-role";

pub struct StsRoleAssumer {
    sts_client: aws_sdk_sts::Client,
    base_config: SdkConfig,
}

impl StsRoleAssumer {
    pub fn new(base_config: &SdkConfig) -> Self {
        Self {
            sts_client: aws_sdk_sts::Client::new(base_config),
            base_config: base_config.clone(),
        }
    }
}

/// Organizations access under assumed-role credentials. Held in memory only.
pub struct ScopedSession {
    directory: OrganizationsDirectory,
}

impl OrganizationDirectory for ScopedSession {
    fn list_child_ous(&self, parent_id: &str, next_token: Option<&str>) -> Result<Page, String> {
        self.directory.list_child_ous(parent_id, next_token)
    }

    fn list_accounts(&self, parent_id: &str, next_token: Option<&str>) -> Result<Page, String> {
        self.directory.list_accounts(parent_id, next_token)
    }
}

impl RoleAssumer for StsRoleAssumer {
    type Session = ScopedSession;

    fn assume_role(&self, role_arn: &RoleArn, session_name: &str) -> Result<ScopedSession, String> {
        let client = self.sts_client.clone();
        let role_arn = role_arn.as_str().to_string();
        let session_name = session_name.to_string();

        let output = block_on_sdk(async move {
            client
                .assume_role()
                .role_arn(role_arn)
                .role_session_name(session_name)
                .send()
                .await
        })
        .map_err(|error| format!("sts:AssumeRole failed: {}", DisplayErrorContext(&error)))?;

        let credentials = output
            .credentials()
            .ok_or_else(|| "sts:AssumeRole returned no credentials".to_string())?;
        let expires_at = SystemTime::try_from(*credentials.expiration()).ok();
        let scoped = Credentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            Some(credentials.session_token().to_string()),
            expires_at,
            PROVIDER_NAME,
        );

        let organizations_config = aws_sdk_organizations::config::Builder::from(&self.base_config)
            .credentials_provider(scoped)
            .build();
        Ok(ScopedSession {
            directory: OrganizationsDirectory::new(aws_sdk_organizations::Client::from_conf(
                organizations_config,
            )),
        })
    }
}
