use aws_sdk_organizations::error::DisplayErrorContext;
use budget_guard_core::resolver::{OrganizationDirectory, Page};

use super::block_on_sdk;
use crate::adapters::policy::{AttachStatus, PolicyAttacher};

#[derive(Clone)]
pub struct OrganizationsDirectory {
    client: aws_sdk_organizations::Client,
}

impl OrganizationsDirectory {
    pub fn new(client: aws_sdk_organizations::Client) -> Self {
        Self { client }
    }
}

impl OrganizationDirectory for OrganizationsDirectory {
    fn list_child_ous(&self, parent_id: &str, next_token: Option<&str>) -> Result<Page, String> {
        let client = self.client.clone();
        let parent_id = parent_id.to_string();
        let next_token = next_token.map(str::to_string);

        let output = block_on_sdk(async move {
            client
                .list_organizational_units_for_parent()
                .parent_id(parent_id)
                .set_next_token(next_token)
                .send()
                .await
        })
        .map_err(|error| {
            format!(
                "organizations:ListOrganizationalUnitsForParent failed: {}",
                DisplayErrorContext(&error)
            )
        })?;

        Ok(Page {
            ids: output
                .organizational_units()
                .iter()
                .filter_map(|unit| unit.id().map(str::to_string))
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }

    fn list_accounts(&self, parent_id: &str, next_token: Option<&str>) -> Result<Page, String> {
        let client = self.client.clone();
        let parent_id = parent_id.to_string();
        let next_token = next_token.map(str::to_string);

        let output = block_on_sdk(async move {
            client
                .list_accounts_for_parent()
                .parent_id(parent_id)
                .set_next_token(next_token)
                .send()
                .await
        })
        .map_err(|error| {
            format!(
                "organizations:ListAccountsForParent failed: {}",
                DisplayErrorContext(&error)
            )
        })?;

        Ok(Page {
            ids: output
                .accounts()
                .iter()
                .filter_map(|account| account.id().map(str::to_string))
                .collect(),
            next_token: output.next_token().map(str::to_string),
        })
    }
}

/// Attaches policies with the management account's own credentials.
#[derive(Clone)]
pub struct OrganizationsPolicyAttacher {
    client: aws_sdk_organizations::Client,
}

impl OrganizationsPolicyAttacher {
    pub fn new(client: aws_sdk_organizations::Client) -> Self {
        Self { client }
    }
}

impl PolicyAttacher for OrganizationsPolicyAttacher {
    fn attach_policy(&self, policy_id: &str, target_id: &str) -> Result<AttachStatus, String> {
        let client = self.client.clone();
        let policy_id = policy_id.to_string();
        let target_id = target_id.to_string();

        let result = block_on_sdk(async move {
            client
                .attach_policy()
                .policy_id(policy_id)
                .target_id(target_id)
                .send()
                .await
        });

        match result {
            Ok(_) => Ok(AttachStatus::Attached),
            Err(error)
                if error
                    .as_service_error()
                    .map(|service| service.is_duplicate_policy_attachment_exception())
                    .unwrap_or(false) =>
            {
                Ok(AttachStatus::AlreadyAttached)
            }
            Err(error) => Err(format!(
                "organizations:AttachPolicy failed: {}",
                DisplayErrorContext(&error)
            )),
        }
    }
}
