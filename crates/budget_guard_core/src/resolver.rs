//! Locating the organizational unit that directly contains an account.
//!
//! Organizations only expose containment by listing, so resolution walks the
//! tree breadth-first from the root and pages through each OU's accounts.
//! Cost is O(OUs x accounts per OU); it runs once per budget breach.

use std::collections::{HashSet, VecDeque};

use tracing::Span;

use crate::error::{GuardrailError, Stage, ValidationError};

/// One page of identifiers returned by a directory listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page {
    pub ids: Vec<String>,
    pub next_token: Option<String>,
}

/// Read-only view of the organization hierarchy.
pub trait OrganizationDirectory {
    fn list_child_ous(&self, parent_id: &str, next_token: Option<&str>) -> Result<Page, String>;

    fn list_accounts(&self, parent_id: &str, next_token: Option<&str>) -> Result<Page, String>;
}

pub struct OuResolver<'a, D: ?Sized> {
    directory: &'a D,
    span: Span,
}

impl<'a, D> OuResolver<'a, D>
where
    D: OrganizationDirectory + ?Sized,
{
    pub fn new(directory: &'a D, span: Span) -> Self {
        Self { directory, span }
    }

    /// Return the OU under `root_id` that directly contains `account_id`.
    ///
    /// Accounts placed directly under the root, or moved away while the walk
    /// is in progress, resolve to [`GuardrailError::NotFound`].
    pub fn resolve(&self, account_id: &str, root_id: &str) -> Result<String, GuardrailError> {
        if account_id.trim().is_empty() {
            return Err(ValidationError::new("account_id is required").at(Stage::Resolve));
        }
        if root_id.trim().is_empty() {
            return Err(ValidationError::new("root_id is required").at(Stage::Resolve));
        }

        let mut visited = HashSet::from([root_id.to_string()]);
        let mut pending: VecDeque<String> = self.child_ous(root_id)?.into();
        let mut ous_scanned = 0usize;

        while let Some(ou_id) = pending.pop_front() {
            if !visited.insert(ou_id.clone()) {
                continue;
            }
            ous_scanned += 1;

            if self.contains_account(&ou_id, account_id)? {
                tracing::info!(
                    parent: &self.span,
                    component = "ou_resolver",
                    account_id,
                    root_id,
                    ou_id = %ou_id,
                    ous_scanned,
                    "ou_resolved"
                );
                return Ok(ou_id);
            }
            pending.extend(self.child_ous(&ou_id)?);
        }

        tracing::warn!(
            parent: &self.span,
            component = "ou_resolver",
            account_id,
            root_id,
            ous_scanned,
            "ou_not_found"
        );
        Err(GuardrailError::NotFound {
            account_id: account_id.to_string(),
            root_id: root_id.to_string(),
        })
    }

    fn child_ous(&self, parent_id: &str) -> Result<Vec<String>, GuardrailError> {
        let mut ids = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .directory
                .list_child_ous(parent_id, next_token.as_deref())
                .map_err(|message| directory_error(parent_id, message))?;
            ids.extend(page.ids);
            next_token = continuation(page.next_token);
            if next_token.is_none() {
                return Ok(ids);
            }
        }
    }

    fn contains_account(&self, ou_id: &str, account_id: &str) -> Result<bool, GuardrailError> {
        let mut next_token: Option<String> = None;
        loop {
            let page = self
                .directory
                .list_accounts(ou_id, next_token.as_deref())
                .map_err(|message| directory_error(ou_id, message))?;
            if page.ids.iter().any(|id| id == account_id) {
                return Ok(true);
            }
            next_token = continuation(page.next_token);
            if next_token.is_none() {
                return Ok(false);
            }
        }
    }
}

fn continuation(token: Option<String>) -> Option<String> {
    token.filter(|value| !value.is_empty())
}

fn directory_error(parent_id: &str, message: String) -> GuardrailError {
    GuardrailError::Directory {
        parent_id: parent_id.to_string(),
        message,
    }
}
