use budget_guard_core::arn::RoleArn;
use budget_guard_core::resolver::OrganizationDirectory;

/// Exchanges a cross-account trust relationship for a short-lived session.
///
/// The session lives only as long as the invocation holding it and is never
/// cached or written anywhere.
pub trait RoleAssumer {
    type Session: OrganizationDirectory;

    fn assume_role(&self, role_arn: &RoleArn, session_name: &str) -> Result<Self::Session, String>;
}
