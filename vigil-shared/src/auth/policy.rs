/// Role-based permission policy
///
/// The policy is a pure decision table over (role, action) pairs. There is
/// no branching on roles at call sites: callers ask `allows(role, action)`
/// and the answer comes from data. Absent pairs deny.
///
/// # Default grants
///
/// | Action           | owner | admin | analyst | content_creator |
/// |------------------|-------|-------|---------|-----------------|
/// | view_audit_logs  | allow | allow | deny    | deny            |
/// | create_user      | allow | allow | deny    | deny            |
/// | view_users       | allow | allow | deny    | deny            |
/// | view_account     | allow | allow | allow   | allow           |
///
/// # Example
///
/// ```
/// use vigil_shared::auth::policy::{PermissionPolicy, ProtectedAction};
/// use vigil_shared::models::user::UserRole;
///
/// let policy = PermissionPolicy::with_defaults();
/// assert!(policy.allows(UserRole::Admin, ProtectedAction::ViewAuditLogs));
/// assert!(!policy.allows(UserRole::Analyst, ProtectedAction::ViewAuditLogs));
/// ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::models::user::UserRole;

/// Actions gated by the permission policy
///
/// A closed enumeration: an action string that does not parse into one of
/// these values cannot be granted, so unknown actions deny by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectedAction {
    /// Search and read the account's audit trail
    ViewAuditLogs,

    /// Create users inside the account
    CreateUser,

    /// List the account's users
    ViewUsers,

    /// Read the account's own record
    ViewAccount,
}

impl ProtectedAction {
    /// Converts the action to its wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtectedAction::ViewAuditLogs => "view_audit_logs",
            ProtectedAction::CreateUser => "create_user",
            ProtectedAction::ViewUsers => "view_users",
            ProtectedAction::ViewAccount => "view_account",
        }
    }

    /// Parses an action identifier; unknown identifiers return `None`
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "view_audit_logs" => Some(ProtectedAction::ViewAuditLogs),
            "create_user" => Some(ProtectedAction::CreateUser),
            "view_users" => Some(ProtectedAction::ViewUsers),
            "view_account" => Some(ProtectedAction::ViewAccount),
            _ => None,
        }
    }
}

/// The default grant table
///
/// Kept as plain data so deployments can start from it and extend with
/// [`PermissionPolicy::grant`] or replace it wholesale with
/// [`PermissionPolicy::from_rules`].
pub const DEFAULT_RULES: &[(UserRole, ProtectedAction)] = &[
    (UserRole::Owner, ProtectedAction::ViewAuditLogs),
    (UserRole::Owner, ProtectedAction::CreateUser),
    (UserRole::Owner, ProtectedAction::ViewUsers),
    (UserRole::Owner, ProtectedAction::ViewAccount),
    (UserRole::Admin, ProtectedAction::ViewAuditLogs),
    (UserRole::Admin, ProtectedAction::CreateUser),
    (UserRole::Admin, ProtectedAction::ViewUsers),
    (UserRole::Admin, ProtectedAction::ViewAccount),
    (UserRole::Analyst, ProtectedAction::ViewAccount),
    (UserRole::ContentCreator, ProtectedAction::ViewAccount),
];

/// Permission decision table
///
/// Cheap to clone once built; intended to be constructed at startup and
/// shared read-only for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct PermissionPolicy {
    grants: HashSet<(UserRole, ProtectedAction)>,
}

impl PermissionPolicy {
    /// Builds the policy from the default grant table
    pub fn with_defaults() -> Self {
        Self::from_rules(DEFAULT_RULES.iter().copied())
    }

    /// Builds a policy from an arbitrary rule set
    pub fn from_rules(rules: impl IntoIterator<Item = (UserRole, ProtectedAction)>) -> Self {
        Self {
            grants: rules.into_iter().collect(),
        }
    }

    /// Adds a single grant
    pub fn grant(&mut self, role: UserRole, action: ProtectedAction) {
        self.grants.insert((role, action));
    }

    /// Decides whether `role` may perform `action`
    ///
    /// Pure lookup; pairs not present in the table deny.
    pub fn allows(&self, role: UserRole, action: ProtectedAction) -> bool {
        self.grants.contains(&(role, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ROLES: [UserRole; 4] = [
        UserRole::Owner,
        UserRole::Admin,
        UserRole::Analyst,
        UserRole::ContentCreator,
    ];

    const ALL_ACTIONS: [ProtectedAction; 4] = [
        ProtectedAction::ViewAuditLogs,
        ProtectedAction::CreateUser,
        ProtectedAction::ViewUsers,
        ProtectedAction::ViewAccount,
    ];

    /// The defaults must match the canonical decision table exactly, for
    /// every (role, action) pair.
    #[test]
    fn test_default_table_exhaustive() {
        let policy = PermissionPolicy::with_defaults();

        for role in ALL_ROLES {
            for action in ALL_ACTIONS {
                let expected = match (role, action) {
                    (UserRole::Owner, _) | (UserRole::Admin, _) => true,
                    (_, ProtectedAction::ViewAccount) => true,
                    _ => false,
                };
                assert_eq!(
                    policy.allows(role, action),
                    expected,
                    "({:?}, {:?})",
                    role,
                    action
                );
            }
        }
    }

    #[test]
    fn test_allows_is_deterministic() {
        let policy = PermissionPolicy::with_defaults();
        for _ in 0..3 {
            assert!(policy.allows(UserRole::Owner, ProtectedAction::CreateUser));
            assert!(!policy.allows(UserRole::ContentCreator, ProtectedAction::CreateUser));
        }
    }

    #[test]
    fn test_empty_policy_denies_everything() {
        let policy = PermissionPolicy::default();
        for role in ALL_ROLES {
            for action in ALL_ACTIONS {
                assert!(!policy.allows(role, action));
            }
        }
    }

    #[test]
    fn test_grant_extends_without_touching_defaults() {
        let mut policy = PermissionPolicy::with_defaults();
        assert!(!policy.allows(UserRole::Analyst, ProtectedAction::ViewAuditLogs));

        policy.grant(UserRole::Analyst, ProtectedAction::ViewAuditLogs);

        assert!(policy.allows(UserRole::Analyst, ProtectedAction::ViewAuditLogs));
        // Unrelated pairs are unchanged
        assert!(!policy.allows(UserRole::Analyst, ProtectedAction::CreateUser));
        assert!(policy.allows(UserRole::Owner, ProtectedAction::ViewAuditLogs));
    }

    #[test]
    fn test_action_from_str() {
        assert_eq!(
            ProtectedAction::from_str("view_audit_logs"),
            Some(ProtectedAction::ViewAuditLogs)
        );
        assert_eq!(
            ProtectedAction::from_str("view_account"),
            Some(ProtectedAction::ViewAccount)
        );
        assert_eq!(ProtectedAction::from_str("delete_everything"), None);
        assert_eq!(ProtectedAction::from_str(""), None);
    }

    #[test]
    fn test_action_roundtrip() {
        for action in ALL_ACTIONS {
            assert_eq!(ProtectedAction::from_str(action.as_str()), Some(action));
        }
    }
}
