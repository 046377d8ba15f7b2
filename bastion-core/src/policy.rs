//! Named access policies
//!
//! Two policies exist in a standard deployment:
//!
//! | Policy           | Requirement                                              |
//! | ---------------- | -------------------------------------------------------- |
//! | `Users`          | role `Users`                                             |
//! | `Administrators` | role `Users` and claim `UserId` equal to the site admin  |
//!
//! Rules are built once at startup and never change afterwards.

use serde::{Deserialize, Serialize};

use crate::{error::ConfigError, principal::USER_ID_CLAIM};

pub const USERS_POLICY: &str = "Users";
pub const ADMINISTRATORS_POLICY: &str = "Administrators";
pub const USERS_ROLE: &str = "Users";

/// A claim that must be present with an exact value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRequirement {
    pub claim_type: String,
    pub expected_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyRule {
    pub name: String,
    pub required_role: String,
    pub required_claim: Option<ClaimRequirement>,
}

impl PolicyRule {
    pub fn require_role(name: &str, role: &str) -> Self {
        Self {
            name: name.to_string(),
            required_role: role.to_string(),
            required_claim: None,
        }
    }

    pub fn require_claim(mut self, claim_type: &str, expected_value: &str) -> Self {
        self.required_claim = Some(ClaimRequirement {
            claim_type: claim_type.to_string(),
            expected_value: expected_value.to_string(),
        });
        self
    }

    /// The `Users` policy.
    pub fn users() -> Self {
        Self::require_role(USERS_POLICY, USERS_ROLE)
    }

    /// The `Administrators` policy: a `Users` member whose `UserId` is `site_admin`.
    pub fn administrators(site_admin: &str) -> Self {
        Self::require_role(ADMINISTRATORS_POLICY, USERS_ROLE).require_claim(USER_ID_CLAIM, site_admin)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidPolicy {
            name: self.name.clone(),
            reason: reason.to_string(),
        };

        if self.name.trim().is_empty() {
            return Err(invalid("policy name must not be empty"));
        }
        if self.required_role.trim().is_empty() {
            return Err(invalid("required role must not be empty"));
        }
        if let Some(claim) = &self.required_claim {
            if claim.claim_type.is_empty() {
                return Err(invalid("claim type must not be empty"));
            }
            if claim.expected_value.is_empty() {
                return Err(invalid("expected claim value must not be empty"));
            }
        }
        Ok(())
    }
}

/// Why a principal was turned away.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DenialReason {
    MissingRole { role: String },
    ClaimMismatch { claim_type: String },
}

impl std::fmt::Display for DenialReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DenialReason::MissingRole { role } => write!(f, "missing role {role}"),
            DenialReason::ClaimMismatch { claim_type } => {
                write!(f, "claim {claim_type} missing or not matching")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Granted,
    Denied(DenialReason),
}

impl PolicyDecision {
    pub fn is_granted(&self) -> bool {
        matches!(self, PolicyDecision::Granted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_rules() {
        let users = PolicyRule::users();
        assert_eq!(users.name, "Users");
        assert_eq!(users.required_role, "Users");
        assert!(users.required_claim.is_none());

        let admins = PolicyRule::administrators("Admin");
        assert_eq!(admins.name, "Administrators");
        assert_eq!(admins.required_role, "Users");
        assert_eq!(
            admins.required_claim,
            Some(ClaimRequirement {
                claim_type: "UserId".to_string(),
                expected_value: "Admin".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        assert!(PolicyRule::require_role(" ", "Users").validate().is_err());
        assert!(PolicyRule::require_role("Editors", "").validate().is_err());
        assert!(PolicyRule::administrators("").validate().is_err());
        assert!(PolicyRule::administrators("Admin").validate().is_ok());
    }

    #[test]
    fn test_denial_reason_display() {
        let reason = DenialReason::MissingRole {
            role: "Users".to_string(),
        };
        assert_eq!(reason.to_string(), "missing role Users");
    }
}
