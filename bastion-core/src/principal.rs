//! The authenticated identity handed to policy evaluation.
//!
//! A [`Principal`] is produced by whatever authenticates the request and is only
//! read here. Claims are a multimap: the same claim type may carry several values.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Claim type carrying the user's identifier.
pub const USER_ID_CLAIM: &str = "UserId";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: String,
    pub roles: BTreeSet<String>,
    pub claims: BTreeMap<String, Vec<String>>,
}

impl Principal {
    /// A principal whose `UserId` claim mirrors `user_id`.
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Self::default()
        }
        .with_claim(USER_ID_CLAIM, user_id)
    }

    /// A principal with no claims at all, not even `UserId`.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.insert(role.to_string());
        self
    }

    pub fn with_claim(mut self, claim_type: &str, value: &str) -> Self {
        self.claims
            .entry(claim_type.to_string())
            .or_default()
            .push(value.to_string());
        self
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    pub fn claim_values(&self, claim_type: &str) -> &[String] {
        self.claims
            .get(claim_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Exact, case-sensitive match against any value of `claim_type`.
    pub fn has_claim(&self, claim_type: &str, value: &str) -> bool {
        self.claim_values(claim_type).iter().any(|v| v == value)
    }
}
