//! Claims-based policy evaluation.
//!
//! The evaluator holds an immutable table of [`PolicyRule`]s and checks principals
//! against them. It keeps no state between calls and needs no locking.

use std::collections::BTreeMap;

use crate::{
    Error,
    error::ConfigError,
    policy::{DenialReason, PolicyDecision, PolicyRule},
    principal::Principal,
};

#[derive(Debug, Clone)]
pub struct ClaimsPolicyEvaluator {
    rules: BTreeMap<String, PolicyRule>,
}

impl ClaimsPolicyEvaluator {
    /// Build an evaluator from a rule table.
    ///
    /// Fails on invalid rules and on two rules sharing a name.
    pub fn new(rules: impl IntoIterator<Item = PolicyRule>) -> Result<Self, Error> {
        let mut table = BTreeMap::new();
        for rule in rules {
            rule.validate()?;
            if table.contains_key(&rule.name) {
                return Err(ConfigError::DuplicatePolicy(rule.name).into());
            }
            table.insert(rule.name.clone(), rule);
        }
        Ok(Self { rules: table })
    }

    /// The `Users` and `Administrators` policies for a single site administrator.
    pub fn standard(site_admin: &str) -> Result<Self, Error> {
        Self::new([PolicyRule::users(), PolicyRule::administrators(site_admin)])
    }

    pub fn rule(&self, policy_name: &str) -> Option<&PolicyRule> {
        self.rules.get(policy_name)
    }

    /// Policy names in sorted order.
    pub fn policy_names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Confirm every policy the application refers to is defined.
    ///
    /// Meant to run once at startup so an unknown name never reaches request time.
    pub fn validate_policies(&self, required: &[&str]) -> Result<(), Error> {
        for name in required {
            if !self.rules.contains_key(*name) {
                return Err(ConfigError::UnknownPolicy((*name).to_string()).into());
            }
        }
        Ok(())
    }

    /// Evaluate `principal` against the policy called `policy_name`.
    ///
    /// Claim values are compared exactly; there is no case folding.
    pub fn evaluate(&self, policy_name: &str, principal: &Principal) -> Result<PolicyDecision, Error> {
        let rule = self
            .rules
            .get(policy_name)
            .ok_or_else(|| ConfigError::UnknownPolicy(policy_name.to_string()))?;

        let decision = check(rule, principal);
        match &decision {
            PolicyDecision::Granted => {
                tracing::debug!(
                    policy = %policy_name,
                    user_id = %principal.user_id,
                    "Policy granted"
                );
            }
            PolicyDecision::Denied(reason) => {
                tracing::info!(
                    policy = %policy_name,
                    user_id = %principal.user_id,
                    reason = %reason,
                    "Policy denied"
                );
            }
        }

        Ok(decision)
    }

    pub fn is_authorized(&self, policy_name: &str, principal: &Principal) -> Result<bool, Error> {
        Ok(self.evaluate(policy_name, principal)?.is_granted())
    }
}

fn check(rule: &PolicyRule, principal: &Principal) -> PolicyDecision {
    if !principal.has_role(&rule.required_role) {
        return PolicyDecision::Denied(DenialReason::MissingRole {
            role: rule.required_role.clone(),
        });
    }

    if let Some(claim) = &rule.required_claim {
        if !principal.has_claim(&claim.claim_type, &claim.expected_value) {
            return PolicyDecision::Denied(DenialReason::ClaimMismatch {
                claim_type: claim.claim_type.clone(),
            });
        }
    }

    PolicyDecision::Granted
}
