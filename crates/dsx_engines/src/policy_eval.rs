#![forbid(unsafe_code)]

//! Client-side prediction of offer accessibility.
//!
//! This never enforces anything; the provider's connector makes the real
//! decision during negotiation. The prediction only filters what the
//! operator is shown.

use dsx_contracts::jsonld::{is_present, one_or_many, property};
use dsx_contracts::policy::{
    Constraint, Permission, PolicyDecisionBasis, PolicyEvaluation, KEY_PERMISSION,
};
use serde_json::Value;

/// Decides whether `participant_id` may use the offer described by `policy`.
///
/// The first participant-identity equality constraint found (permissions in
/// order, then constraints in order) decides the outcome; later
/// constraints are not consulted. Anything without such a constraint is
/// accessible.
pub fn evaluate_policy(policy: Option<&Value>, participant_id: &str) -> PolicyEvaluation {
    let Some(policy) = policy.filter(|p| is_present(Some(*p))) else {
        return PolicyEvaluation::allow(PolicyDecisionBasis::NoConstraints, "no constraints");
    };
    if participant_id.is_empty() {
        return PolicyEvaluation::allow(PolicyDecisionBasis::NoConstraints, "no constraints");
    }

    let permissions = one_or_many(property(policy, KEY_PERMISSION));
    if permissions.is_empty() {
        return PolicyEvaluation::allow(
            PolicyDecisionBasis::NoPermissions,
            "no permissions defined",
        );
    }

    for permission in permissions.into_iter().filter_map(Permission::from_json) {
        for constraint in &permission.constraints {
            if let Some(decision) = decide_participant_constraint(constraint, participant_id) {
                return decision;
            }
        }
    }

    PolicyEvaluation::allow(
        PolicyDecisionBasis::NoParticipantConstraint,
        "no participant constraints found",
    )
}

fn decide_participant_constraint(
    constraint: &Constraint,
    participant_id: &str,
) -> Option<PolicyEvaluation> {
    if !constraint.is_participant_equality() {
        return None;
    }
    let required = constraint.right_operand.as_deref().unwrap_or_default();
    if required == participant_id {
        Some(PolicyEvaluation::allow(
            PolicyDecisionBasis::ParticipantMatch,
            format!("participant id matches: {required}"),
        ))
    } else {
        Some(PolicyEvaluation::deny(
            PolicyDecisionBasis::ParticipantMismatch,
            format!("participant id mismatch: required {required}, your id {participant_id}"),
        ))
    }
}
