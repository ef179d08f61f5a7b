#![forbid(unsafe_code)]

use serde::Serialize;
use serde_json::Value;

use crate::jsonld::{
    id_or_str, is_present, literal_string, node_id, one_or_many, property,
};

pub const KEY_PERMISSION: &str = "odrl:permission";
pub const KEY_PROHIBITION: &str = "odrl:prohibition";
pub const KEY_OBLIGATION: &str = "odrl:obligation";
pub const KEY_ACTION: &str = "odrl:action";
pub const KEY_CONSTRAINT: &str = "odrl:constraint";
pub const KEY_CONSTRAINTS: &str = "odrl:constraints";
pub const KEY_LEFT_OPERAND: &str = "odrl:leftOperand";
pub const KEY_OPERATOR: &str = "odrl:operator";
pub const KEY_RIGHT_OPERAND: &str = "odrl:rightOperand";
pub const KEY_ASSIGNER: &str = "odrl:assigner";
pub const KEY_TARGET: &str = "odrl:target";

/// Left-operand spellings that all mean "the consuming participant's id".
pub const PARTICIPANT_ID_LEFT_OPERANDS: &[&str] = &[
    "https://w3id.org/edc/v0.0.1/ns/participantId",
    "edc:participantId",
    "participantId",
];

/// Operator spellings that all mean ODRL equality.
pub const EQUALITY_OPERATORS: &[&str] = &["odrl:eq", "EQ", "eq", "http://www.w3.org/ns/odrl/2/eq"];

pub const PARTICIPANT_ID_LEFT_OPERAND: &str = "https://w3id.org/edc/v0.0.1/ns/participantId";

/// One ODRL constraint with its operands reduced to plain strings.
///
/// `left_operand` and `operator` are empty when the connector sent a shape
/// that carries no identifier; such a constraint never matches anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraint {
    pub left_operand: String,
    pub operator: String,
    pub right_operand: Option<String>,
}

impl Constraint {
    pub fn from_json(node: &Value) -> Option<Self> {
        if !node.is_object() {
            return None;
        }
        let plain = |key: &str| {
            property(node, key)
                .and_then(id_or_str)
                .unwrap_or_default()
                .to_string()
        };
        Some(Self {
            left_operand: plain(KEY_LEFT_OPERAND),
            operator: plain(KEY_OPERATOR),
            right_operand: property(node, KEY_RIGHT_OPERAND).and_then(literal_string),
        })
    }

    pub fn is_participant_identity(&self) -> bool {
        PARTICIPANT_ID_LEFT_OPERANDS.contains(&self.left_operand.as_str())
    }

    pub fn is_equality(&self) -> bool {
        EQUALITY_OPERATORS.contains(&self.operator.as_str())
    }

    pub fn is_participant_equality(&self) -> bool {
        self.is_participant_identity() && self.is_equality()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permission {
    pub action: Option<String>,
    pub constraints: Vec<Constraint>,
}

impl Permission {
    /// The singular `constraint` property wins when present; the plural
    /// `constraints` property (or its un-prefixed alias) is read only
    /// otherwise. Order is preserved.
    pub fn from_json(node: &Value) -> Option<Self> {
        if !node.is_object() {
            return None;
        }
        let singular = property(node, KEY_CONSTRAINT);
        let source = if is_present(singular) {
            singular
        } else {
            property(node, KEY_CONSTRAINTS)
        };
        let constraints = one_or_many(source)
            .into_iter()
            .filter_map(Constraint::from_json)
            .collect();
        Some(Self {
            action: property(node, KEY_ACTION)
                .and_then(id_or_str)
                .map(str::to_string),
            constraints,
        })
    }
}

/// Typed view of an ODRL policy (policy definition body or catalog offer).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PolicyDocument {
    pub id: Option<String>,
    pub permissions: Vec<Permission>,
    pub prohibitions: Vec<Permission>,
    pub obligations: Vec<Permission>,
}

impl PolicyDocument {
    pub fn from_json(node: &Value) -> Self {
        let rules = |key: &str| {
            one_or_many(property(node, key))
                .into_iter()
                .filter_map(Permission::from_json)
                .collect::<Vec<_>>()
        };
        Self {
            id: node_id(node).map(str::to_string),
            permissions: rules(KEY_PERMISSION),
            prohibitions: rules(KEY_PROHIBITION),
            obligations: rules(KEY_OBLIGATION),
        }
    }

    pub fn participant_restriction(&self) -> Option<&Constraint> {
        self.permissions
            .iter()
            .flat_map(|p| p.constraints.iter())
            .find(|c| c.is_participant_equality())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PolicyDecisionBasis {
    NoConstraints,
    NoPermissions,
    ParticipantMatch,
    ParticipantMismatch,
    NoParticipantConstraint,
}

impl PolicyDecisionBasis {
    pub fn as_str(self) -> &'static str {
        match self {
            PolicyDecisionBasis::NoConstraints => "NO_CONSTRAINTS",
            PolicyDecisionBasis::NoPermissions => "NO_PERMISSIONS",
            PolicyDecisionBasis::ParticipantMatch => "PARTICIPANT_MATCH",
            PolicyDecisionBasis::ParticipantMismatch => "PARTICIPANT_MISMATCH",
            PolicyDecisionBasis::NoParticipantConstraint => "NO_PARTICIPANT_CONSTRAINT",
        }
    }
}

/// Client-side prediction of whether a participant may use an offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PolicyEvaluation {
    pub accessible: bool,
    pub basis: PolicyDecisionBasis,
    pub reason: String,
}

impl PolicyEvaluation {
    pub fn allow(basis: PolicyDecisionBasis, reason: impl Into<String>) -> Self {
        Self {
            accessible: true,
            basis,
            reason: reason.into(),
        }
    }

    pub fn deny(basis: PolicyDecisionBasis, reason: impl Into<String>) -> Self {
        Self {
            accessible: false,
            basis,
            reason: reason.into(),
        }
    }
}
