#![forbid(unsafe_code)]

//! Targeted hints for rejected create/start calls.
//!
//! The connector reports validation problems as free text, so the body is
//! matched for known substrings. Checks run in order; the first hit wins.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionStage {
    CreateAsset,
    CreatePolicy,
    CreateContractDefinition,
    FetchCatalog,
    StartNegotiation,
    StartTransfer,
}

impl SubmissionStage {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionStage::CreateAsset => "create asset",
            SubmissionStage::CreatePolicy => "create policy",
            SubmissionStage::CreateContractDefinition => "create contract definition",
            SubmissionStage::FetchCatalog => "fetch catalog",
            SubmissionStage::StartNegotiation => "start negotiation",
            SubmissionStage::StartTransfer => "start transfer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HintRule {
    Duplicate,
    NotFound,
    Invalid,
    MalformedUrl,
    Participant,
    Operand,
}

fn rules_for(stage: SubmissionStage) -> &'static [HintRule] {
    use HintRule::*;
    match stage {
        SubmissionStage::CreateAsset => &[Duplicate, Invalid, MalformedUrl],
        SubmissionStage::CreatePolicy => &[Duplicate, Invalid, Participant, Operand],
        SubmissionStage::CreateContractDefinition => &[Duplicate, NotFound, Invalid],
        SubmissionStage::FetchCatalog => &[NotFound, Invalid],
        SubmissionStage::StartNegotiation => &[NotFound, Invalid, Operand, Participant],
        SubmissionStage::StartTransfer => &[NotFound, Invalid],
    }
}

fn rule_matches(rule: HintRule, body: &str) -> bool {
    match rule {
        HintRule::Duplicate => body.contains("already exists") || body.contains("duplicate"),
        HintRule::NotFound => body.contains("not found"),
        HintRule::Invalid => body.contains("invalid"),
        HintRule::MalformedUrl => body.contains("url") && body.contains("malformed"),
        HintRule::Participant => body.contains("participant"),
        HintRule::Operand => body.contains("leftoperand") || body.contains("rightoperand"),
    }
}

fn hint_text(rule: HintRule, stage: SubmissionStage) -> &'static str {
    match (rule, stage) {
        (HintRule::Duplicate, SubmissionStage::CreateAsset) => {
            "duplicate: this asset id already exists; choose a different id"
        }
        (HintRule::Duplicate, SubmissionStage::CreatePolicy) => {
            "duplicate: this policy id already exists; choose a different id"
        }
        (HintRule::Duplicate, _) => {
            "duplicate: this contract definition id already exists; choose a different id"
        }
        (HintRule::NotFound, SubmissionStage::CreateContractDefinition) => {
            "reference error: the selected asset or policy was not found; create them first"
        }
        (HintRule::NotFound, SubmissionStage::StartTransfer) => {
            "reference error: the agreement or asset was not found; finish a negotiation first (`dsx negotiate`)"
        }
        (HintRule::NotFound, _) => {
            "reference error: the counterparty or offer was not found; re-fetch the catalog"
        }
        (HintRule::Invalid, SubmissionStage::CreatePolicy) => {
            "validation error: the policy definition is invalid; check the constraint"
        }
        (HintRule::Invalid, _) => "validation error: the submitted data is invalid; check each field",
        (HintRule::MalformedUrl, _) => "url error: the data URL is malformed",
        (HintRule::Participant, _) => {
            "participant error: the participant id may be in the wrong format"
        }
        (HintRule::Operand, _) => {
            "constraint error: a constraint operand was rejected; check leftOperand/rightOperand"
        }
    }
}

/// Hint for a rejected submission, or `None` when nothing known matches.
pub fn rejection_hint(stage: SubmissionStage, body: &str) -> Option<&'static str> {
    let lower = body.to_ascii_lowercase();
    rules_for(stage)
        .iter()
        .copied()
        .find(|rule| rule_matches(*rule, &lower))
        .map(|rule| hint_text(rule, stage))
}
