#![forbid(unsafe_code)]

//! Plain-text views of console results.

use dsx_contracts::catalog::{CatalogPartition, DatasetAccess};
use dsx_contracts::fetch::FetchedContent;
use dsx_contracts::management::{AssetSummary, ContractDefinitionSummary, PolicySummary};
use dsx_orchestration::edr::ResolvedEdr;
use dsx_orchestration::health::ServiceStatus;
use dsx_orchestration::negotiation::NegotiationOutcome;
use dsx_orchestration::FlowError;
use serde::Serialize;

pub fn flow_error(err: &FlowError) -> String {
    match err.hint() {
        Some(hint) => format!("{err}\nhint: {hint}"),
        None => err.to_string(),
    }
}

pub fn service_status(name: &str, status: &ServiceStatus) -> String {
    match status {
        ServiceStatus::Online => format!("{name}: online"),
        ServiceStatus::Offline { reason } => format!("{name}: offline ({reason})"),
    }
}

pub fn partition(partition: &CatalogPartition) -> String {
    if partition.is_empty() {
        return "catalog has no datasets".to_string();
    }
    let mut lines = vec![format!(
        "accessible datasets ({}):",
        partition.accessible_datasets.len()
    )];
    for dataset in &partition.accessible_datasets {
        dataset_lines(&mut lines, dataset);
    }
    lines.push(format!(
        "blocked datasets ({}):",
        partition.blocked_datasets.len()
    ));
    for dataset in &partition.blocked_datasets {
        dataset_lines(&mut lines, dataset);
    }
    lines.join("\n")
}

fn dataset_lines(lines: &mut Vec<String>, dataset: &DatasetAccess) {
    let mut head = format!("  {}", dataset.dataset_id);
    if let Some(title) = &dataset.title {
        head.push_str(&format!(" \"{title}\""));
    }
    if !dataset.keywords.is_empty() {
        head.push_str(&format!(" [{}]", dataset.keywords.join(", ")));
    }
    lines.push(head);
    for offer in &dataset.accessible_offers {
        lines.push(format!("    offer {}: {}", offer.offer_id, offer.evaluation.reason));
    }
    for offer in &dataset.blocked_offers {
        lines.push(format!("    blocked {}: {}", offer.offer_id, offer.evaluation.reason));
    }
}

pub fn assets(items: &[AssetSummary]) -> String {
    if items.is_empty() {
        return "no assets".to_string();
    }
    items
        .iter()
        .map(|a| match &a.name {
            Some(name) => format!("{}  {name}", a.id),
            None => a.id.clone(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn policies(items: &[PolicySummary]) -> String {
    if items.is_empty() {
        return "no policy definitions".to_string();
    }
    items
        .iter()
        .map(|p| match &p.restricted_to {
            Some(participant) => format!("{}  restricted to {participant}", p.id),
            None => format!("{}  open", p.id),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn contract_definitions(items: &[ContractDefinitionSummary]) -> String {
    if items.is_empty() {
        return "no contract definitions".to_string();
    }
    items
        .iter()
        .map(|c| {
            format!(
                "{}  access={} contract={} assets=[{}]",
                c.id,
                c.access_policy_id,
                c.contract_policy_id,
                c.asset_ids.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn negotiation(outcome: &NegotiationOutcome) -> String {
    let states: Vec<&str> = outcome.observed_states.iter().map(|s| s.as_str()).collect();
    format!(
        "negotiation {} finalized after {} polls ({})\nagreement: {}",
        outcome.negotiation_id,
        outcome.polls,
        states.join(" -> "),
        outcome.agreement_id
    )
}

/// The credential is only ever shown truncated.
pub fn edr(resolved: &ResolvedEdr) -> String {
    let mut out = format!(
        "endpoint: {}\nauthorization: {}",
        resolved.edr.endpoint,
        resolved.edr.credential_preview()
    );
    if let Some(variable) = &resolved.placeholder_variable {
        out.push_str(&format!(
            "\nwarning: {variable} is not set on the provider data plane; using its default"
        ));
    }
    out
}

/// Pretty JSON for `--json` listings.
pub fn json<T: Serialize>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("failed to encode output: {e}"))
}

pub fn content(content: &FetchedContent) -> String {
    match content {
        FetchedContent::Json(value) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        FetchedContent::Text(text) => text.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsx_contracts::catalog::EvaluatedOffer;
    use dsx_contracts::negotiation::NegotiationState;
    use dsx_contracts::policy::{PolicyDecisionBasis, PolicyEvaluation};
    use dsx_contracts::transfer::EndpointDataReference;
    use serde_json::json;

    #[test]
    fn at_render_01_partition_lists_reasons() {
        let p = CatalogPartition {
            accessible_datasets: vec![DatasetAccess {
                dataset_id: "asset-1".to_string(),
                title: Some("Weather".to_string()),
                keywords: vec!["open".to_string()],
                accessible_offers: vec![EvaluatedOffer {
                    offer_id: "o1".to_string(),
                    offer: json!({}),
                    evaluation: PolicyEvaluation::allow(
                        PolicyDecisionBasis::NoPermissions,
                        "no permissions defined",
                    ),
                }],
                blocked_offers: vec![],
            }],
            blocked_datasets: vec![DatasetAccess {
                dataset_id: "asset-2".to_string(),
                title: None,
                keywords: vec![],
                accessible_offers: vec![],
                blocked_offers: vec![EvaluatedOffer {
                    offer_id: "o2".to_string(),
                    offer: json!({}),
                    evaluation: PolicyEvaluation::deny(
                        PolicyDecisionBasis::ParticipantMismatch,
                        "participant id mismatch: required p2, your id p1",
                    ),
                }],
            }],
        };
        let text = partition(&p);
        assert!(text.contains("  asset-1 \"Weather\" [open]\n    offer o1: no permissions defined"));
        assert!(text.contains("blocked datasets (1):\n  asset-2\n    blocked o2: participant id mismatch"));
        assert!(!text.ends_with('\n'));
        assert_eq!(partition(&CatalogPartition::default()), "catalog has no datasets");
    }

    #[test]
    fn at_render_02_edr_never_shows_full_credential() {
        let resolved = ResolvedEdr {
            edr: EndpointDataReference {
                endpoint: "http://host:9999/pub".to_string(),
                authorization: "abcdefghijklmnopqrstuvwxyz0123456789".to_string(),
            },
            placeholder_variable: Some("EDC_DATAPLANE_PUBLIC_URL".to_string()),
            polls: 1,
        };
        let text = edr(&resolved);
        assert!(text.contains("authorization: abcdefghijklmnopqrst..."));
        assert!(!text.contains("0123456789"));
        assert!(text.contains("EDC_DATAPLANE_PUBLIC_URL is not set"));
    }

    #[test]
    fn at_render_03_negotiation_and_content() {
        let outcome = NegotiationOutcome {
            negotiation_id: "neg-1".to_string(),
            agreement_id: "agr-1".to_string(),
            polls: 6,
            observed_states: vec![NegotiationState::Requested, NegotiationState::Finalized],
        };
        assert_eq!(
            negotiation(&outcome),
            "negotiation neg-1 finalized after 6 polls (REQUESTED -> FINALIZED)\nagreement: agr-1"
        );
        assert_eq!(content(&FetchedContent::Json(json!({"a": 1}))), "{\n  \"a\": 1\n}");
        assert_eq!(content(&FetchedContent::Text("x".to_string())), "x");
    }

    #[test]
    fn at_render_04_flow_error_appends_hint() {
        let err = FlowError::MissingPrecondition("fetch a catalog first");
        assert_eq!(flow_error(&err), "missing precondition: fetch a catalog first");
        let err = FlowError::EdrTimeout {
            transfer_id: "tp-1".to_string(),
            attempts: 15,
        };
        assert!(flow_error(&err).contains("\nhint: the transfer id is kept"));
    }

    #[test]
    fn at_render_06_json_listing() {
        let items = vec![AssetSummary {
            id: "asset-1".to_string(),
            name: None,
        }];
        assert_eq!(
            json(&items).unwrap(),
            "[\n  {\n    \"id\": \"asset-1\",\n    \"name\": null\n  }\n]"
        );
    }

    #[test]
    fn at_render_05_empty_listings() {
        assert_eq!(assets(&[]), "no assets");
        assert_eq!(
            policies(&[PolicySummary {
                id: "pol-1".to_string(),
                restricted_to: Some("p2".to_string())
            }]),
            "pol-1  restricted to p2"
        );
    }
}
