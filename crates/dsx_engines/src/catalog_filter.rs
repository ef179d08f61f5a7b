#![forbid(unsafe_code)]

use dsx_contracts::catalog::{
    catalog_datasets, dataset_id_or_unknown, dataset_keywords, dataset_offers, dataset_title,
    CatalogPartition, DatasetAccess, EvaluatedOffer,
};
use dsx_contracts::jsonld::node_id;
use serde_json::Value;

use crate::policy_eval::evaluate_policy;

/// Partitions a catalog into datasets the participant can use and datasets
/// it cannot.
///
/// Accessible datasets keep their blocked offers for diagnostics. Pure; the
/// caller owns caching of the result.
pub fn filter_catalog(catalog: &Value, participant_id: &str) -> CatalogPartition {
    let mut partition = CatalogPartition::default();
    for dataset in catalog_datasets(catalog) {
        let access = evaluate_dataset(dataset, participant_id);
        if access.is_accessible() {
            partition.accessible_datasets.push(access);
        } else {
            partition.blocked_datasets.push(access);
        }
    }
    partition
}

fn evaluate_dataset(dataset: &Value, participant_id: &str) -> DatasetAccess {
    let mut accessible_offers = Vec::new();
    let mut blocked_offers = Vec::new();
    for offer in dataset_offers(dataset) {
        let evaluation = evaluate_policy(Some(offer), participant_id);
        if evaluation.accessible {
            let offer_id = offer_id_or(offer, "offer", accessible_offers.len());
            accessible_offers.push(EvaluatedOffer {
                offer_id,
                offer: offer.clone(),
                evaluation,
            });
        } else {
            let offer_id = offer_id_or(offer, "blocked-offer", blocked_offers.len());
            blocked_offers.push(EvaluatedOffer {
                offer_id,
                offer: offer.clone(),
                evaluation,
            });
        }
    }
    DatasetAccess {
        dataset_id: dataset_id_or_unknown(dataset),
        title: dataset_title(dataset),
        keywords: dataset_keywords(dataset),
        accessible_offers,
        blocked_offers,
    }
}

fn offer_id_or(offer: &Value, prefix: &str, index: usize) -> String {
    node_id(offer)
        .map(str::to_string)
        .unwrap_or_else(|| format!("{prefix}-{index}"))
}
