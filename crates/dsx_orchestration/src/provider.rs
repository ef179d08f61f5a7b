#![forbid(unsafe_code)]

//! Provider-side management: publishing assets, access policies and
//! contract definitions, and listing what is already published.

use dsx_contracts::jsonld::{one_or_many, query_spec};
use dsx_contracts::management::{
    AssetDocument, AssetSummary, ContractDefinitionDocument, ContractDefinitionSummary,
    ManagementResource, PolicyDefinitionDocument, PolicySummary,
};
use dsx_contracts::transfer::created_id;
use dsx_engines::rejection_hint::SubmissionStage;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::FlowError;
use crate::transport::ConnectorTransport;

pub struct ProviderOperations<'a> {
    transport: &'a dyn ConnectorTransport,
}

impl<'a> ProviderOperations<'a> {
    pub fn new(transport: &'a dyn ConnectorTransport) -> Self {
        Self { transport }
    }

    pub fn create_asset(&self, asset: &AssetDocument) -> Result<String, FlowError> {
        self.create(
            ManagementResource::Assets,
            SubmissionStage::CreateAsset,
            &asset.id,
            &asset.to_json(),
        )
    }

    pub fn create_policy(&self, policy: &PolicyDefinitionDocument) -> Result<String, FlowError> {
        self.create(
            ManagementResource::PolicyDefinitions,
            SubmissionStage::CreatePolicy,
            &policy.id,
            &policy.to_json(),
        )
    }

    pub fn create_contract_definition(
        &self,
        definition: &ContractDefinitionDocument,
    ) -> Result<String, FlowError> {
        self.create(
            ManagementResource::ContractDefinitions,
            SubmissionStage::CreateContractDefinition,
            &definition.id,
            &definition.to_json(),
        )
    }

    pub fn list_assets(&self) -> Result<Vec<AssetSummary>, FlowError> {
        let nodes = self.list(ManagementResource::Assets)?;
        Ok(nodes.iter().map(AssetSummary::from_json).collect())
    }

    pub fn list_policies(&self) -> Result<Vec<PolicySummary>, FlowError> {
        let nodes = self.list(ManagementResource::PolicyDefinitions)?;
        Ok(nodes.iter().map(PolicySummary::from_json).collect())
    }

    pub fn list_contract_definitions(&self) -> Result<Vec<ContractDefinitionSummary>, FlowError> {
        let nodes = self.list(ManagementResource::ContractDefinitions)?;
        Ok(nodes.iter().map(ContractDefinitionSummary::from_json).collect())
    }

    /// The created id echoed by the connector, else the id that was sent.
    fn create(
        &self,
        resource: ManagementResource,
        stage: SubmissionStage,
        requested_id: &str,
        document: &Value,
    ) -> Result<String, FlowError> {
        let reply = self.transport.post_management(resource.path(), document)?;
        if !reply.is_created() {
            warn!(resource = resource.label(), status = reply.status, "create rejected");
            return Err(FlowError::rejected(stage, &reply));
        }
        let id = reply
            .json()
            .as_ref()
            .and_then(created_id)
            .unwrap_or_else(|| requested_id.to_string());
        info!(resource = resource.label(), id = %id, "created");
        Ok(id)
    }

    fn list(&self, resource: ManagementResource) -> Result<Vec<Value>, FlowError> {
        let reply = self
            .transport
            .post_management(&resource.query_path(), &query_spec())?;
        if !reply.is_ok() {
            return Err(FlowError::MalformedResponse {
                stage: resource.label(),
                detail: format!("list answered HTTP {}: {}", reply.status, reply.body),
            });
        }
        let body = reply.json().ok_or_else(|| FlowError::MalformedResponse {
            stage: resource.label(),
            detail: "list response is not JSON".to_string(),
        })?;
        Ok(one_or_many(Some(&body)).into_iter().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;
    use serde_json::json;

    fn asset() -> AssetDocument {
        AssetDocument::v1(
            "asset-1".to_string(),
            "Weather".to_string(),
            "hourly readings".to_string(),
            "http://data-api:8000/files/list".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn at_provider_01_create_asset_posts_document_and_returns_id() {
        let transport = ScriptedTransport::new().reply(200, json!({"@id": "asset-1"}));
        let id = ProviderOperations::new(&transport).create_asset(&asset()).unwrap();
        assert_eq!(id, "asset-1");
        let calls = transport.calls();
        assert_eq!(calls[0].method, "POST");
        assert_eq!(calls[0].target, "/management/v3/assets");
        assert_eq!(calls[0].body.as_ref().unwrap()["@id"], "asset-1");
    }

    #[test]
    fn at_provider_02_created_without_body_falls_back_to_sent_id() {
        let transport = ScriptedTransport::new().reply_text(201, "");
        let policy =
            PolicyDefinitionDocument::v1("pol-1".to_string(), Some("participant-2".to_string()))
                .unwrap();
        let id = ProviderOperations::new(&transport).create_policy(&policy).unwrap();
        assert_eq!(id, "pol-1");
    }

    #[test]
    fn at_provider_03_duplicate_asset_is_rejected_with_hint() {
        let transport =
            ScriptedTransport::new().reply_text(409, "Asset with ID asset-1 already exists");
        let err = ProviderOperations::new(&transport)
            .create_asset(&asset())
            .unwrap_err();
        match err {
            FlowError::Rejected {
                stage, status, hint, ..
            } => {
                assert_eq!(stage, SubmissionStage::CreateAsset);
                assert_eq!(status, 409);
                assert!(hint.unwrap().starts_with("duplicate"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn at_provider_04_contract_definition_reference_error() {
        let transport = ScriptedTransport::new().reply_text(400, "AccessPolicy not found");
        let def = ContractDefinitionDocument::v1(
            "cd-1".to_string(),
            "pol-1".to_string(),
            "pol-1".to_string(),
            "asset-1".to_string(),
        )
        .unwrap();
        let err = ProviderOperations::new(&transport)
            .create_contract_definition(&def)
            .unwrap_err();
        assert!(err.hint().unwrap().starts_with("reference error"));
    }

    #[test]
    fn at_provider_05_lists_use_query_spec_and_normalize_cardinality() {
        let transport = ScriptedTransport::new()
            .reply(200, json!([{"@id": "a1", "properties": {"name": "A"}}, {"@id": "a2"}]))
            .reply(200, json!({"@id": "pol-1", "policy": {}}));
        let ops = ProviderOperations::new(&transport);
        let assets = ops.list_assets().unwrap();
        assert_eq!(assets.len(), 2);
        assert_eq!(assets[0].name.as_deref(), Some("A"));
        let policies = ops.list_policies().unwrap();
        assert_eq!(policies[0].id, "pol-1");
        assert!(!policies[0].is_participant_restricted());

        let calls = transport.calls();
        assert_eq!(calls[0].target, "/management/v3/assets/request");
        assert_eq!(calls[1].target, "/management/v3/policydefinitions/request");
        assert_eq!(calls[0].body.as_ref().unwrap()["@type"], "QuerySpec");
    }

    #[test]
    fn at_provider_06_list_failures_surface() {
        let transport = ScriptedTransport::new()
            .reply_text(500, "down")
            .fail("connection");
        let ops = ProviderOperations::new(&transport);
        assert!(matches!(
            ops.list_contract_definitions(),
            Err(FlowError::MalformedResponse { .. })
        ));
        assert!(matches!(ops.list_assets(), Err(FlowError::Transport(_))));
    }
}
