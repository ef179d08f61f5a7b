#![forbid(unsafe_code)]

use dsx_contracts::catalog::ProviderTarget;
use dsx_contracts::management::{
    AssetDocument, ContractDefinitionDocument, PolicyDefinitionDocument,
};
use dsx_contracts::transfer::EndpointDataReference;
use dsx_orchestration::catalog::CatalogRequester;
use dsx_orchestration::fetch::DataFetcher;
use dsx_orchestration::flow::ConsumerFlow;
use dsx_orchestration::health::{probe_connector, probe_data_api};
use dsx_orchestration::provider::ProviderOperations;
use dsx_orchestration::{ConnectorTransport, ConsoleConfig, ExchangeSession, FlowError, SelectedOffer};

use crate::cli::{
    AssetCommand, Command, ContractDefCommand, FetchArgs, OfferArgs, PolicyCommand, TransferArgs,
};
use crate::render;

pub fn execute_console_command(
    config: &ConsoleConfig,
    transport: &dyn ConnectorTransport,
    command: &Command,
) -> Result<String, String> {
    match command {
        Command::Health => Ok([
            render::service_status("connector", &probe_connector(transport)),
            render::service_status(
                "data api",
                &probe_data_api(transport, &config.data_api_url),
            ),
        ]
        .join("\n")),
        Command::Asset(cmd) => execute_asset(config, transport, cmd),
        Command::Policy(cmd) => execute_policy(transport, cmd),
        Command::ContractDef(cmd) => execute_contract_def(transport, cmd),
        Command::Catalog(args) => {
            let mut session = ExchangeSession::new(&config.participant_id);
            let partition = CatalogRequester::new(transport, config.protocol_port)
                .fetch(
                    &mut session,
                    &args.provider.provider,
                    args.provider.provider_participant_id.as_deref(),
                )
                .map_err(fail)?;
            if args.json {
                render::json(&partition)
            } else {
                Ok(render::partition(&partition))
            }
        }
        Command::Negotiate(args) => {
            let mut session = ExchangeSession::new(&config.participant_id);
            let offer = select_offer(config, transport, &mut session, args).map_err(fail)?;
            let outcome = ConsumerFlow::new(transport, config)
                .negotiation()
                .negotiate(&mut session, &offer)
                .map_err(fail)?;
            Ok(format!(
                "{}\nnext: dsx transfer --agreement-id {} --asset-id {} --provider {}",
                render::negotiation(&outcome),
                outcome.agreement_id,
                offer.dataset_id,
                args.provider.provider
            ))
        }
        Command::Consume(args) => {
            let mut session = ExchangeSession::new(&config.participant_id);
            let offer = select_offer(config, transport, &mut session, args).map_err(fail)?;
            let report = ConsumerFlow::new(transport, config)
                .run(&mut session, &offer)
                .map_err(fail)?;
            Ok([
                render::negotiation(&report.negotiation),
                format!("transfer: {}", report.transfer_id),
                render::edr(&report.edr),
                render::content(&report.content),
            ]
            .join("\n"))
        }
        Command::Transfer(args) => execute_transfer(config, transport, args),
        Command::Edr(args) => {
            let resolved = ConsumerFlow::new(transport, config)
                .edr()
                .resolve_edr(&args.transfer_id)
                .map_err(fail)?;
            Ok(format!(
                "{}\nnext: dsx pull --transfer-id {}",
                render::edr(&resolved),
                args.transfer_id
            ))
        }
        Command::Pull(args) => {
            let mut session = ExchangeSession::new(&config.participant_id);
            session.begin_transfer(&args.transfer_id);
            let flow = ConsumerFlow::new(transport, config);
            let resolved = flow.edr().resolve(&mut session).map_err(fail)?;
            let content = flow.fetcher().fetch_for_session(&session).map_err(fail)?;
            Ok([render::edr(&resolved), render::content(&content)].join("\n"))
        }
        Command::Fetch(args) => execute_fetch(transport, args),
    }
}

fn execute_transfer(
    config: &ConsoleConfig,
    transport: &dyn ConnectorTransport,
    args: &TransferArgs,
) -> Result<String, String> {
    let provider = ProviderTarget::v1(&args.provider, None, config.protocol_port)
        .map_err(|e| fail(e.into()))?;
    let transfer_id = ConsumerFlow::new(transport, config)
        .transfer()
        .start_transfer(&args.agreement_id, &args.asset_id, &provider.protocol_endpoint)
        .map_err(fail)?;
    Ok(format!(
        "transfer: {transfer_id}\nnext: dsx pull --transfer-id {transfer_id}"
    ))
}

fn execute_fetch(transport: &dyn ConnectorTransport, args: &FetchArgs) -> Result<String, String> {
    if args.endpoint.trim().is_empty() || args.authorization.trim().is_empty() {
        return Err("fetch needs a non-empty --endpoint and --authorization".to_string());
    }
    let edr = EndpointDataReference {
        endpoint: args.endpoint.trim().to_string(),
        authorization: args.authorization.clone(),
    };
    let content = DataFetcher::new(transport).fetch(&edr).map_err(fail)?;
    Ok(render::content(&content))
}

fn fail(err: FlowError) -> String {
    render::flow_error(&err)
}

/// With `--dataset-id` the named offer is sent as a minimal fallback offer
/// and no catalog is fetched.
fn select_offer(
    config: &ConsoleConfig,
    transport: &dyn ConnectorTransport,
    session: &mut ExchangeSession,
    args: &OfferArgs,
) -> Result<SelectedOffer, FlowError> {
    let provider_participant_id = args.provider.provider_participant_id.as_deref();
    if let (Some(offer_id), Some(dataset_id)) = (&args.offer_id, &args.dataset_id) {
        let provider = ProviderTarget::v1(
            &args.provider.provider,
            provider_participant_id,
            config.protocol_port,
        )?;
        return Ok(SelectedOffer::fallback(
            offer_id,
            dataset_id,
            &provider.participant_id,
            &provider.protocol_endpoint,
        ));
    }
    CatalogRequester::new(transport, config.protocol_port).fetch(
        session,
        &args.provider.provider,
        provider_participant_id,
    )?;
    session.select_offer(args.offer_id.as_deref())
}

fn execute_asset(
    config: &ConsoleConfig,
    transport: &dyn ConnectorTransport,
    cmd: &AssetCommand,
) -> Result<String, String> {
    let ops = ProviderOperations::new(transport);
    match cmd {
        AssetCommand::Create {
            id,
            name,
            description,
            base_url,
        } => {
            let asset = AssetDocument::v1(
                id.clone(),
                name.clone(),
                description.clone(),
                base_url
                    .clone()
                    .unwrap_or_else(|| config.default_asset_data_url()),
            )
            .map_err(|e| fail(e.into()))?;
            let created = ops.create_asset(&asset).map_err(fail)?;
            Ok(format!("created asset {created}"))
        }
        AssetCommand::List { json } => {
            let items = ops.list_assets().map_err(fail)?;
            if *json {
                render::json(&items)
            } else {
                Ok(render::assets(&items))
            }
        }
    }
}

fn execute_policy(
    transport: &dyn ConnectorTransport,
    cmd: &PolicyCommand,
) -> Result<String, String> {
    let ops = ProviderOperations::new(transport);
    match cmd {
        PolicyCommand::Create {
            id,
            allowed_participant,
        } => {
            let policy = PolicyDefinitionDocument::v1(id.clone(), allowed_participant.clone())
                .map_err(|e| fail(e.into()))?;
            let created = ops.create_policy(&policy).map_err(fail)?;
            Ok(format!("created policy definition {created}"))
        }
        PolicyCommand::List { json } => {
            let items = ops.list_policies().map_err(fail)?;
            if *json {
                render::json(&items)
            } else {
                Ok(render::policies(&items))
            }
        }
    }
}

fn execute_contract_def(
    transport: &dyn ConnectorTransport,
    cmd: &ContractDefCommand,
) -> Result<String, String> {
    let ops = ProviderOperations::new(transport);
    match cmd {
        ContractDefCommand::Create {
            id,
            access_policy,
            contract_policy,
            asset,
        } => {
            let definition = ContractDefinitionDocument::v1(
                id.clone(),
                access_policy.clone(),
                contract_policy.clone().unwrap_or_else(|| access_policy.clone()),
                asset.clone(),
            )
            .map_err(|e| fail(e.into()))?;
            let created = ops.create_contract_definition(&definition).map_err(fail)?;
            Ok(format!("created contract definition {created}"))
        }
        ContractDefCommand::List { json } => {
            let items = ops.list_contract_definitions().map_err(fail)?;
            if *json {
                render::json(&items)
            } else {
                Ok(render::contract_definitions(&items))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{CatalogArgs, ProviderArgs, TransferIdArgs};
    use dsx_orchestration::test_support::ScriptedTransport;
    use dsx_orchestration::RetryPolicy;
    use serde_json::{json, Value};
    use std::time::Duration;

    fn config() -> ConsoleConfig {
        let mut cfg = ConsoleConfig::mvp_v1();
        cfg.participant_id = "participant-1".to_string();
        cfg.negotiation_retry = RetryPolicy::immediate(5);
        cfg.edr_retry = RetryPolicy::immediate(5);
        cfg.edr_settle = Duration::ZERO;
        cfg
    }

    fn offer_args(offer_id: Option<&str>, dataset_id: Option<&str>) -> OfferArgs {
        OfferArgs {
            provider: ProviderArgs {
                provider: "provider.example".to_string(),
                provider_participant_id: None,
            },
            offer_id: offer_id.map(str::to_string),
            dataset_id: dataset_id.map(str::to_string),
        }
    }

    fn transfer_id(id: &str) -> TransferIdArgs {
        TransferIdArgs {
            transfer_id: id.to_string(),
        }
    }

    #[test]
    fn at_console_01_health_reports_both_services() {
        let transport = ScriptedTransport::new()
            .reply_text(405, "")
            .fail("connection");
        let out = execute_console_command(&config(), &transport, &Command::Health).unwrap();
        assert!(out.starts_with("connector: online\n"));
        assert!(out.contains("data api: offline"));
    }

    #[test]
    fn at_console_02_asset_create_defaults_base_url() {
        let transport = ScriptedTransport::new().reply(200, json!({"@id": "asset-1"}));
        let cmd = Command::Asset(AssetCommand::Create {
            id: "asset-1".to_string(),
            name: "Files".to_string(),
            description: String::new(),
            base_url: None,
        });
        let out = execute_console_command(&config(), &transport, &cmd).unwrap();
        assert_eq!(out, "created asset asset-1");
        let body = transport.calls()[0].body.clone().unwrap().to_string();
        assert!(body.contains(":8000/files/list"));
    }

    #[test]
    fn at_console_03_rejection_prints_hint() {
        let transport = ScriptedTransport::new().reply(409, json!("policy already exists"));
        let cmd = Command::Policy(PolicyCommand::Create {
            id: "pol-1".to_string(),
            allowed_participant: None,
        });
        let err = execute_console_command(&config(), &transport, &cmd).unwrap_err();
        assert!(err.starts_with("create policy rejected with HTTP 409"));
        assert!(err.contains("\nhint: duplicate"));
    }

    #[test]
    fn at_console_04_consume_runs_catalog_then_flow() {
        let transport = ScriptedTransport::new()
            .reply(
                200,
                json!({"dcat:dataset": {"@id": "asset-1", "odrl:hasPolicy": {"@id": "offer-1"}}}),
            )
            .reply(200, json!({"@id": "neg-1"}))
            .reply(200, json!({"state": "FINALIZED", "contractAgreementId": "agr-1"}))
            .reply(200, json!({"@id": "tp-1"}))
            .reply(200, json!({"endpoint": "http://dp/public", "authorization": "tok"}))
            .reply(200, json!({"rows": 2}));
        let cmd = Command::Consume(offer_args(None, None));
        let out = execute_console_command(&config(), &transport, &cmd).unwrap();
        assert!(out.contains("agreement: agr-1"));
        assert!(out.contains("transfer: tp-1"));
        assert!(out.contains("\"rows\": 2"));
        assert_eq!(transport.calls()[0].target, "/management/v3/catalog/request");
    }

    #[test]
    fn at_console_05_negotiate_fallback_offer_skips_catalog() {
        let transport = ScriptedTransport::new()
            .reply(200, json!({"@id": "neg-1"}))
            .reply(200, json!({"state": "FINALIZED", "contractAgreementId": "agr-1"}));
        let cmd = Command::Negotiate(offer_args(Some("offer-x"), Some("asset-9")));
        let out = execute_console_command(&config(), &transport, &cmd).unwrap();
        assert!(out.contains("agreement: agr-1\n"));
        assert!(out.ends_with(
            "next: dsx transfer --agreement-id agr-1 --asset-id asset-9 --provider provider.example"
        ));
        let calls = transport.calls();
        let policy = calls[0].body.as_ref().unwrap()["policy"].clone();
        assert_eq!(policy["@id"], "offer-x");
        assert_eq!(policy["odrl:target"], json!({"@id": "asset-9"}));
        assert_eq!(calls[0].target, "/management/v3/contractnegotiations");
    }

    #[test]
    fn at_console_06_blocked_catalog_has_nothing_to_consume() {
        let transport = ScriptedTransport::new().reply(
            200,
            json!({"dcat:dataset": {"@id": "asset-1", "odrl:hasPolicy": {
                "@id": "offer-1",
                "odrl:permission": {"odrl:constraint": {
                    "odrl:leftOperand": "participantId",
                    "odrl:operator": "odrl:eq",
                    "odrl:rightOperand": "participant-2"
                }}
            }}}),
        );
        let cmd = Command::Consume(offer_args(None, None));
        let err = execute_console_command(&config(), &transport, &cmd).unwrap_err();
        assert!(err.contains("no accessible offers"));
    }

    #[test]
    fn at_console_07_catalog_json_output() {
        let transport = ScriptedTransport::new().reply(
            200,
            json!({"dcat:dataset": {"@id": "asset-1", "odrl:hasPolicy": {"@id": "offer-1"}}}),
        );
        let cmd = Command::Catalog(CatalogArgs {
            provider: ProviderArgs {
                provider: "provider.example".to_string(),
                provider_participant_id: None,
            },
            json: true,
        });
        let out = execute_console_command(&config(), &transport, &cmd).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["accessible_datasets"][0]["dataset_id"], "asset-1");
        assert_eq!(
            value["accessible_datasets"][0]["accessible_offers"][0]["evaluation"]["basis"],
            "NO_PERMISSIONS"
        );
    }

    #[test]
    fn at_console_08_transfer_resumes_from_an_agreement() {
        let transport = ScriptedTransport::new().reply(200, json!({"@id": "tp-1"}));
        let cmd = Command::Transfer(TransferArgs {
            agreement_id: "agr-1".to_string(),
            asset_id: "asset-1".to_string(),
            provider: "provider.example".to_string(),
        });
        let out = execute_console_command(&config(), &transport, &cmd).unwrap();
        assert_eq!(out, "transfer: tp-1\nnext: dsx pull --transfer-id tp-1");
        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].target, "/management/v3/transferprocesses");
        let body = calls[0].body.as_ref().unwrap();
        assert_eq!(body["contractId"], "agr-1");
        assert_eq!(body["assetId"], "asset-1");
        assert_eq!(body["counterPartyAddress"], "http://provider.example:19194/protocol");
    }

    #[test]
    fn at_console_09_transfer_rejects_bad_provider_before_any_call() {
        let transport = ScriptedTransport::new();
        let cmd = Command::Transfer(TransferArgs {
            agreement_id: "agr-1".to_string(),
            asset_id: "asset-1".to_string(),
            provider: "http://provider.example".to_string(),
        });
        assert!(execute_console_command(&config(), &transport, &cmd).is_err());
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn at_console_10_edr_resolves_a_known_transfer() {
        let transport = ScriptedTransport::new()
            .reply_text(404, "")
            .reply(
                200,
                json!({"endpoint": "http://dp/public", "authorization": "abcdefghijklmnopqrstuvwxyz"}),
            );
        let cmd = Command::Edr(transfer_id("tp-7"));
        let out = execute_console_command(&config(), &transport, &cmd).unwrap();
        assert!(out.starts_with("endpoint: http://dp/public\n"));
        assert!(!out.contains("uvwxyz"));
        assert!(out.ends_with("next: dsx pull --transfer-id tp-7"));
        assert_eq!(transport.calls()[0].target, "/management/v3/edrs/tp-7/dataaddress");
    }

    #[test]
    fn at_console_11_edr_timeout_names_the_resume_command() {
        let transport = ScriptedTransport::new().reply_times(5, 404, json!({}));
        let err = execute_console_command(&config(), &transport, &Command::Edr(transfer_id("tp-7")))
            .unwrap_err();
        assert!(err.contains("transfer tp-7"));
        assert!(err.contains("hint: the transfer id is kept; resume with `dsx pull --transfer-id"));
    }

    #[test]
    fn at_console_12_pull_resolves_then_fetches_with_credential() {
        let transport = ScriptedTransport::new()
            .reply(200, json!({"endpoint": "http://dp/public", "authorization": "tok"}))
            .reply(200, json!({"rows": 2}));
        let out = execute_console_command(&config(), &transport, &Command::Pull(transfer_id("tp-1")))
            .unwrap();
        assert!(out.contains("endpoint: http://dp/public"));
        assert!(out.ends_with("{\n  \"rows\": 2\n}"));
        let calls = transport.calls();
        assert_eq!(calls[1].target, "http://dp/public");
        assert_eq!(calls[1].authorization.as_deref(), Some("tok"));
    }

    #[test]
    fn at_console_13_fetch_uses_given_data_address() {
        let transport = ScriptedTransport::new().reply_text(200, "id,value\n1,2");
        let cmd = Command::Fetch(FetchArgs {
            endpoint: "http://dp/public".to_string(),
            authorization: "tok".to_string(),
        });
        let out = execute_console_command(&config(), &transport, &cmd).unwrap();
        assert_eq!(out, "id,value\n1,2");
        assert_eq!(transport.calls()[0].authorization.as_deref(), Some("tok"));

        let transport = ScriptedTransport::new().reply_text(401, "Unauthorized");
        let err = execute_console_command(&config(), &transport, &cmd).unwrap_err();
        assert!(err.contains("dsx negotiate"));

        let blank = Command::Fetch(FetchArgs {
            endpoint: "http://dp/public".to_string(),
            authorization: " ".to_string(),
        });
        let transport = ScriptedTransport::new();
        assert!(execute_console_command(&config(), &transport, &blank).is_err());
        assert!(transport.calls().is_empty());
    }
}
