#![forbid(unsafe_code)]

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "dsx")]
#[command(version, about = "Operator console for a dataspace connector", long_about = None)]
pub struct Cli {
    /// Log request payloads and every poll iteration.
    #[arg(long, global = true)]
    pub debug: bool,

    /// Overrides PARTICIPANT_ID.
    #[arg(long, global = true, value_name = "ID")]
    pub participant_id: Option<String>,

    /// Overrides DSX_MANAGEMENT_URL.
    #[arg(long, global = true, value_name = "URL")]
    pub management_url: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Check the connector and the data API.
    Health,
    /// Manage published assets.
    #[command(subcommand)]
    Asset(AssetCommand),
    /// Manage access policies.
    #[command(subcommand)]
    Policy(PolicyCommand),
    /// Manage contract definitions.
    #[command(subcommand)]
    ContractDef(ContractDefCommand),
    /// Fetch a provider's catalog and show what this participant may use.
    Catalog(CatalogArgs),
    /// Negotiate a contract for one offer.
    Negotiate(OfferArgs),
    /// Negotiate, transfer and fetch the data of one offer.
    Consume(OfferArgs),
    /// Start a pull transfer for an agreement reached earlier.
    Transfer(TransferArgs),
    /// Resolve the data address of a started transfer.
    Edr(TransferIdArgs),
    /// Resolve the data address of a started transfer and fetch its data.
    Pull(TransferIdArgs),
    /// Fetch data from a known data address.
    Fetch(FetchArgs),
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum AssetCommand {
    Create {
        #[arg(long)]
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Defaults to the participant's own data API.
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },
    List {
        /// Print the summaries as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum PolicyCommand {
    Create {
        #[arg(long)]
        id: String,
        /// Restrict use to this participant; open to everyone when omitted.
        #[arg(long, value_name = "ID")]
        allowed_participant: Option<String>,
    },
    List {
        /// Print the summaries as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ContractDefCommand {
    Create {
        #[arg(long)]
        id: String,
        #[arg(long, value_name = "POLICY_ID")]
        access_policy: String,
        /// Defaults to the access policy.
        #[arg(long, value_name = "POLICY_ID")]
        contract_policy: Option<String>,
        #[arg(long, value_name = "ASSET_ID")]
        asset: String,
    },
    List {
        /// Print the summaries as JSON.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ProviderArgs {
    /// Provider host name, e.g. sample-participant-2.handson.dataspace.internal
    #[arg(long, value_name = "FQDN")]
    pub provider: String,

    /// Defaults to the provider FQDN.
    #[arg(long, value_name = "ID")]
    pub provider_participant_id: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CatalogArgs {
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Print the partitioned catalog as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct OfferArgs {
    #[command(flatten)]
    pub provider: ProviderArgs,

    /// First accessible offer when omitted.
    #[arg(long, value_name = "OFFER_ID")]
    pub offer_id: Option<String>,

    /// Negotiate `--offer-id` for this dataset without consulting the
    /// catalog.
    #[arg(long, value_name = "DATASET_ID", requires = "offer_id")]
    pub dataset_id: Option<String>,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TransferArgs {
    #[arg(long, value_name = "ID")]
    pub agreement_id: String,

    #[arg(long, value_name = "ASSET_ID")]
    pub asset_id: String,

    /// Provider host name the agreement was reached with.
    #[arg(long, value_name = "FQDN")]
    pub provider: String,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct TransferIdArgs {
    #[arg(long, value_name = "ID")]
    pub transfer_id: String,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct FetchArgs {
    #[arg(long, value_name = "URL")]
    pub endpoint: String,

    /// Sent as the `Authorization` header verbatim.
    #[arg(long, value_name = "TOKEN")]
    pub authorization: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_cli_01_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "dsx",
            "catalog",
            "--provider",
            "p2.example",
            "--debug",
            "--participant-id",
            "p1",
            "--json",
        ])
        .unwrap();
        assert!(cli.debug);
        assert_eq!(cli.participant_id.as_deref(), Some("p1"));
        assert_eq!(
            cli.command,
            Command::Catalog(CatalogArgs {
                provider: ProviderArgs {
                    provider: "p2.example".to_string(),
                    provider_participant_id: None,
                },
                json: true,
            })
        );
    }

    #[test]
    fn at_cli_02_nested_create_commands() {
        let cli = Cli::try_parse_from([
            "dsx",
            "contract-def",
            "create",
            "--id",
            "cd-1",
            "--access-policy",
            "pol-1",
            "--asset",
            "asset-1",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::ContractDef(ContractDefCommand::Create {
                id: "cd-1".to_string(),
                access_policy: "pol-1".to_string(),
                contract_policy: None,
                asset: "asset-1".to_string(),
            })
        );
    }

    #[test]
    fn at_cli_04_list_json_flag_defaults_off() {
        let cli = Cli::try_parse_from(["dsx", "asset", "list"]).unwrap();
        assert_eq!(cli.command, Command::Asset(AssetCommand::List { json: false }));
        let cli = Cli::try_parse_from(["dsx", "policy", "list", "--json"]).unwrap();
        assert_eq!(cli.command, Command::Policy(PolicyCommand::List { json: true }));
    }

    #[test]
    fn at_cli_03_dataset_requires_offer_id() {
        assert!(Cli::try_parse_from([
            "dsx",
            "negotiate",
            "--provider",
            "p2.example",
            "--dataset-id",
            "asset-1",
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "dsx",
            "consume",
            "--provider",
            "p2.example",
            "--offer-id",
            "o-1",
            "--dataset-id",
            "asset-1",
        ])
        .is_ok());
    }

    #[test]
    fn at_cli_05_resume_commands_parse() {
        let cli = Cli::try_parse_from([
            "dsx",
            "transfer",
            "--agreement-id",
            "agr-1",
            "--asset-id",
            "asset-1",
            "--provider",
            "p2.example",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Transfer(TransferArgs {
                agreement_id: "agr-1".to_string(),
                asset_id: "asset-1".to_string(),
                provider: "p2.example".to_string(),
            })
        );
        let cli = Cli::try_parse_from(["dsx", "edr", "--transfer-id", "tp-1"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Edr(TransferIdArgs {
                transfer_id: "tp-1".to_string()
            })
        );
        let cli = Cli::try_parse_from(["dsx", "pull", "--transfer-id", "tp-1"]).unwrap();
        assert!(matches!(cli.command, Command::Pull(_)));
        let cli = Cli::try_parse_from([
            "dsx",
            "fetch",
            "--endpoint",
            "http://dp/public",
            "--authorization",
            "tok",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Command::Fetch(FetchArgs {
                endpoint: "http://dp/public".to_string(),
                authorization: "tok".to_string(),
            })
        );
    }

    #[test]
    fn at_cli_06_resume_commands_require_their_ids() {
        assert!(Cli::try_parse_from(["dsx", "transfer", "--agreement-id", "agr-1"]).is_err());
        assert!(Cli::try_parse_from(["dsx", "edr"]).is_err());
        assert!(Cli::try_parse_from(["dsx", "fetch", "--endpoint", "http://dp/public"]).is_err());
    }
}
