#![forbid(unsafe_code)]

use std::env;
use std::thread;
use std::time::Duration;

use dsx_contracts::catalog::DEFAULT_PROTOCOL_PORT;
use dsx_contracts::common::validate_http_url;
use dsx_contracts::{ContractViolation, Validate};

pub const DEFAULT_MANAGEMENT_URL: &str = "http://edc-connector:19193";
pub const DEFAULT_PROTOCOL_URL: &str = "http://edc-connector:19194/protocol";
pub const DEFAULT_API_KEY: &str = "password";
pub const DEFAULT_PARTICIPANT: &str = "sample-participant-1.handson.dataspace.internal";
pub const DEFAULT_DATA_API_URL: &str = "http://data-api:8000";

const REQUEST_TIMEOUT_MS_DEFAULT: u64 = 30_000;
const NEGOTIATION_POLL_INTERVAL_MS_DEFAULT: u64 = 2_000;
const NEGOTIATION_POLL_MAX_ATTEMPTS_DEFAULT: u16 = 30;
const EDR_POLL_INTERVAL_MS_DEFAULT: u64 = 2_000;
const EDR_POLL_MAX_ATTEMPTS_DEFAULT: u16 = 15;
const EDR_SETTLE_MS_DEFAULT: u64 = 3_000;

/// Fixed-interval polling. Every attempt sleeps first, then asks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval: Duration,
    pub max_attempts: u16,
}

impl RetryPolicy {
    pub fn negotiation_default() -> Self {
        Self {
            interval: Duration::from_millis(NEGOTIATION_POLL_INTERVAL_MS_DEFAULT),
            max_attempts: NEGOTIATION_POLL_MAX_ATTEMPTS_DEFAULT,
        }
    }

    pub fn edr_default() -> Self {
        Self {
            interval: Duration::from_millis(EDR_POLL_INTERVAL_MS_DEFAULT),
            max_attempts: EDR_POLL_MAX_ATTEMPTS_DEFAULT,
        }
    }

    pub fn immediate(max_attempts: u16) -> Self {
        Self {
            interval: Duration::ZERO,
            max_attempts,
        }
    }

    pub fn pause(&self) {
        if !self.interval.is_zero() {
            thread::sleep(self.interval);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    pub management_url: String,
    /// Our own protocol endpoint; used as counterparty when no provider
    /// catalog has been fetched.
    pub protocol_url: String,
    pub api_key: String,
    pub participant_id: String,
    pub participant_fqdn: String,
    pub data_api_url: String,
    pub protocol_port: u16,
    pub request_timeout_ms: u64,
    pub negotiation_retry: RetryPolicy,
    pub edr_retry: RetryPolicy,
    pub edr_settle: Duration,
    pub short_circuit_on_terminal_failure: bool,
}

impl ConsoleConfig {
    pub fn mvp_v1() -> Self {
        Self {
            management_url: DEFAULT_MANAGEMENT_URL.to_string(),
            protocol_url: DEFAULT_PROTOCOL_URL.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            participant_id: DEFAULT_PARTICIPANT.to_string(),
            participant_fqdn: DEFAULT_PARTICIPANT.to_string(),
            data_api_url: DEFAULT_DATA_API_URL.to_string(),
            protocol_port: DEFAULT_PROTOCOL_PORT,
            request_timeout_ms: REQUEST_TIMEOUT_MS_DEFAULT,
            negotiation_retry: RetryPolicy::negotiation_default(),
            edr_retry: RetryPolicy::edr_default(),
            edr_settle: Duration::from_millis(EDR_SETTLE_MS_DEFAULT),
            short_circuit_on_terminal_failure: true,
        }
    }

    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Unset, blank or out-of-range values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::mvp_v1();
        let text = |key: &str, default: String| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
        };
        let number = |key: &str, min: u64, max: u64, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .filter(|v| (min..=max).contains(v))
                .unwrap_or(default)
        };

        let negotiation_retry = RetryPolicy {
            interval: Duration::from_millis(number(
                "DSX_NEGOTIATION_POLL_INTERVAL_MS",
                0,
                60_000,
                NEGOTIATION_POLL_INTERVAL_MS_DEFAULT,
            )),
            max_attempts: number(
                "DSX_NEGOTIATION_POLL_MAX_ATTEMPTS",
                1,
                1_000,
                u64::from(NEGOTIATION_POLL_MAX_ATTEMPTS_DEFAULT),
            ) as u16,
        };
        let edr_retry = RetryPolicy {
            interval: Duration::from_millis(number(
                "DSX_EDR_POLL_INTERVAL_MS",
                0,
                60_000,
                EDR_POLL_INTERVAL_MS_DEFAULT,
            )),
            max_attempts: number(
                "DSX_EDR_POLL_MAX_ATTEMPTS",
                1,
                1_000,
                u64::from(EDR_POLL_MAX_ATTEMPTS_DEFAULT),
            ) as u16,
        };
        let short_circuit_on_terminal_failure = lookup("DSX_SHORT_CIRCUIT_TERMINAL")
            .map(|v| v.trim().to_ascii_lowercase())
            .map(|v| !matches!(v.as_str(), "0" | "false" | "off" | "no"))
            .unwrap_or(defaults.short_circuit_on_terminal_failure);

        Self {
            management_url: text("DSX_MANAGEMENT_URL", defaults.management_url),
            protocol_url: text("DSX_PROTOCOL_URL", defaults.protocol_url),
            api_key: text("DSX_API_KEY", defaults.api_key),
            participant_id: text("PARTICIPANT_ID", defaults.participant_id),
            participant_fqdn: text("PARTICIPANT_FQDN", defaults.participant_fqdn),
            data_api_url: text("DSX_DATA_API_URL", defaults.data_api_url),
            protocol_port: number(
                "DSX_PROTOCOL_PORT",
                1,
                u64::from(u16::MAX),
                u64::from(DEFAULT_PROTOCOL_PORT),
            ) as u16,
            request_timeout_ms: number(
                "DSX_REQUEST_TIMEOUT_MS",
                100,
                120_000,
                REQUEST_TIMEOUT_MS_DEFAULT,
            ),
            negotiation_retry,
            edr_retry,
            edr_settle: Duration::from_millis(number(
                "DSX_EDR_SETTLE_MS",
                0,
                60_000,
                EDR_SETTLE_MS_DEFAULT,
            )),
            short_circuit_on_terminal_failure,
        }
    }

    /// Source URL suggested for a new asset: the participant's own data API.
    pub fn default_asset_data_url(&self) -> String {
        format!("http://{}:8000/files/list", self.participant_fqdn)
    }
}

impl Validate for ConsoleConfig {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_http_url("console_config.management_url", &self.management_url)?;
        validate_http_url("console_config.protocol_url", &self.protocol_url)?;
        validate_http_url("console_config.data_api_url", &self.data_api_url)?;
        if self.api_key.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "console_config.api_key",
                reason: "must not be empty",
            });
        }
        if self.participant_id.trim().is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "console_config.participant_id",
                reason: "must not be empty",
            });
        }
        if !(100..=120_000).contains(&self.request_timeout_ms) {
            return Err(ContractViolation::InvalidRange {
                field: "console_config.request_timeout_ms",
                min: 100.0,
                max: 120_000.0,
                got: self.request_timeout_ms as f64,
            });
        }
        if self.negotiation_retry.max_attempts == 0 || self.edr_retry.max_attempts == 0 {
            return Err(ContractViolation::InvalidValue {
                field: "console_config.retry",
                reason: "max_attempts must be at least 1",
            });
        }
        Ok(())
    }
}
