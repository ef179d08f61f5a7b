#![forbid(unsafe_code)]

use tracing::debug;

use crate::transport::ConnectorTransport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceStatus {
    Online,
    Offline { reason: String },
}

impl ServiceStatus {
    pub fn is_online(&self) -> bool {
        matches!(self, ServiceStatus::Online)
    }
}

/// The asset listing answers 405 to a plain GET on some connector builds;
/// that still proves the management API is up.
pub fn probe_connector(transport: &dyn ConnectorTransport) -> ServiceStatus {
    match transport.get_management("/management/v3/assets") {
        Ok(reply) if matches!(reply.status, 200 | 405) => ServiceStatus::Online,
        Ok(reply) => ServiceStatus::Offline {
            reason: format!("HTTP {}", reply.status),
        },
        Err(err) => {
            debug!(error = %err, "connector probe failed");
            ServiceStatus::Offline {
                reason: err.to_string(),
            }
        }
    }
}

pub fn probe_data_api(transport: &dyn ConnectorTransport, data_api_url: &str) -> ServiceStatus {
    let url = format!("{}/health", data_api_url.trim_end_matches('/'));
    match transport.get_url(&url, None) {
        Ok(reply) if reply.is_ok() => ServiceStatus::Online,
        Ok(reply) => ServiceStatus::Offline {
            reason: format!("HTTP {}", reply.status),
        },
        Err(err) => {
            debug!(error = %err, "data API probe failed");
            ServiceStatus::Offline {
                reason: err.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedTransport;

    #[test]
    fn at_health_01_connector_online_on_200_or_405() {
        let transport = ScriptedTransport::new()
            .reply_text(200, "[]")
            .reply_text(405, "")
            .reply_text(500, "");
        assert!(probe_connector(&transport).is_online());
        assert!(probe_connector(&transport).is_online());
        assert_eq!(
            probe_connector(&transport),
            ServiceStatus::Offline {
                reason: "HTTP 500".to_string()
            }
        );
    }

    #[test]
    fn at_health_02_data_api_probe_hits_health_path() {
        let transport = ScriptedTransport::new().reply_text(200, "ok").fail("dns");
        assert!(probe_data_api(&transport, "http://data-api:8000/").is_online());
        assert!(!probe_data_api(&transport, "http://data-api:8000").is_online());
        assert_eq!(transport.calls()[0].target, "http://data-api:8000/health");
    }
}
