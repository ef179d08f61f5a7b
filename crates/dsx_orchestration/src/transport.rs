#![forbid(unsafe_code)]

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use crate::config::ConsoleConfig;
use crate::error::TransportError;

/// Status and raw body of an answered request. Non-2xx statuses are
/// replies too; only failures without a status are transport errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Create calls answer 200 or 201 depending on connector version.
    pub fn is_created(&self) -> bool {
        matches!(self.status, 200 | 201)
    }

    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.body).ok()
    }
}

pub trait ConnectorTransport {
    /// POST a JSON document to a management API path.
    fn post_management(&self, path: &str, body: &Value) -> Result<HttpReply, TransportError>;

    /// GET a management API path.
    fn get_management(&self, path: &str) -> Result<HttpReply, TransportError>;

    /// GET an absolute URL outside the management API (data plane, probes).
    /// The authorization value is sent verbatim when given.
    fn get_url(&self, url: &str, authorization: Option<&str>) -> Result<HttpReply, TransportError>;
}

pub struct UreqConnectorTransport {
    agent: ureq::Agent,
    management_url: String,
    api_key: String,
}

impl UreqConnectorTransport {
    pub fn from_config(config: &ConsoleConfig) -> Self {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout.min(Duration::from_secs(10)))
            .timeout_read(timeout)
            .timeout_write(timeout)
            .build();
        Self {
            agent,
            management_url: config.management_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    fn management_target(&self, path: &str) -> String {
        format!("{}{}", self.management_url, path)
    }
}

impl ConnectorTransport for UreqConnectorTransport {
    fn post_management(&self, path: &str, body: &Value) -> Result<HttpReply, TransportError> {
        let target = self.management_target(path);
        debug!(url = %target, payload = %body, "management POST");
        let result = self
            .agent
            .post(&target)
            .set("content-type", "application/json")
            .set("x-api-key", &self.api_key)
            .send_string(&body.to_string());
        into_reply("POST", &target, result)
    }

    fn get_management(&self, path: &str) -> Result<HttpReply, TransportError> {
        let target = self.management_target(path);
        debug!(url = %target, "management GET");
        let result = self
            .agent
            .get(&target)
            .set("content-type", "application/json")
            .set("x-api-key", &self.api_key)
            .call();
        into_reply("GET", &target, result)
    }

    fn get_url(&self, url: &str, authorization: Option<&str>) -> Result<HttpReply, TransportError> {
        debug!(url = %url, authorized = authorization.is_some(), "GET");
        let mut req = self.agent.get(url);
        if let Some(value) = authorization {
            req = req.set("authorization", value);
        }
        into_reply("GET", url, req.call())
    }
}

fn into_reply(
    method: &str,
    target: &str,
    result: Result<ureq::Response, ureq::Error>,
) -> Result<HttpReply, TransportError> {
    let label = format!("{method} {target}");
    let reply = match result {
        Ok(resp) => read_reply(&label, resp)?,
        Err(ureq::Error::Status(_, resp)) => read_reply(&label, resp)?,
        Err(ureq::Error::Transport(err)) => {
            return Err(TransportError::new(
                transport_kind(&err),
                label,
                err.to_string(),
            ))
        }
    };
    debug!(url = %target, status = reply.status, "reply");
    Ok(reply)
}

fn read_reply(label: &str, resp: ureq::Response) -> Result<HttpReply, TransportError> {
    let status = resp.status();
    let body = resp
        .into_string()
        .map_err(|err| TransportError::new(io_kind(&err), label, err.to_string()))?;
    Ok(HttpReply { status, body })
}

fn transport_kind(err: &ureq::Transport) -> &'static str {
    let text = err.to_string().to_ascii_lowercase();
    match err.kind() {
        ureq::ErrorKind::Dns => "dns",
        _ if text.contains("timed out") || text.contains("timeout") => "timeout",
        _ if text.contains("tls") || text.contains("certificate") => "tls",
        ureq::ErrorKind::ConnectionFailed => "connection",
        _ => "transport",
    }
}

fn io_kind(err: &std::io::Error) -> &'static str {
    match err.kind() {
        std::io::ErrorKind::TimedOut | std::io::ErrorKind::WouldBlock => "timeout",
        _ => "transport",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn at_transport_01_reply_status_helpers() {
        assert!(HttpReply::new(200, "").is_ok());
        assert!(HttpReply::new(201, "").is_created());
        assert!(!HttpReply::new(201, "").is_ok());
        assert!(!HttpReply::new(204, "").is_created());
    }

    #[test]
    fn at_transport_02_reply_json_is_lenient() {
        assert_eq!(HttpReply::new(200, r#"{"@id":"a"}"#).json(), Some(json!({"@id": "a"})));
        assert_eq!(HttpReply::new(200, "not json").json(), None);
    }

    #[test]
    fn at_transport_03_management_target_strips_trailing_slash() {
        let mut cfg = ConsoleConfig::mvp_v1();
        cfg.management_url = "http://localhost:19193/".to_string();
        let transport = UreqConnectorTransport::from_config(&cfg);
        assert_eq!(
            transport.management_target("/management/v3/assets"),
            "http://localhost:19193/management/v3/assets"
        );
    }

    #[test]
    fn at_transport_04_unreachable_host_is_a_transport_error() {
        let mut cfg = ConsoleConfig::mvp_v1();
        cfg.management_url = "http://127.0.0.1:9".to_string();
        cfg.request_timeout_ms = 500;
        let transport = UreqConnectorTransport::from_config(&cfg);
        let err = transport.get_management("/management/v3/assets").unwrap_err();
        assert!(err.target.starts_with("GET http://127.0.0.1:9"));
    }
}
