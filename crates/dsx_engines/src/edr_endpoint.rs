#![forbid(unsafe_code)]

use once_cell::sync::Lazy;
use regex::Regex;

/// `${NAME:default}` as left unresolved by a data plane that did not have
/// `NAME` set in its environment.
static ENDPOINT_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([^:{}]+):([^}]*)\}").expect("endpoint placeholder pattern must compile")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEndpoint {
    pub endpoint: String,
    pub placeholder_variable: Option<String>,
}

/// A templated endpoint resolves to the template's default value; the
/// template text and the variable name are discarded. Anything else is
/// returned verbatim.
pub fn resolve_endpoint_placeholder(endpoint: &str) -> ResolvedEndpoint {
    match ENDPOINT_PLACEHOLDER.captures(endpoint) {
        Some(caps) => ResolvedEndpoint {
            endpoint: caps[2].to_string(),
            placeholder_variable: Some(caps[1].to_string()),
        },
        None => ResolvedEndpoint {
            endpoint: endpoint.to_string(),
            placeholder_variable: None,
        },
    }
}
