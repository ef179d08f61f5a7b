#![forbid(unsafe_code)]

pub mod catalog_filter;
pub mod edr_endpoint;
pub mod fetch_classify;
pub mod policy_eval;
pub mod rejection_hint;
