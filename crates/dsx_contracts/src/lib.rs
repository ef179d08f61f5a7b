#![forbid(unsafe_code)]

pub mod catalog;
pub mod common;
pub mod fetch;
pub mod jsonld;
pub mod management;
pub mod negotiation;
pub mod policy;
pub mod transfer;

pub use common::{ContractViolation, Validate};
