#![forbid(unsafe_code)]

pub mod catalog;
pub mod config;
pub mod edr;
pub mod error;
pub mod fetch;
pub mod flow;
pub mod health;
pub mod negotiation;
pub mod provider;
pub mod session;
pub mod transfer;
pub mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{ConsoleConfig, RetryPolicy};
pub use error::{FlowError, TransportError};
pub use session::{ExchangeSession, SelectedOffer};
pub use transport::{ConnectorTransport, HttpReply, UreqConnectorTransport};
