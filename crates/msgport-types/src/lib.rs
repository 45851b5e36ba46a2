//! Core types for msgport, the on-device message port layer.
//!
//! This crate defines the data shared by the registry, the dispatch router,
//! the send gateway and any `Transport` implementation. It contains no
//! business logic.

pub mod config;
pub mod error;
pub mod message;
pub mod payload;
pub mod port;

pub use config::MessagePortConfig;
pub use error::{MessagePortError, MessagePortResult, TransportCode};
pub use message::{DeliveryEvent, InboundMessage};
pub use payload::{Payload, PayloadValue};
pub use port::{PortId, RemoteAddress, TrustDomain};
