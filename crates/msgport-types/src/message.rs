//! Inbound delivery types.

use crate::payload::Payload;
use crate::port::PortId;
use serde::{Deserialize, Serialize};

/// A delivery notification produced by a transport.
///
/// Consumed exactly once by the dispatch router and never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryEvent {
    /// Local port the message is addressed to.
    pub target: PortId,
    /// Application id of the sender.
    pub sender_app_id: String,
    /// Sender's reply port, present only for bidirectional sends.
    pub sender_port: Option<String>,
    /// Whether the sender's reply port is a trusted port.
    pub sender_trusted: bool,
    /// Message body.
    pub payload: Payload,
}

impl DeliveryEvent {
    /// A one-way delivery (no reply port).
    pub fn one_way(target: PortId, sender_app_id: impl Into<String>, payload: Payload) -> Self {
        Self {
            target,
            sender_app_id: sender_app_id.into(),
            sender_port: None,
            sender_trusted: false,
            payload,
        }
    }

    /// A delivery carrying the sender's reply port.
    pub fn with_reply_port(
        target: PortId,
        sender_app_id: impl Into<String>,
        sender_port: impl Into<String>,
        sender_trusted: bool,
        payload: Payload,
    ) -> Self {
        Self {
            target,
            sender_app_id: sender_app_id.into(),
            sender_port: Some(sender_port.into()),
            sender_trusted,
            payload,
        }
    }
}

/// What a listener receives. The listener owns the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// The local port the message arrived on.
    pub local_port_id: PortId,
    /// Sender application id.
    pub remote_app_id: String,
    /// Sender reply port, if the sender supplied one.
    pub remote_port: Option<String>,
    /// Whether `remote_port` is a trusted port.
    pub trusted_remote_port: bool,
    pub payload: Payload,
}

impl From<DeliveryEvent> for InboundMessage {
    fn from(event: DeliveryEvent) -> Self {
        Self {
            local_port_id: event.target,
            remote_app_id: event.sender_app_id,
            remote_port: event.sender_port,
            trusted_remote_port: event.sender_trusted,
            payload: event.payload,
        }
    }
}
