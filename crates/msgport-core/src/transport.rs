//! The transport seam.
//!
//! A [`Transport`] moves messages between applications, mints port ids,
//! resolves application identity and verifies certificates. The core only
//! decides which transport entry point to call and what to do with the
//! result.
//!
//! All methods block until the transport answers.

use msgport_types::{DeliveryEvent, Payload, PortId, RemoteAddress, TransportCode, TrustDomain};
use std::sync::Weak;

/// Result of binding a port name with the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindOutcome {
    /// A fresh binding with a newly minted id.
    Created(PortId),
    /// The name was already bound in that domain; this is its existing id.
    Existing(PortId),
}

impl BindOutcome {
    /// The port id either way.
    pub fn id(self) -> PortId {
        match self {
            BindOutcome::Created(id) | BindOutcome::Existing(id) => id,
        }
    }
}

/// Receiver of inbound deliveries.
///
/// Implemented by the dispatch router. Transports may call `deliver` from
/// any thread.
pub trait DeliverySink: Send + Sync {
    /// Hand one delivery to the local side. Never fails; undeliverable
    /// events are dropped by the sink.
    fn deliver(&self, event: DeliveryEvent);
}

/// Inter-process transport used by the registry and the send gateway.
pub trait Transport: Send + Sync {
    /// Tell the transport where inbound deliveries for this application go.
    ///
    /// Called once when a `MessagePort` is built. The sink is weak so the
    /// transport never keeps the local side alive.
    fn attach(&self, _sink: Weak<dyn DeliverySink>) {}

    /// Bind a local port name in a domain and return its id.
    fn bind(&self, name: &str, domain: TrustDomain) -> Result<BindOutcome, TransportCode>;

    /// Release a binding made by [`Transport::bind`].
    fn unbind(&self, id: PortId) -> Result<(), TransportCode>;

    /// Whether the remote port exists in the given domain.
    fn check_remote(
        &self,
        remote: &RemoteAddress,
        domain: TrustDomain,
    ) -> Result<bool, TransportCode>;

    /// One-way send.
    fn send(
        &self,
        remote: &RemoteAddress,
        domain: TrustDomain,
        payload: &Payload,
    ) -> Result<(), TransportCode>;

    /// Send carrying `local` as the reply address.
    fn send_bidirectional(
        &self,
        local: PortId,
        remote: &RemoteAddress,
        domain: TrustDomain,
        payload: &Payload,
    ) -> Result<(), TransportCode>;
}
