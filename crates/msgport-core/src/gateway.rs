//! Send gateway — outbound precondition checks.
//!
//! Every send variant funnels through [`SendGateway`]. Argument problems and
//! an unregistered reply port are caught here, before the transport is
//! contacted. Certificate checks for trusted sends are left to the
//! transport; the gateway only picks the entry point.

use crate::registry::PortRegistry;
use crate::translate::ErrorTranslator;
use crate::transport::Transport;
use msgport_types::{
    MessagePortConfig, MessagePortError, MessagePortResult, Payload, PortId, RemoteAddress,
    TransportCode, TrustDomain,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Validates and forwards outbound sends.
pub struct SendGateway {
    registry: Arc<PortRegistry>,
    transport: Arc<dyn Transport>,
    translator: ErrorTranslator,
    recommended_payload_bytes: usize,
}

impl SendGateway {
    pub fn new(
        registry: Arc<PortRegistry>,
        transport: Arc<dyn Transport>,
        config: &MessagePortConfig,
    ) -> Self {
        Self {
            registry,
            transport,
            translator: ErrorTranslator::with_passthrough(config.passthrough_unmapped_codes),
            recommended_payload_bytes: config.recommended_payload_bytes,
        }
    }

    /// One-way send to `remote` in `domain`.
    pub fn send(
        &self,
        remote: &RemoteAddress,
        domain: TrustDomain,
        payload: Option<&Payload>,
    ) -> MessagePortResult<()> {
        let payload = self.validate(remote, payload)?;
        debug!(remote = %remote, %domain, "Sending message");
        self.translator
            .result(self.transport.send(remote, domain, payload))
    }

    /// Send with `local_port_id` as the reply address.
    ///
    /// The reply port may live in either domain of the registry. It is
    /// checked locally, so an unknown reply port never costs a transport call.
    pub fn send_with_reply_address(
        &self,
        remote: &RemoteAddress,
        domain: TrustDomain,
        payload: Option<&Payload>,
        local_port_id: PortId,
    ) -> MessagePortResult<()> {
        let payload = self.validate(remote, payload)?;
        if !local_port_id.is_valid() {
            warn!(port_id = %local_port_id, "Rejected send: reply port id must be positive");
            return Err(MessagePortError::InvalidParameter(format!(
                "local port id {local_port_id} is not positive"
            )));
        }
        let Some(local_domain) = self.registry.domain_of(local_port_id) else {
            warn!(port_id = %local_port_id, "Rejected send: reply port is not registered");
            return Err(MessagePortError::PortNotFound(format!(
                "local port {local_port_id}"
            )));
        };
        if local_domain != domain {
            debug!(
                port_id = %local_port_id,
                reply_domain = %local_domain,
                send_domain = %domain,
                "Reply port and send use different trust domains"
            );
        }

        debug!(remote = %remote, %domain, port_id = %local_port_id, "Sending message with reply port");
        self.translator.result(
            self.transport
                .send_bidirectional(local_port_id, remote, domain, payload),
        )
    }

    /// Whether `remote` exists in `domain`.
    ///
    /// A transport `PortNotFound` is an answer (`false`), not an error.
    pub fn check_remote_port(
        &self,
        remote: &RemoteAddress,
        domain: TrustDomain,
    ) -> MessagePortResult<bool> {
        if let Err(e) = remote.validate() {
            warn!(error = %e, "Rejected remote port check");
            return Err(e);
        }
        debug!(remote = %remote, %domain, "Checking remote port");
        match self.transport.check_remote(remote, domain) {
            Ok(exists) => Ok(exists),
            Err(TransportCode::PortNotFound) => Ok(false),
            Err(code) => Err(self.translator.translate(code)),
        }
    }

    fn validate<'a>(
        &self,
        remote: &RemoteAddress,
        payload: Option<&'a Payload>,
    ) -> MessagePortResult<&'a Payload> {
        if let Err(e) = remote.validate() {
            warn!(error = %e, "Rejected send");
            return Err(e);
        }
        let Some(payload) = payload else {
            warn!(remote = %remote, "Rejected send: payload is missing");
            return Err(MessagePortError::InvalidParameter(
                "payload is missing".to_string(),
            ));
        };
        let size = payload.encoded_len();
        if size > self.recommended_payload_bytes {
            warn!(
                remote = %remote,
                size,
                recommended = self.recommended_payload_bytes,
                "Payload is larger than recommended"
            );
        }
        Ok(payload)
    }
}
