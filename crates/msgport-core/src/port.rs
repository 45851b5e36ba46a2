//! MessagePort — the public face of the core.
//!
//! One [`MessagePort`] serves one application. It owns the registry, the
//! dispatch router and the send gateway and wires the router into the
//! transport. The named methods (`register_local_port`,
//! `send_trusted_message`, ...) are thin forwards onto the four canonical
//! operations: [`MessagePort::register_port`], [`MessagePort::unregister_port`],
//! [`MessagePort::send`] and [`MessagePort::send_with_reply`].

use crate::dispatch::DispatchRouter;
use crate::gateway::SendGateway;
use crate::listener::Listener;
use crate::main_loop::MainLoop;
use crate::registry::PortRegistry;
use crate::translate::ErrorTranslator;
use crate::transport::Transport;
use msgport_types::{
    MessagePortConfig, MessagePortError, MessagePortResult, Payload, PortId, RemoteAddress,
    TrustDomain,
};
use std::sync::{Arc, Weak};
use tracing::warn;

/// Local message port endpoint for one application.
pub struct MessagePort {
    config: MessagePortConfig,
    registry: Arc<PortRegistry>,
    router: Arc<DispatchRouter>,
    gateway: SendGateway,
}

impl MessagePort {
    /// Build the core on top of `transport` and `main_loop` and attach the
    /// router as the transport's delivery sink.
    pub fn new(
        transport: Arc<dyn Transport>,
        main_loop: Arc<dyn MainLoop>,
        config: MessagePortConfig,
    ) -> Self {
        let translator = ErrorTranslator::with_passthrough(config.passthrough_unmapped_codes);
        let registry = Arc::new(PortRegistry::new(Arc::clone(&transport), translator));
        let router = Arc::new(DispatchRouter::new(
            Arc::clone(&registry),
            main_loop,
            &config,
        ));
        let gateway = SendGateway::new(Arc::clone(&registry), Arc::clone(&transport), &config);
        let sink: Weak<DispatchRouter> = Arc::downgrade(&router);
        transport.attach(sink);

        Self {
            config,
            registry,
            router,
            gateway,
        }
    }

    pub fn config(&self) -> &MessagePortConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PortRegistry> {
        &self.registry
    }

    pub fn router(&self) -> &Arc<DispatchRouter> {
        &self.router
    }

    // -- canonical operations ------------------------------------------------

    /// Register a local port. Returns a positive id.
    pub fn register_port(
        &self,
        name: &str,
        trusted: bool,
        listener: Listener,
    ) -> MessagePortResult<PortId> {
        self.registry
            .register(name, TrustDomain::from_trusted(trusted), Some(listener))
    }

    /// Unregister a local port through the entry point of its own domain.
    pub fn unregister_port(&self, id: PortId, trusted: bool) -> MessagePortResult<()> {
        self.registry
            .unregister(id, TrustDomain::from_trusted(trusted))
            .map(|_| ())
    }

    /// Whether a remote port exists.
    pub fn check_remote(
        &self,
        app_id: &str,
        port_name: &str,
        trusted: bool,
    ) -> MessagePortResult<bool> {
        self.gateway.check_remote_port(
            &RemoteAddress::new(app_id, port_name),
            TrustDomain::from_trusted(trusted),
        )
    }

    /// One-way send.
    pub fn send(
        &self,
        app_id: &str,
        port_name: &str,
        trusted: bool,
        payload: &Payload,
    ) -> MessagePortResult<()> {
        self.gateway.send(
            &RemoteAddress::new(app_id, port_name),
            TrustDomain::from_trusted(trusted),
            Some(payload),
        )
    }

    /// Send with `local_port_id` as the reply address.
    pub fn send_with_reply(
        &self,
        app_id: &str,
        port_name: &str,
        trusted: bool,
        payload: &Payload,
        local_port_id: PortId,
    ) -> MessagePortResult<()> {
        self.gateway.send_with_reply_address(
            &RemoteAddress::new(app_id, port_name),
            TrustDomain::from_trusted(trusted),
            Some(payload),
            local_port_id,
        )
    }

    // -- introspection ---------------------------------------------------------

    /// Name of an active local port.
    pub fn local_port_name(&self, id: PortId) -> MessagePortResult<String> {
        self.ensure_valid(id)?;
        self.registry
            .name_of(id)
            .ok_or_else(|| MessagePortError::PortNotFound(format!("local port {id}")))
    }

    /// Whether an active local port is a trusted port.
    pub fn is_trusted_local_port(&self, id: PortId) -> MessagePortResult<bool> {
        self.ensure_valid(id)?;
        self.registry
            .domain_of(id)
            .map(TrustDomain::is_trusted)
            .ok_or_else(|| MessagePortError::PortNotFound(format!("local port {id}")))
    }

    fn ensure_valid(&self, id: PortId) -> MessagePortResult<()> {
        if id.is_valid() {
            Ok(())
        } else {
            warn!(port_id = %id, "Rejected lookup: id must be positive");
            Err(MessagePortError::InvalidParameter(format!(
                "port id {id} is not positive"
            )))
        }
    }

    // -- named forwards --------------------------------------------------------

    pub fn register_local_port(&self, name: &str, listener: Listener) -> MessagePortResult<PortId> {
        self.register_port(name, false, listener)
    }

    pub fn register_trusted_local_port(
        &self,
        name: &str,
        listener: Listener,
    ) -> MessagePortResult<PortId> {
        self.register_port(name, true, listener)
    }

    pub fn unregister_local_port(&self, id: PortId) -> MessagePortResult<()> {
        self.unregister_port(id, false)
    }

    pub fn unregister_trusted_local_port(&self, id: PortId) -> MessagePortResult<()> {
        self.unregister_port(id, true)
    }

    pub fn check_remote_port(&self, app_id: &str, port_name: &str) -> MessagePortResult<bool> {
        self.check_remote(app_id, port_name, false)
    }

    pub fn check_trusted_remote_port(
        &self,
        app_id: &str,
        port_name: &str,
    ) -> MessagePortResult<bool> {
        self.check_remote(app_id, port_name, true)
    }

    pub fn send_message(
        &self,
        app_id: &str,
        port_name: &str,
        payload: &Payload,
    ) -> MessagePortResult<()> {
        self.send(app_id, port_name, false, payload)
    }

    pub fn send_trusted_message(
        &self,
        app_id: &str,
        port_name: &str,
        payload: &Payload,
    ) -> MessagePortResult<()> {
        self.send(app_id, port_name, true, payload)
    }

    pub fn send_message_with_local_port(
        &self,
        app_id: &str,
        port_name: &str,
        payload: &Payload,
        local_port_id: PortId,
    ) -> MessagePortResult<()> {
        self.send_with_reply(app_id, port_name, false, payload, local_port_id)
    }

    pub fn send_trusted_message_with_local_port(
        &self,
        app_id: &str,
        port_name: &str,
        payload: &Payload,
        local_port_id: PortId,
    ) -> MessagePortResult<()> {
        self.send_with_reply(app_id, port_name, true, payload, local_port_id)
    }
}

impl std::fmt::Debug for MessagePort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessagePort")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}
