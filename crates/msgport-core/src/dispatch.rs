//! Dispatch router — transport deliveries to main-loop callbacks.
//!
//! Deliveries arrive on whatever thread the transport uses. The router looks
//! the target up under the registry's shared lock, releases it, and posts a
//! task to the main loop. The task resolves the port again right before the
//! callback runs, so a port retired in between is skipped and a listener
//! replaced in between is the one that fires.
//!
//! Undeliverable events are dropped with a log line. The sender already got
//! its acknowledgement from the transport, so there is nobody to report to.

use crate::main_loop::MainLoop;
use crate::registry::PortRegistry;
use crate::transport::DeliverySink;
use msgport_types::{DeliveryEvent, InboundMessage, MessagePortConfig, TrustDomain};
use std::sync::Arc;
use tracing::{debug, warn};

/// What happened to a delivery on the transport side of the hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// A main-loop task was posted.
    Scheduled,
    /// No active port with that id; the event was discarded.
    NoListener,
    /// The main loop is closed; the event was discarded.
    MainLoopClosed,
}

/// Routes inbound deliveries for one application.
pub struct DispatchRouter {
    registry: Arc<PortRegistry>,
    main_loop: Arc<dyn MainLoop>,
    log_payload_keys: bool,
}

impl DispatchRouter {
    pub fn new(
        registry: Arc<PortRegistry>,
        main_loop: Arc<dyn MainLoop>,
        config: &MessagePortConfig,
    ) -> Self {
        Self {
            registry,
            main_loop,
            log_payload_keys: config.log_payload_keys,
        }
    }

    /// Route one delivery. Safe to call from any thread.
    pub fn dispatch(&self, event: DeliveryEvent) -> DispatchOutcome {
        let target = event.target;
        let Some(domain) = self.registry.domain_of(target) else {
            debug!(
                port_id = %target,
                sender = %event.sender_app_id,
                "No listener for delivery, dropped"
            );
            return DispatchOutcome::NoListener;
        };

        if self.log_payload_keys {
            let keys: Vec<&str> = event.payload.keys().collect();
            debug!(
                port_id = %target,
                %domain,
                sender = %event.sender_app_id,
                sender_port = ?event.sender_port,
                trusted_sender = event.sender_trusted,
                keys = ?keys,
                "Message received"
            );
        } else {
            debug!(
                port_id = %target,
                %domain,
                sender = %event.sender_app_id,
                sender_port = ?event.sender_port,
                trusted_sender = event.sender_trusted,
                "Message received"
            );
        }

        let registry = Arc::clone(&self.registry);
        let task = Box::new(move || invoke_on_main_loop(&registry, domain, event));
        match self.main_loop.post(task) {
            Ok(()) => DispatchOutcome::Scheduled,
            Err(e) => {
                warn!(port_id = %target, %domain, error = %e, "Delivery dropped");
                DispatchOutcome::MainLoopClosed
            }
        }
    }
}

impl DeliverySink for DispatchRouter {
    fn deliver(&self, event: DeliveryEvent) {
        self.dispatch(event);
    }
}

impl std::fmt::Debug for DispatchRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchRouter")
            .field("registry", &self.registry)
            .finish()
    }
}

/// Runs on the main loop. The lookup clone is taken and the lock released
/// before the listener is called.
fn invoke_on_main_loop(registry: &PortRegistry, domain: TrustDomain, event: DeliveryEvent) {
    let Some(entry) = registry.lookup(event.target, domain) else {
        debug!(
            port_id = %event.target,
            %domain,
            "Port retired before delivery ran, dropped"
        );
        return;
    };
    entry.listener.invoke(InboundMessage::from(event));
}
