//! In-process loopback transport.
//!
//! [`LoopbackTransport`] simulates the device-wide message port service for
//! several applications living in one process. Each application gets a
//! [`LoopbackEndpoint`] (its view of the transport) identified by an
//! application id and a signing certificate id.
//!
//! Behaviour mirrors the real service closely enough for tests and
//! single-process hosts:
//! - port ids are minted from one counter and never reused
//! - a name is bound once per (application, domain); rebinding returns the
//!   existing id
//! - trusted sends and checks require matching certificates
//! - payloads above the hard limit fail with `MaxExceeded`
//!
//! Delivery happens synchronously on the sender's thread by calling the
//! receiving application's sink.

use crate::transport::{BindOutcome, DeliverySink, Transport};
use dashmap::DashMap;
use msgport_types::{DeliveryEvent, Payload, PortId, RemoteAddress, TransportCode, TrustDomain};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Default hard limit on an encoded payload (16 KiB).
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 16 * 1024;

struct AppRecord {
    certificate: String,
    sink: Option<Weak<dyn DeliverySink>>,
    ports: HashMap<(TrustDomain, String), PortId>,
}

impl AppRecord {
    fn port_by_id(&self, id: PortId) -> Option<(TrustDomain, &str)> {
        self.ports
            .iter()
            .find(|(_, v)| **v == id)
            .map(|((domain, name), _)| (*domain, name.as_str()))
    }
}

struct LoopbackState {
    next_id: AtomicI32,
    apps: DashMap<String, AppRecord>,
    max_payload_bytes: usize,
}

/// Shared in-process message port service.
#[derive(Clone)]
pub struct LoopbackTransport {
    state: Arc<LoopbackState>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::with_max_payload_bytes(DEFAULT_MAX_PAYLOAD_BYTES)
    }

    /// Create a service with a custom payload limit.
    pub fn with_max_payload_bytes(max_payload_bytes: usize) -> Self {
        Self {
            state: Arc::new(LoopbackState {
                next_id: AtomicI32::new(0),
                apps: DashMap::new(),
                max_payload_bytes,
            }),
        }
    }

    /// Connect an application. Connecting the same id again keeps its ports
    /// but replaces the certificate.
    pub fn endpoint(
        &self,
        app_id: impl Into<String>,
        certificate: impl Into<String>,
    ) -> LoopbackEndpoint {
        let app_id = app_id.into();
        let certificate = certificate.into();
        self.state
            .apps
            .entry(app_id.clone())
            .and_modify(|rec| rec.certificate = certificate.clone())
            .or_insert_with(|| AppRecord {
                certificate,
                sink: None,
                ports: HashMap::new(),
            });
        info!(app = %app_id, "Loopback application connected");
        LoopbackEndpoint {
            app_id,
            state: Arc::clone(&self.state),
        }
    }

    /// Number of bound ports across all applications.
    pub fn bound_count(&self) -> usize {
        self.state.apps.iter().map(|rec| rec.ports.len()).sum()
    }
}

impl Default for LoopbackTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// One application's handle on a [`LoopbackTransport`].
pub struct LoopbackEndpoint {
    app_id: String,
    state: Arc<LoopbackState>,
}

impl LoopbackEndpoint {
    /// Application id this endpoint speaks for.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Resolve the target port and sink, applying the certificate check.
    fn resolve(
        &self,
        remote: &RemoteAddress,
        domain: TrustDomain,
    ) -> Result<(PortId, Option<Weak<dyn DeliverySink>>), TransportCode> {
        let my_certificate = self
            .state
            .apps
            .get(&self.app_id)
            .map(|rec| rec.certificate.clone())
            .ok_or(TransportCode::IoError)?;

        let target = self
            .state
            .apps
            .get(&remote.app_id)
            .ok_or(TransportCode::PortNotFound)?;
        let id = *target
            .ports
            .get(&(domain, remote.port_name.clone()))
            .ok_or(TransportCode::PortNotFound)?;
        if domain.is_trusted() && target.certificate != my_certificate {
            return Err(TransportCode::CertificateNotMatch);
        }
        Ok((id, target.sink.clone()))
    }

    fn deliver(
        &self,
        remote: &RemoteAddress,
        domain: TrustDomain,
        payload: &Payload,
        reply: Option<(String, bool)>,
    ) -> Result<(), TransportCode> {
        if payload.encoded_len() > self.state.max_payload_bytes {
            return Err(TransportCode::MaxExceeded);
        }
        // The map guard is released inside `resolve`; the sink runs unlocked.
        let (target, sink) = self.resolve(remote, domain)?;
        let sink = sink
            .and_then(|weak| weak.upgrade())
            .ok_or(TransportCode::PortNotFound)?;

        let event = match reply {
            Some((port, trusted)) => {
                DeliveryEvent::with_reply_port(target, &self.app_id, port, trusted, payload.clone())
            }
            None => DeliveryEvent::one_way(target, &self.app_id, payload.clone()),
        };
        debug!(from = %self.app_id, to = %remote, port_id = %target, "Loopback delivery");
        sink.deliver(event);
        Ok(())
    }
}

impl Transport for LoopbackEndpoint {
    fn attach(&self, sink: Weak<dyn DeliverySink>) {
        if let Some(mut rec) = self.state.apps.get_mut(&self.app_id) {
            rec.sink = Some(sink);
        }
    }

    fn bind(&self, name: &str, domain: TrustDomain) -> Result<BindOutcome, TransportCode> {
        let mut rec = self
            .state
            .apps
            .get_mut(&self.app_id)
            .ok_or(TransportCode::IoError)?;
        let key = (domain, name.to_string());
        if let Some(id) = rec.ports.get(&key) {
            return Ok(BindOutcome::Existing(*id));
        }
        let id = PortId::new(self.state.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        rec.ports.insert(key, id);
        Ok(BindOutcome::Created(id))
    }

    fn unbind(&self, id: PortId) -> Result<(), TransportCode> {
        let mut rec = self
            .state
            .apps
            .get_mut(&self.app_id)
            .ok_or(TransportCode::IoError)?;
        let before = rec.ports.len();
        rec.ports.retain(|_, v| *v != id);
        if rec.ports.len() == before {
            return Err(TransportCode::PortNotFound);
        }
        Ok(())
    }

    fn check_remote(
        &self,
        remote: &RemoteAddress,
        domain: TrustDomain,
    ) -> Result<bool, TransportCode> {
        match self.resolve(remote, domain) {
            Ok(_) => Ok(true),
            Err(TransportCode::PortNotFound) => Ok(false),
            Err(code) => Err(code),
        }
    }

    fn send(
        &self,
        remote: &RemoteAddress,
        domain: TrustDomain,
        payload: &Payload,
    ) -> Result<(), TransportCode> {
        self.deliver(remote, domain, payload, None)
    }

    fn send_bidirectional(
        &self,
        local: PortId,
        remote: &RemoteAddress,
        domain: TrustDomain,
        payload: &Payload,
    ) -> Result<(), TransportCode> {
        let reply = {
            let rec = self
                .state
                .apps
                .get(&self.app_id)
                .ok_or(TransportCode::IoError)?;
            let (local_domain, name) = rec.port_by_id(local).ok_or(TransportCode::PortNotFound)?;
            (name.to_string(), local_domain.is_trusted())
        };
        self.deliver(remote, domain, payload, Some(reply))
    }
}
