//! Shared test double for the integration tests.
//!
//! `RecordingTransport` mints ids like the real service, records every call,
//! and can be scripted to fail sends with a given code. Deliveries are
//! injected by calling the attached sink directly.

#![allow(dead_code)]

use msgport_core::{BindOutcome, DeliveryEvent, DeliverySink, Transport};
use msgport_core::{Payload, PortId, RemoteAddress, TransportCode, TrustDomain};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex, Once, Weak};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Bind(String, TrustDomain),
    Unbind(PortId),
    Check(RemoteAddress, TrustDomain),
    Send(RemoteAddress, TrustDomain),
    SendBidirectional(PortId, RemoteAddress, TrustDomain),
}

#[derive(Default)]
pub struct RecordingTransport {
    next_id: AtomicI32,
    bound: Mutex<HashMap<(TrustDomain, String), PortId>>,
    calls: Mutex<Vec<Call>>,
    send_failures: Mutex<HashMap<(String, TrustDomain), TransportCode>>,
    sink: Mutex<Option<Weak<dyn DeliverySink>>>,
}

impl RecordingTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Make sends to `port_name` in `domain` fail with `code`.
    pub fn fail_sends_to(&self, port_name: &str, domain: TrustDomain, code: TransportCode) {
        self.send_failures
            .lock()
            .unwrap()
            .insert((port_name.to_string(), domain), code);
    }

    /// Inject a delivery as if it came from another application.
    pub fn inject(&self, event: DeliveryEvent) {
        let sink = self
            .sink
            .lock()
            .unwrap()
            .as_ref()
            .and_then(Weak::upgrade)
            .expect("no sink attached");
        sink.deliver(event);
    }

    fn scripted(&self, port_name: &str, domain: TrustDomain) -> Result<(), TransportCode> {
        match self
            .send_failures
            .lock()
            .unwrap()
            .get(&(port_name.to_string(), domain))
        {
            Some(code) => Err(*code),
            None => Ok(()),
        }
    }
}

impl Transport for RecordingTransport {
    fn attach(&self, sink: Weak<dyn DeliverySink>) {
        *self.sink.lock().unwrap() = Some(sink);
    }

    fn bind(&self, name: &str, domain: TrustDomain) -> Result<BindOutcome, TransportCode> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Bind(name.to_string(), domain));
        let mut bound = self.bound.lock().unwrap();
        if let Some(id) = bound.get(&(domain, name.to_string())) {
            return Ok(BindOutcome::Existing(*id));
        }
        let id = PortId::new(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        bound.insert((domain, name.to_string()), id);
        Ok(BindOutcome::Created(id))
    }

    fn unbind(&self, id: PortId) -> Result<(), TransportCode> {
        self.calls.lock().unwrap().push(Call::Unbind(id));
        self.bound.lock().unwrap().retain(|_, v| *v != id);
        Ok(())
    }

    fn check_remote(
        &self,
        remote: &RemoteAddress,
        domain: TrustDomain,
    ) -> Result<bool, TransportCode> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Check(remote.clone(), domain));
        self.scripted(&remote.port_name, domain).map(|()| true)
    }

    fn send(
        &self,
        remote: &RemoteAddress,
        domain: TrustDomain,
        _payload: &Payload,
    ) -> Result<(), TransportCode> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Send(remote.clone(), domain));
        self.scripted(&remote.port_name, domain)
    }

    fn send_bidirectional(
        &self,
        local: PortId,
        remote: &RemoteAddress,
        domain: TrustDomain,
        _payload: &Payload,
    ) -> Result<(), TransportCode> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::SendBidirectional(local, remote.clone(), domain));
        self.scripted(&remote.port_name, domain)
    }
}

/// Route tracing output to the test writer once per binary.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}
