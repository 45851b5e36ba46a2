//! Port registry — the open and trusted local port namespaces.
//!
//! The [`PortRegistry`] owns every local port of the application: its id,
//! name, trust domain and listener. Ids come from the transport and are
//! unique across both domains; names are unique within a domain.
//!
//! Mutations (register, unregister) take the exclusive lock for their whole
//! duration, including the transport call, so they are totally ordered.
//! Lookups take the shared lock and return clones, so no lock is held while
//! a listener runs.

use crate::listener::Listener;
use crate::translate::ErrorTranslator;
use crate::transport::{BindOutcome, Transport};
use msgport_types::{MessagePortError, MessagePortResult, PortId, TrustDomain};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, error, info, warn};

/// Lifecycle of a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortState {
    /// Registered and reachable by lookup.
    Active,
    /// Unregistered. Only seen on the snapshot returned by `unregister`.
    Retired,
}

/// Snapshot of a registered local port.
#[derive(Debug, Clone)]
pub struct PortEntry {
    /// Transport-minted id.
    pub id: PortId,
    /// Name chosen by the owner.
    pub name: String,
    /// Namespace fixed at creation.
    pub domain: TrustDomain,
    /// Callback plus context.
    pub listener: Listener,
    /// Lifecycle state.
    pub state: PortState,
}

#[derive(Default)]
struct Tables {
    open: HashMap<PortId, PortEntry>,
    trusted: HashMap<PortId, PortEntry>,
}

impl Tables {
    fn table(&self, domain: TrustDomain) -> &HashMap<PortId, PortEntry> {
        match domain {
            TrustDomain::Open => &self.open,
            TrustDomain::Trusted => &self.trusted,
        }
    }

    fn table_mut(&mut self, domain: TrustDomain) -> &mut HashMap<PortId, PortEntry> {
        match domain {
            TrustDomain::Open => &mut self.open,
            TrustDomain::Trusted => &mut self.trusted,
        }
    }

    fn find(&self, id: PortId) -> Option<&PortEntry> {
        self.open.get(&id).or_else(|| self.trusted.get(&id))
    }

    fn id_by_name(&self, name: &str, domain: TrustDomain) -> Option<PortId> {
        self.table(domain)
            .values()
            .find(|e| e.name == name)
            .map(|e| e.id)
    }
}

/// Thread-safe registry of local ports.
pub struct PortRegistry {
    transport: Arc<dyn Transport>,
    translator: ErrorTranslator,
    tables: RwLock<Tables>,
}

impl PortRegistry {
    /// Create an empty registry bound to `transport`.
    pub fn new(transport: Arc<dyn Transport>, translator: ErrorTranslator) -> Self {
        Self {
            transport,
            translator,
            tables: RwLock::new(Tables::default()),
        }
    }

    /// Register `name` in `domain` with `listener`.
    ///
    /// Re-registering a name that is already active in the same domain keeps
    /// the existing id and replaces its listener.
    pub fn register(
        &self,
        name: &str,
        domain: TrustDomain,
        listener: Option<Listener>,
    ) -> MessagePortResult<PortId> {
        if name.is_empty() {
            warn!(%domain, "Rejected port registration: empty name");
            return Err(MessagePortError::InvalidParameter(
                "port name is empty".to_string(),
            ));
        }
        let Some(listener) = listener else {
            warn!(%domain, port = name, "Rejected port registration: no listener");
            return Err(MessagePortError::InvalidParameter(
                "listener is missing".to_string(),
            ));
        };

        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());

        let outcome = self.translator.result(self.transport.bind(name, domain))?;
        let id = outcome.id();
        if !id.is_valid() {
            error!(%domain, port = name, port_id = %id, "Transport returned a non-positive port id");
            self.release_rejected(outcome);
            return Err(MessagePortError::IoError);
        }
        if tables.table(domain.other()).contains_key(&id) {
            error!(
                %domain,
                port = name,
                port_id = %id,
                "Transport returned an id already active in the other domain"
            );
            self.release_rejected(outcome);
            return Err(MessagePortError::IoError);
        }

        // A name maps to one id per domain. Release a stale entry if the
        // transport handed out a different id for it.
        if let Some(stale) = tables.id_by_name(name, domain).filter(|stale| *stale != id) {
            warn!(%domain, port = name, stale_id = %stale, port_id = %id, "Replacing stale port entry");
            if let Err(code) = self.transport.unbind(stale) {
                warn!(%domain, port_id = %stale, error = %code, "Failed to release stale port binding");
            }
            tables.table_mut(domain).remove(&stale);
        }

        let table = tables.table_mut(domain);
        match table.get_mut(&id) {
            Some(entry) => {
                entry.listener = listener;
                info!(%domain, port = name, port_id = %id, "Rebound local port listener");
            }
            None => {
                if let BindOutcome::Existing(_) = outcome {
                    debug!(%domain, port = name, port_id = %id, "Transport binding adopted by registry");
                }
                table.insert(
                    id,
                    PortEntry {
                        id,
                        name: name.to_string(),
                        domain,
                        listener,
                        state: PortState::Active,
                    },
                );
                info!(%domain, port = name, port_id = %id, "Registered local port");
            }
        }

        Ok(id)
    }

    /// Undo a binding the registry refused. Only fresh bindings are
    /// released; an `Existing` one belongs to whoever created it.
    fn release_rejected(&self, outcome: BindOutcome) {
        if let BindOutcome::Created(id) = outcome {
            if let Err(code) = self.transport.unbind(id) {
                warn!(port_id = %id, error = %code, "Failed to release rejected port binding");
            }
        }
    }

    /// Unregister `id` from `domain`.
    ///
    /// An id that is active in the other domain is reported as
    /// `PortNotFound`: each entry point may only retire its own ports.
    pub fn unregister(&self, id: PortId, domain: TrustDomain) -> MessagePortResult<PortEntry> {
        if !id.is_valid() {
            warn!(%domain, port_id = %id, "Rejected unregister: id must be positive");
            return Err(MessagePortError::InvalidParameter(format!(
                "port id {id} is not positive"
            )));
        }

        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());

        if !tables.table(domain).contains_key(&id) {
            if tables.table(domain.other()).contains_key(&id) {
                warn!(%domain, port_id = %id, "Rejected unregister across trust domains");
            } else {
                warn!(%domain, port_id = %id, "Rejected unregister: port not registered");
            }
            return Err(MessagePortError::PortNotFound(format!(
                "{domain} local port {id}"
            )));
        }

        self.translator.result(self.transport.unbind(id))?;

        let mut entry = tables
            .table_mut(domain)
            .remove(&id)
            .ok_or_else(|| MessagePortError::PortNotFound(format!("{domain} local port {id}")))?;
        entry.state = PortState::Retired;
        info!(%domain, port = %entry.name, port_id = %id, "Unregistered local port");
        Ok(entry)
    }

    /// Active entry for `id` in `domain`.
    pub fn lookup(&self, id: PortId, domain: TrustDomain) -> Option<PortEntry> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.table(domain).get(&id).cloned()
    }

    /// Active entry for `id` in whichever domain holds it.
    pub fn lookup_either_domain(&self, id: PortId) -> Option<PortEntry> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.find(id).cloned()
    }

    /// Name of the active port `id`.
    pub fn name_of(&self, id: PortId) -> Option<String> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.find(id).map(|e| e.name.clone())
    }

    /// Domain of the active port `id`.
    pub fn domain_of(&self, id: PortId) -> Option<TrustDomain> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.find(id).map(|e| e.domain)
    }

    /// All active ports of a domain, ordered by id.
    pub fn active_ports(&self, domain: TrustDomain) -> Vec<PortEntry> {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let mut ports: Vec<PortEntry> = tables.table(domain).values().cloned().collect();
        ports.sort_by_key(|e| e.id);
        ports
    }

    /// Number of active ports across both domains.
    pub fn active_count(&self) -> usize {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        tables.open.len() + tables.trusted.len()
    }
}

impl std::fmt::Debug for PortRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("PortRegistry")
            .field("open", &tables.open.len())
            .field("trusted", &tables.trusted.len())
            .finish()
    }
}
