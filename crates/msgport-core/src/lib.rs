//! msgport core — local port registry, dispatch router and send gateway.
//!
//! Applications on one device exchange small key/value messages by
//! addressing a named port owned by another application. This crate sits
//! between the public API and the inter-process transport.
//!
//! ## Architecture
//!
//! - **PortRegistry**: owns the open and trusted port namespaces
//! - **DispatchRouter**: turns transport deliveries into main-loop callbacks
//! - **SendGateway**: validates outbound sends before they reach the transport
//! - **ErrorTranslator**: maps transport codes to the public error taxonomy
//! - **MessagePort**: thin facade exposing the public operations
//!
//! The transport and the application's main loop are collaborators behind the
//! [`Transport`] and [`MainLoop`] traits. [`LoopbackTransport`] is an
//! in-process transport for tests and single-process hosts.

pub mod config;
pub mod dispatch;
pub mod gateway;
pub mod listener;
pub mod loopback;
pub mod main_loop;
pub mod port;
pub mod registry;
pub mod translate;
pub mod transport;

pub use dispatch::{DispatchOutcome, DispatchRouter};
pub use gateway::SendGateway;
pub use listener::{Listener, ListenerContext};
pub use loopback::{LoopbackEndpoint, LoopbackTransport};
pub use main_loop::{
    ChannelMainLoop, MainLoop, MainLoopClosed, MainLoopDriver, MainLoopTask, TokioMainLoop,
    TokioMainLoopRunner,
};
pub use port::MessagePort;
pub use registry::{PortEntry, PortRegistry, PortState};
pub use translate::ErrorTranslator;
pub use transport::{BindOutcome, DeliverySink, Transport};

pub use msgport_types::{
    DeliveryEvent, InboundMessage, MessagePortConfig, MessagePortError, MessagePortResult,
    Payload, PayloadValue, PortId, RemoteAddress, TransportCode, TrustDomain,
};
