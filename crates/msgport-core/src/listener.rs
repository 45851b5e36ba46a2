//! Listeners attached to local ports.

use msgport_types::InboundMessage;
use std::any::Any;
use std::sync::Arc;

/// Opaque owner-supplied value handed back to a [`Listener::Bidirectional`]
/// callback. The registry stores and clones the handle but never looks
/// inside it.
pub type ListenerContext = Arc<dyn Any + Send + Sync>;

type OneWayFn = dyn Fn(InboundMessage) + Send + Sync;
type BidirectionalFn = dyn Fn(InboundMessage, &ListenerContext) + Send + Sync;

/// Callback registered on a local port.
///
/// Callbacks only ever run on the application's main loop.
#[derive(Clone)]
pub enum Listener {
    /// Context-free callback.
    OneWay(Arc<OneWayFn>),
    /// Callback that also receives the owner's context.
    Bidirectional {
        callback: Arc<BidirectionalFn>,
        context: ListenerContext,
    },
}

impl Listener {
    /// Build a context-free listener.
    pub fn one_way<F>(callback: F) -> Self
    where
        F: Fn(InboundMessage) + Send + Sync + 'static,
    {
        Listener::OneWay(Arc::new(callback))
    }

    /// Build a listener that receives `context` with every message.
    pub fn with_context<F>(callback: F, context: ListenerContext) -> Self
    where
        F: Fn(InboundMessage, &ListenerContext) + Send + Sync + 'static,
    {
        Listener::Bidirectional {
            callback: Arc::new(callback),
            context,
        }
    }

    /// The stored context, if any.
    pub fn context(&self) -> Option<&ListenerContext> {
        match self {
            Listener::OneWay(_) => None,
            Listener::Bidirectional { context, .. } => Some(context),
        }
    }

    /// Whether `other` wraps the same callable and context.
    pub fn same_as(&self, other: &Listener) -> bool {
        match (self, other) {
            (Listener::OneWay(a), Listener::OneWay(b)) => Arc::ptr_eq(a, b),
            (
                Listener::Bidirectional {
                    callback: a,
                    context: ca,
                },
                Listener::Bidirectional {
                    callback: b,
                    context: cb,
                },
            ) => Arc::ptr_eq(a, b) && Arc::ptr_eq(ca, cb),
            _ => false,
        }
    }

    /// Run the callback. The message (and its payload) moves into it.
    pub(crate) fn invoke(&self, message: InboundMessage) {
        match self {
            Listener::OneWay(callback) => callback(message),
            Listener::Bidirectional { callback, context } => callback(message, context),
        }
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Listener::OneWay(_) => f.write_str("Listener::OneWay"),
            Listener::Bidirectional { .. } => f.write_str("Listener::Bidirectional"),
        }
    }
}
