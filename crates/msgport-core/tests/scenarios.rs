//! End-to-end scenarios through the public `MessagePort` API.
//!
//! A recording transport stands in for the device service; deliveries are
//! injected through the sink the port attached to it, and the main loop is
//! drained explicitly so each test controls when callbacks run.

mod common;

use common::{init_tracing, Call, RecordingTransport};
use msgport_core::{
    ChannelMainLoop, DeliveryEvent, Listener, ListenerContext, MainLoopDriver, MessagePort,
    MessagePortConfig, MessagePortError, Payload, PortId, RemoteAddress, TransportCode,
    TrustDomain,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn setup() -> (Arc<RecordingTransport>, MessagePort, MainLoopDriver) {
    init_tracing();
    let transport = RecordingTransport::new();
    let (main_loop, driver) = ChannelMainLoop::new();
    let port = MessagePort::new(
        transport.clone(),
        Arc::new(main_loop),
        MessagePortConfig::default(),
    );
    (transport, port, driver)
}

/// Everything a listener saw, including the context it was handed.
type Seen = Arc<Mutex<Vec<(PortId, String, Option<String>, bool, Payload, String)>>>;

fn recording_listener(seen: &Seen, ctx: &str) -> Listener {
    let seen = Arc::clone(seen);
    let context: ListenerContext = Arc::new(ctx.to_string());
    Listener::with_context(
        move |msg, ctx| {
            let ctx = ctx.downcast_ref::<String>().cloned().unwrap_or_default();
            seen.lock().unwrap().push((
                msg.local_port_id,
                msg.remote_app_id,
                msg.remote_port,
                msg.trusted_remote_port,
                msg.payload,
                ctx,
            ));
        },
        context,
    )
}

#[test]
fn test_register_and_deliver_on_main_loop() {
    let (transport, port, driver) = setup();
    let seen: Seen = Arc::default();

    let id = port
        .register_port("Echo", false, recording_listener(&seen, "ctx"))
        .unwrap();
    assert_eq!(id, PortId::new(1));

    transport.inject(DeliveryEvent::one_way(
        id,
        "app.other",
        Payload::new().with("k", "v"),
    ));
    assert!(seen.lock().unwrap().is_empty(), "callback ran off the main loop");

    assert_eq!(driver.run_pending(), 1);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let (target, sender, sender_port, trusted, payload, ctx) = &seen[0];
    assert_eq!(*target, id);
    assert_eq!(sender, "app.other");
    assert_eq!(*sender_port, None);
    assert!(!trusted);
    assert_eq!(payload.get_str("k"), Some("v"));
    assert_eq!(ctx, "ctx");
}

#[test]
fn test_untrusted_send_to_trusted_port_is_rejected() {
    let (transport, port, driver) = setup();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);

    let _ = port
        .register_port("Echo", false, Listener::one_way(|_| {}))
        .unwrap();
    let secure = port
        .register_port(
            "Secure",
            true,
            Listener::one_way(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();
    assert_eq!(secure, PortId::new(2));

    transport.fail_sends_to("Secure", TrustDomain::Open, TransportCode::CertificateNotMatch);
    let result = port.send("app.x", "Secure", false, &Payload::new().with("k", "v"));
    assert_eq!(result, Err(MessagePortError::CertificateNotMatch));

    driver.run_pending();
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_delivery_after_unregister_is_dropped() {
    let (transport, port, driver) = setup();
    let hits = Arc::new(AtomicUsize::new(0));
    let h = Arc::clone(&hits);
    let id = port
        .register_port(
            "Echo",
            false,
            Listener::one_way(move |_| {
                h.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();

    port.unregister_port(id, false).unwrap();
    assert!(transport.calls().contains(&Call::Unbind(id)));

    transport.inject(DeliveryEvent::one_way(id, "app.other", Payload::new()));
    assert_eq!(driver.run_pending(), 0);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[test]
fn test_reply_port_must_be_registered_locally() {
    let (transport, port, _driver) = setup();
    let result = port.send_with_reply(
        "app.x",
        "P",
        false,
        &Payload::new().with("k", "v"),
        PortId::new(99),
    );
    assert!(matches!(result, Err(MessagePortError::PortNotFound(_))));
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn test_reregistration_replaces_listener() {
    let (transport, port, driver) = setup();
    let a = Arc::new(AtomicUsize::new(0));
    let b = Arc::new(AtomicUsize::new(0));
    let (ha, hb) = (Arc::clone(&a), Arc::clone(&b));

    let first = port
        .register_port(
            "Dup",
            false,
            Listener::one_way(move |_| {
                ha.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();
    let second = port
        .register_port(
            "Dup",
            false,
            Listener::one_way(move |_| {
                hb.fetch_add(1, Ordering::SeqCst);
            }),
        )
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(port.registry().active_count(), 1);

    transport.inject(DeliveryEvent::one_way(first, "app.other", Payload::new()));
    driver.run_pending();
    assert_eq!(a.load(Ordering::SeqCst), 0);
    assert_eq!(b.load(Ordering::SeqCst), 1);
}

#[test]
fn test_cross_domain_unregister_is_port_not_found() {
    let (transport, port, _driver) = setup();
    let open = port
        .register_port("Echo", false, Listener::one_way(|_| {}))
        .unwrap();
    let trusted = port
        .register_port("Echo", true, Listener::one_way(|_| {}))
        .unwrap();
    assert_ne!(open, trusted);
    transport.clear_calls();

    assert!(matches!(
        port.unregister_port(trusted, false),
        Err(MessagePortError::PortNotFound(_))
    ));
    assert!(matches!(
        port.unregister_port(open, true),
        Err(MessagePortError::PortNotFound(_))
    ));
    assert_eq!(transport.call_count(), 0);
    assert_eq!(port.registry().active_count(), 2);
}

#[test]
fn test_invalid_arguments_never_reach_transport() {
    let (transport, port, _driver) = setup();
    let payload = Payload::new();

    assert!(matches!(
        port.register_port("", false, Listener::one_way(|_| {})),
        Err(MessagePortError::InvalidParameter(_))
    ));
    assert!(matches!(
        port.registry().register("Echo", TrustDomain::Open, None),
        Err(MessagePortError::InvalidParameter(_))
    ));
    assert!(matches!(
        port.unregister_port(PortId::new(0), false),
        Err(MessagePortError::InvalidParameter(_))
    ));
    assert!(matches!(
        port.unregister_port(PortId::new(-4), true),
        Err(MessagePortError::InvalidParameter(_))
    ));
    assert!(matches!(
        port.send("", "P", false, &payload),
        Err(MessagePortError::InvalidParameter(_))
    ));
    assert!(matches!(
        port.send_with_reply("app.x", "P", true, &payload, PortId::new(0)),
        Err(MessagePortError::InvalidParameter(_))
    ));
    assert!(matches!(
        port.check_remote("app.x", "", false),
        Err(MessagePortError::InvalidParameter(_))
    ));
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn test_send_variants_pick_transport_entry_points() {
    let (transport, port, _driver) = setup();
    let reply = port
        .register_local_port("Reply", Listener::one_way(|_| {}))
        .unwrap();
    transport.clear_calls();

    let payload = Payload::new().with("k", "v");
    port.send_message("app.x", "P", &payload).unwrap();
    port.send_trusted_message("app.x", "P", &payload).unwrap();
    port.send_message_with_local_port("app.x", "P", &payload, reply)
        .unwrap();
    port.send_trusted_message_with_local_port("app.x", "P", &payload, reply)
        .unwrap();

    let remote = RemoteAddress::new("app.x", "P");
    assert_eq!(
        transport.calls(),
        vec![
            Call::Send(remote.clone(), TrustDomain::Open),
            Call::Send(remote.clone(), TrustDomain::Trusted),
            Call::SendBidirectional(reply, remote.clone(), TrustDomain::Open),
            Call::SendBidirectional(reply, remote, TrustDomain::Trusted),
        ]
    );
}

#[test]
fn test_bidirectional_delivery_exposes_reply_port() {
    let (transport, port, driver) = setup();
    let seen: Seen = Arc::default();
    let id = port
        .register_trusted_local_port("Secure", recording_listener(&seen, "secure-ctx"))
        .unwrap();

    transport.inject(DeliveryEvent::with_reply_port(
        id,
        "app.peer",
        "PeerReply",
        true,
        Payload::new().with("op", "ping"),
    ));
    driver.run_pending();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0].2.as_deref(), Some("PeerReply"));
    assert!(seen[0].3);
    assert_eq!(seen[0].5, "secure-ctx");
}

#[test]
fn test_check_remote_port_variants() {
    let (transport, port, _driver) = setup();
    assert_eq!(port.check_remote_port("app.x", "P"), Ok(true));

    transport.fail_sends_to("Gone", TrustDomain::Open, TransportCode::PortNotFound);
    assert_eq!(port.check_remote_port("app.x", "Gone"), Ok(false));

    transport.fail_sends_to("Secure", TrustDomain::Trusted, TransportCode::CertificateNotMatch);
    assert_eq!(
        port.check_trusted_remote_port("app.x", "Secure"),
        Err(MessagePortError::CertificateNotMatch)
    );
}

#[test]
fn test_unmapped_transport_codes() {
    init_tracing();
    let transport = RecordingTransport::new();
    transport.fail_sends_to("P", TrustDomain::Open, TransportCode::Other(-4000));
    let (main_loop, _driver) = ChannelMainLoop::new();
    let main_loop = Arc::new(main_loop);

    let closed = MessagePort::new(
        transport.clone(),
        main_loop.clone(),
        MessagePortConfig::default(),
    );
    assert_eq!(
        closed.send("app.x", "P", false, &Payload::new()),
        Err(MessagePortError::IoError)
    );

    let passthrough = MessagePort::new(
        transport.clone(),
        main_loop,
        MessagePortConfig {
            passthrough_unmapped_codes: true,
            ..MessagePortConfig::default()
        },
    );
    assert_eq!(
        passthrough.send("app.x", "P", false, &Payload::new()),
        Err(MessagePortError::Unrecognized(-4000))
    );
}
