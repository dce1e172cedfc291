//! Forwarder and unhandled-message escalation

use codec::MessageContent;
use delivery::test_utils::{
    test_message_id, EventLog, MemoryConnector, RecordingMessageDelegate,
    RecordingTransportDelegate,
};
use delivery::{
    ConsumeContext, ConsumeError, Forwarder, Message, MessageHandler, ProducerConfig,
    ProducerError, TransportMessage,
};
use opentelemetry::trace::{
    SpanContext, SpanId, TraceContextExt, TraceFlags, TraceId, TraceState,
};
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use propagation::{extract_trace_context, with_trace_propagation};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

const NODE: &str = "node-a:4150";

fn delivered(body: &[u8], log: &EventLog) -> (Message, Arc<RecordingMessageDelegate>) {
    let transport = Arc::new(
        TransportMessage::new(
            test_message_id(),
            body,
            Arc::new(RecordingTransportDelegate::new(log.clone())),
        )
        .with_address(NODE)
        .with_attempts(3),
    );
    let app = Arc::new(RecordingMessageDelegate::new(log.clone()));
    (
        Message::with_delegate(transport, "orders", "billing", app.clone()),
        app,
    )
}

async fn forwarder(connector: &MemoryConnector) -> Arc<Forwarder> {
    Arc::new(
        Forwarder::new(&ProducerConfig::new([NODE]), connector)
            .await
            .unwrap(),
    )
}

#[tokio::test]
async fn test_forward_republishes_body_verbatim() {
    let connector = MemoryConnector::new();
    let forwarder = forwarder(&connector).await;

    let mut content = MessageContent::with_body("payload");
    content.state.set("foo", "bar").unwrap();
    let frame = content.encode().unwrap();
    let log = EventLog::new();
    let (message, _app) = delivered(&frame, &log);

    forwarder.forward("orders-dlq", &message).await.unwrap();

    let published = connector.publisher(NODE).unwrap().published();
    assert_eq!(published[0].topic, "orders-dlq");
    assert_eq!(published[0].body, frame);
}

#[tokio::test]
async fn test_forward_content_reencodes_with_trace_context() {
    let connector = MemoryConnector::new();
    let forwarder = forwarder(&connector).await;
    let log = EventLog::new();
    let (message, _app) = delivered(b"legacy raw payload", &log);

    let span_context = SpanContext::new(
        TraceId::from_hex("4bf92f3577b34da6a3ce929d0e0e4736").unwrap(),
        SpanId::from_hex("00f067aa0ba902b7").unwrap(),
        TraceFlags::SAMPLED,
        true,
        TraceState::default(),
    );
    let cx = Context::new().with_remote_span_context(span_context);
    let option = with_trace_propagation(cx, TraceContextPropagator::new());

    forwarder
        .forward_content("orders-retry", &message, &[&option])
        .await
        .unwrap();

    let published = connector.publisher(NODE).unwrap().published();
    let decoded = MessageContent::decode(&published[0].body).unwrap();
    assert_eq!(decoded.body, b"legacy raw payload");

    let extracted = extract_trace_context(&TraceContextPropagator::new(), &decoded.state);
    let span = extracted.span();
    assert_eq!(
        span.span_context().span_id(),
        SpanId::from_hex("00f067aa0ba902b7").unwrap()
    );
    assert!(span.span_context().is_sampled());
}

#[tokio::test]
async fn test_runner_stop_closes_forwarder() {
    let connector = MemoryConnector::new();
    let forwarder = forwarder(&connector).await;
    let runner = forwarder.runner();

    runner.start();
    runner.stop().await;

    assert!(runner.forwarder().producer().is_closed());
    assert!(connector.publisher(NODE).unwrap().is_stopped());
    let log = EventLog::new();
    let (message, _app) = delivered(b"x", &log);
    assert!(matches!(
        forwarder.forward("orders", &message).await,
        Err(ProducerError::Disposed)
    ));
}

#[test]
fn test_fallback_handler_sees_enriched_message() {
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));
    let observed = seen.clone();
    let handler: MessageHandler = Arc::new(move |ctx, msg| {
        observed.lock().push((
            ctx.topic().to_string(),
            msg.channel().to_string(),
            msg.content().body,
            msg.attempts(),
        ));
        msg.finish();
        Ok(())
    });
    let ctx = ConsumeContext::new("orders").with_unhandled_handler(handler);
    let log = EventLog::new();
    let (message, app) = delivered(b"unclaimed", &log);

    ctx.forward_unhandled_message(&message).unwrap();

    assert_eq!(
        *seen.lock(),
        vec![(
            "orders".to_string(),
            "billing".to_string(),
            b"unclaimed".to_vec(),
            3
        )]
    );
    assert_eq!(log.events(), vec!["transport:finish", "app:finish:orders"]);
    assert_eq!(app.finish_count(), 1);
    assert!(message.transport().has_responded());
}

#[test]
fn test_repeated_forward_reaches_fallback_once() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let handler: MessageHandler = Arc::new(move |_ctx, _msg| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let ctx = ConsumeContext::new("orders").with_unhandled_handler(handler);
    let log = EventLog::new();
    let (message, _app) = delivered(b"x", &log);

    assert!(ctx.forward_unhandled_message(&message).is_ok());
    let err = ctx.forward_unhandled_message(&message).unwrap_err();

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(err.is_fatal());
    assert_eq!(
        err,
        ConsumeError::RecursiveForward {
            topic: "orders".to_string(),
            message_id: test_message_id().to_string(),
        }
    );
    assert!(err.to_string().contains("recursive forward"));
}

#[test]
fn test_racing_forwards_have_one_winner() {
    const THREADS: usize = 8;

    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    let handler: MessageHandler = Arc::new(move |_ctx, _msg| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    });
    let ctx = ConsumeContext::new("orders").with_unhandled_handler(handler);
    let log = EventLog::new();
    let (message, _app) = delivered(b"x", &log);
    let barrier = Arc::new(Barrier::new(THREADS));

    let results: Vec<Result<(), ConsumeError>> = (0..THREADS)
        .map(|_| {
            let ctx = ctx.clone();
            let message = message.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                ctx.forward_unhandled_message(&message)
            })
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(ConsumeError::is_fatal));
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}
