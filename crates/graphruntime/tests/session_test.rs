mod common;

use common::*;
use futures::StreamExt;
use graphcore::{NodeEntry, RunEvent, SessionError, Value};
use graphruntime::stream::encode_run;
use graphruntime::{RuntimeConfig, SessionStatus};
use std::time::{Duration, Instant};
use tokio::time::timeout;

fn simple_doc() -> graphcore::WorkflowDocument {
    document(vec![
        NodeEntry::new("k", "Const").with_param("value", 2i64),
        NodeEntry::new("out", "Result Node").connect("input", "k"),
    ])
}

#[tokio::test]
async fn submit_is_lazy() {
    let h = harness();
    let token = h.runtime.submit(&simple_doc());

    tokio::task::yield_now().await;

    assert_eq!(h.calls.total(), 0);
    assert_eq!(h.runtime.session_status(&token), Some(SessionStatus::Pending));
}

#[tokio::test]
async fn tokens_are_unique() {
    let h = harness();
    let first = h.runtime.submit(&simple_doc());
    let second = h.runtime.submit(&simple_doc());
    assert_ne!(first, second);
    assert_eq!(first.len(), 32);
}

#[tokio::test]
async fn drained_token_cannot_be_reused() {
    let h = harness();
    let token = h.runtime.submit(&simple_doc());

    let events: Vec<RunEvent> = h.runtime.attach(&token).unwrap().collect().await;

    match events.last() {
        Some(RunEvent::End(outcome)) => assert_eq!(outcome.results["out"], Value::Integer(2)),
        other => panic!("expected END, got {:?}", other),
    }
    assert_eq!(h.runtime.session_status(&token), None);
    assert_eq!(
        h.runtime.attach(&token).err(),
        Some(SessionError::InvalidToken(token.clone()))
    );
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let h = harness();
    let err = h.runtime.attach("not-a-token").err().unwrap();
    assert_eq!(err.to_string(), "Invalid token: not-a-token");
}

#[tokio::test]
async fn second_attach_while_streaming_is_rejected() {
    let h = harness();
    let token = h.runtime.submit(&simple_doc());

    let stream = h.runtime.attach(&token).unwrap();
    assert_eq!(h.runtime.session_status(&token), Some(SessionStatus::Streaming));
    assert!(h.runtime.attach(&token).is_err());
    // The rejected attach leaves the live session alone
    assert_eq!(h.runtime.session_status(&token), Some(SessionStatus::Streaming));

    let events: Vec<RunEvent> = stream.collect().await;
    assert!(events.last().is_some_and(RunEvent::is_terminal));
}

#[tokio::test]
async fn failed_run_still_releases_session() {
    let h = harness();
    let token = h.runtime.submit(&document(vec![
        NodeEntry::new("a", "Add").connect("a", "a"),
        NodeEntry::new("out", "Result Node").connect("input", "a"),
    ]));

    let events: Vec<RunEvent> = h.runtime.attach(&token).unwrap().collect().await;

    assert!(matches!(&events[..], [RunEvent::End(outcome)] if outcome.error.is_some()));
    assert_eq!(h.runtime.session_status(&token), None);
}

#[tokio::test]
async fn dropping_the_stream_releases_session() {
    let h = harness();
    let token = h.runtime.submit(&document(vec![
        NodeEntry::new("g", "Gate"),
        NodeEntry::new("out", "Result Node").connect("input", "g"),
    ]));

    let mut stream = h.runtime.attach(&token).unwrap();
    assert_eq!(stream.next().await, Some(processing("g")));
    drop(stream);

    assert_eq!(h.runtime.session_status(&token), None);
    assert!(h.runtime.attach(&token).is_err());
}

#[tokio::test]
async fn processing_is_visible_while_node_runs() {
    let h = harness();
    let token = h.runtime.submit(&document(vec![
        NodeEntry::new("g", "Gate"),
        NodeEntry::new("out", "Result Node").connect("input", "g"),
    ]));
    let mut stream = h.runtime.attach(&token).unwrap();

    assert_eq!(stream.next().await, Some(processing("g")));
    // The gate is closed, so the node cannot be done yet
    assert!(timeout(Duration::from_millis(50), stream.next()).await.is_err());

    h.gate.notify_one();

    assert_eq!(stream.next().await, Some(done("g")));
    assert_eq!(stream.next().await, Some(processing("out")));
    assert_eq!(stream.next().await, Some(done("out")));
    match stream.next().await {
        Some(RunEvent::End(outcome)) => assert_eq!(outcome.results["out"], Value::Integer(99)),
        other => panic!("expected END, got {:?}", other),
    }
    assert_eq!(stream.next().await, None);
}

#[tokio::test]
async fn processing_arrives_while_a_blocking_node_runs() {
    let h = harness();
    let token = h.runtime.submit(&document(vec![
        NodeEntry::new("s", "Slow").with_param("millis", 500i64),
        NodeEntry::new("out", "Result Node").connect("input", "s"),
    ]));
    let mut stream = h.runtime.attach(&token).unwrap();

    let started = Instant::now();
    assert_eq!(stream.next().await, Some(processing("s")));
    assert!(started.elapsed() < Duration::from_millis(250));

    let rest: Vec<RunEvent> = stream.collect().await;
    assert_eq!(rest[0], done("s"));
    match rest.last() {
        Some(RunEvent::End(outcome)) => assert_eq!(outcome.results["out"], Value::Integer(500)),
        other => panic!("expected END, got {:?}", other),
    }
}

#[tokio::test]
async fn panicking_run_still_ends_the_stream() {
    let h = harness();
    let token = h.runtime.submit(&document(vec![
        NodeEntry::new("b", "Panic"),
        NodeEntry::new("out", "Result Node").connect("input", "b"),
    ]));

    let events: Vec<RunEvent> = h.runtime.attach(&token).unwrap().collect().await;

    match events.last() {
        Some(RunEvent::End(outcome)) => {
            assert!(outcome.order.is_empty());
            assert!(outcome.results.is_empty());
            assert_eq!(
                outcome.error.as_deref(),
                Some("run terminated before completion")
            );
        }
        other => panic!("expected END, got {:?}", other),
    }
    assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    assert_eq!(h.runtime.session_status(&token), None);
}

#[tokio::test]
async fn encoded_stream_ends_with_end_record() {
    let h = harness();
    let token = h.runtime.submit(&simple_doc());

    let records: Vec<String> = encode_run(h.runtime.attach(&token).unwrap()).collect().await;

    assert_eq!(
        &records[..4],
        &[
            "data: PROCESSING k\n\n",
            "data: DONE k\n\n",
            "data: PROCESSING out\n\n",
            "data: DONE out\n\n",
        ]
    );
    assert!(records[4].starts_with("data: END {"));
    assert_eq!(records.len(), 5);
}

#[tokio::test]
async fn concurrent_runs_are_independent() {
    let h = harness();
    let tokens: Vec<String> = (0..8i64)
        .map(|i| {
            h.runtime.submit(&document(vec![
                NodeEntry::new("k", "Const").with_param("value", i),
                NodeEntry::new("out", "Result Node").connect("input", "k"),
            ]))
        })
        .collect();

    let streams: Vec<_> = tokens
        .iter()
        .map(|token| h.runtime.attach(token).unwrap().collect::<Vec<RunEvent>>())
        .collect();
    let runs = futures::future::join_all(streams).await;

    for (i, events) in runs.iter().enumerate() {
        match events.last() {
            Some(RunEvent::End(outcome)) => {
                assert_eq!(outcome.results["out"], Value::Integer(i as i64))
            }
            other => panic!("expected END, got {:?}", other),
        }
    }
    assert_eq!(h.calls.count("k"), 8);
}

#[tokio::test]
async fn expired_pending_sessions_are_reaped() {
    let h = harness_with_config(RuntimeConfig {
        session_ttl: Duration::ZERO,
        ..RuntimeConfig::default()
    });
    let pending = h.runtime.submit(&simple_doc());
    let streaming = h.runtime.submit(&document(vec![
        NodeEntry::new("g", "Gate"),
        NodeEntry::new("out", "Result Node").connect("input", "g"),
    ]));
    let _stream = h.runtime.attach(&streaming).unwrap();

    tokio::time::sleep(Duration::from_millis(5)).await;

    assert_eq!(h.runtime.reap_expired_sessions(), 1);
    assert_eq!(h.runtime.session_status(&pending), None);
    assert_eq!(
        h.runtime.session_status(&streaming),
        Some(SessionStatus::Streaming)
    );
}
