#![cfg(feature = "async")]

use click_throttle::infrastructure::mocks::{MockDirectory, RecordingGateway};
use click_throttle::{ActorId, ClickEvent, ClickKind, ClickPump, ClickThrottle, PrimaryDecision};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;

fn throttle(primary_threshold: u32) -> ClickThrottle {
    ClickThrottle::builder()
        .with_settings(click_throttle::ThrottleSettings {
            primary_threshold,
            ..Default::default()
        })
        .with_directory(Arc::new(MockDirectory::new()))
        .with_gateway(Arc::new(RecordingGateway::new()))
        .build()
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_many_producers_feed_one_throttle() {
    let throttle = throttle(1000);
    let (tx, rx) = mpsc::channel(256);
    let handle = ClickPump::spawn(throttle.clone(), rx);
    let now = Instant::now();

    let producers: Vec<_> = (0..4u128)
        .map(|i| {
            let tx = tx.clone();
            tokio::spawn(async move {
                for _ in 0..100 {
                    tx.send(ClickEvent::new(ActorId::new(i), ClickKind::Primary, now))
                        .await
                        .unwrap();
                }
            })
        })
        .collect();

    for producer in producers {
        producer.await.unwrap();
    }

    assert_eq!(handle.shutdown().await.unwrap(), 400);
    for i in 0..4u128 {
        assert_eq!(throttle.window_len(ActorId::new(i), ClickKind::Primary), 100);
    }
}

#[tokio::test]
async fn test_pumped_clicks_drive_decisions() {
    let throttle = throttle(3);
    let (tx, rx) = mpsc::channel(16);
    let handle = ClickPump::spawn(throttle.clone(), rx);
    let actor = ActorId::new(1);

    for _ in 0..4 {
        tx.send(ClickEvent::new(actor, ClickKind::Primary, Instant::now()))
            .await
            .unwrap();
    }
    drop(tx);
    handle.shutdown().await.unwrap();

    assert_eq!(throttle.check_primary_confirmation(actor), PrimaryDecision::Deny);
}
