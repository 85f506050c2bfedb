//! End-to-end scenarios against a bound ingress server.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;

use mesh_ingress::{HttpIngressServer, RetCode, WorkerPool};

mod common;
use common::{test_config, url, CountingCodeProcessor, EchoEventProcessor};

#[tokio::test]
async fn code_path_happy() {
    let server = HttpIngressServer::new(test_config(1024));
    let calls = Arc::new(AtomicU32::new(0));
    server
        .register_code_processor(
            200,
            Arc::new(CountingCodeProcessor {
                calls: calls.clone(),
                delay: Duration::ZERO,
            }),
            WorkerPool::new("code-200", 2, 8),
        )
        .unwrap();
    let addr = server.start().await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(url(addr))
        .header("version", "1.0")
        .header("code", "200")
        .form(&[("code", "200")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let envelope: Value = response.json().await.unwrap();
    assert_eq!(envelope["retCode"], 0);
    assert_eq!(envelope["processed"], "200");
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn unknown_code_answers_invalid_and_keeps_connection() {
    let server = HttpIngressServer::new(test_config(1024));
    let calls = Arc::new(AtomicU32::new(0));
    server
        .register_code_processor(
            200,
            Arc::new(CountingCodeProcessor {
                calls: calls.clone(),
                delay: Duration::ZERO,
            }),
            WorkerPool::new("code-200", 2, 8),
        )
        .unwrap();
    let addr = server.start().await.unwrap();

    let client = reqwest::Client::new();
    let response = client
        .post(url(addr))
        .header("version", "1.0")
        .header("code", "9999")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let envelope: Value = response.json().await.unwrap();
    assert_eq!(envelope["retCode"], RetCode::RequestCodeInvalid.code());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    // The channel stays alive: a follow-up request on the pooled connection works.
    let follow_up = client
        .post(url(addr))
        .header("version", "1.0")
        .header("code", "200")
        .send()
        .await
        .unwrap();
    assert_eq!(follow_up.status(), 200);
    let envelope: Value = follow_up.json().await.unwrap();
    assert_eq!(envelope["retCode"], 0);

    server.shutdown().await;
}

#[tokio::test]
async fn uri_path_routes_by_prefix_and_round_trips_body() {
    let server = HttpIngressServer::new(test_config(1024));
    let calls = Arc::new(AtomicU32::new(0));
    server
        .register_uri_processor(
            "/eventmesh/",
            Arc::new(EchoEventProcessor { calls: calls.clone() }),
            WorkerPool::new("eventmesh", 2, 8),
        )
        .unwrap();
    let addr = server.start().await.unwrap();

    let payload = serde_json::json!({"topic": "T", "payload": "P"});
    let response = reqwest::Client::new()
        .post(format!("{}/eventmesh/publish", url(addr)))
        .header("version", "1.0")
        .json(&payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let echoed: Value = response.json().await.unwrap();
    assert_eq!(echoed, payload);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn unsupported_method_gets_405_and_close() {
    let server = HttpIngressServer::new(test_config(1024));
    let addr = server.start().await.unwrap();

    let response = reqwest::Client::new()
        .put(format!("{}/anything", url(addr)))
        .header("version", "1.0")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 405);
    assert_eq!(
        response
            .headers()
            .get(reqwest::header::CONNECTION)
            .and_then(|v| v.to_str().ok()),
        Some("close")
    );
    assert!(response.bytes().await.unwrap().is_empty());

    server.shutdown().await;
}

#[tokio::test]
async fn saturated_route_pool_overloads_extra_requests() {
    let server = HttpIngressServer::new(test_config(1024));
    let calls = Arc::new(AtomicU32::new(0));
    server
        .register_code_processor(
            203,
            Arc::new(CountingCodeProcessor {
                calls: calls.clone(),
                delay: Duration::from_millis(400),
            }),
            // One worker, one queue slot: the third concurrent request must be shed.
            WorkerPool::new("code-203", 1, 1),
        )
        .unwrap();
    let addr = server.start().await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..3 {
        let target = url(addr);
        handles.push(tokio::spawn(async move {
            let response = reqwest::Client::new()
                .post(target)
                .header("version", "1.0")
                .header("code", "203")
                .send()
                .await
                .unwrap();
            assert_eq!(response.status(), 200);
            response.json::<Value>().await.unwrap()
        }));
        tokio::time::sleep(Duration::from_millis(60)).await;
    }

    let mut ok = 0;
    let mut overloaded = 0;
    for handle in handles {
        let envelope = handle.await.unwrap();
        match envelope["retCode"].as_i64().unwrap() as i32 {
            0 => ok += 1,
            code if code == RetCode::Overload.code() => overloaded += 1,
            other => panic!("unexpected retCode {other}"),
        }
    }
    assert_eq!(ok, 2);
    assert_eq!(overloaded, 1);
    assert_eq!(server.metrics().http_discards(), 1);

    server.shutdown().await;
}

#[tokio::test]
async fn connection_cap_closes_excess_connections() {
    let server = HttpIngressServer::new(test_config(3));
    let addr = server.start().await.unwrap();

    let mut held = Vec::new();
    for _ in 0..3 {
        held.push(TcpStream::connect(addr).await.unwrap());
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert!(
        common::wait_for_connections(|| server.live_connections(), 3, Duration::from_secs(2)).await
    );

    // The fourth connection is closed without any HTTP exchange.
    let mut rejected = TcpStream::connect(addr).await.unwrap();
    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(Duration::from_secs(2), rejected.read(&mut buf)).await;
    match read {
        Ok(Ok(0)) => {}
        Ok(Ok(n)) => panic!("rejected connection received {n} bytes"),
        Ok(Err(_)) => {} // reset is also a close
        Err(_) => panic!("rejected connection was not closed"),
    }

    drop(held);
    assert!(
        common::wait_for_connections(|| server.live_connections(), 0, Duration::from_secs(3)).await
    );

    server.shutdown().await;
}
