mod common;

use common::upsd::{FakeUpsd, FakeUpsdState, unit};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use upsapp::nut::{NutClient, NutError, UpsClient};
use upsapp::telemetry::cache::DEFAULT_MIN_INTERVAL;
use upsapp::telemetry::setup::setup_telemetry;

async fn garage_upsd() -> FakeUpsd {
    let mut units = BTreeMap::new();
    units.insert(
        "eaton".to_string(),
        unit(
            "Eaton 5E in the \"garage\"",
            &[
                ("battery.charge", "97"),
                ("battery.runtime", "1500"),
                ("device.model", "5E 850i"),
            ],
        ),
    );
    FakeUpsd::start(FakeUpsdState {
        units,
        ..Default::default()
    })
    .await
}

fn client_for(upsd: &FakeUpsd) -> NutClient {
    NutClient::new("127.0.0.1", upsd.port()).with_timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn test_list_units() {
    let upsd = garage_upsd().await;
    let client = client_for(&upsd);

    let units = client.list_units().await.unwrap();
    assert_eq!(units.len(), 1);
    assert_eq!(units["eaton"], "Eaton 5E in the \"garage\"");
}

#[tokio::test]
async fn test_list_variables() {
    let upsd = garage_upsd().await;
    let client = client_for(&upsd);

    let variables = client.list_variables("eaton").await.unwrap();
    assert_eq!(variables.len(), 3);
    assert_eq!(variables["battery.charge"], "97");
    assert_eq!(variables["device.model"], "5E 850i");
}

#[tokio::test]
async fn test_unknown_unit() {
    let upsd = garage_upsd().await;
    let client = client_for(&upsd);

    let result = client.list_variables("apc").await;
    assert!(matches!(result, Err(NutError::UnknownUnit(ref unit)) if unit == "apc"));

    // The connection survives a server-side error
    client.list_variables("eaton").await.unwrap();
    assert_eq!(upsd.connections(), 1);
}

#[tokio::test]
async fn test_connection_is_reused() {
    let upsd = garage_upsd().await;
    let client = client_for(&upsd);

    for _ in 0..3 {
        client.list_variables("eaton").await.unwrap();
    }
    client.list_units().await.unwrap();
    assert_eq!(upsd.connections(), 1);
    assert_eq!(upsd.commands(), 4);

    client.close().await;
    client.list_units().await.unwrap();
    assert_eq!(upsd.connections(), 2);
}

#[tokio::test]
async fn test_reconnects_after_server_hangs_up() {
    // Answers the first command of every connection, then hangs up
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let (reader, mut writer) = stream.into_split();
            let mut lines = BufReader::new(reader).lines();
            if let Ok(Some(_)) = lines.next_line().await {
                let _ = writer
                    .write_all(b"BEGIN LIST UPS\nUPS solo \"Only one\"\nEND LIST UPS\n")
                    .await;
            }
        }
    });

    let client = NutClient::new("127.0.0.1", port).with_timeout(Duration::from_secs(5));
    assert!(client.list_units().await.is_ok());
    // The server dropped the first connection, this call sees it closed
    let second = client.list_units().await;
    assert!(matches!(
        second,
        Err(NutError::ConnectionClosed) | Err(NutError::Io(_))
    ));
    // and the next one opens a fresh connection
    assert!(client.list_units().await.is_ok());
}

#[tokio::test]
async fn test_cancelled_call_does_not_leak_its_answer() {
    let mut units = BTreeMap::new();
    units.insert("eaton".to_string(), unit("Eaton", &[("ups.load", "12")]));
    let upsd = FakeUpsd::start(FakeUpsdState {
        units,
        delay: Duration::from_millis(300),
        ..Default::default()
    })
    .await;
    let client = client_for(&upsd);

    // Dropped while upsd is still preparing the LIST VAR answer
    let cancelled =
        tokio::time::timeout(Duration::from_millis(100), client.list_variables("eaton")).await;
    assert!(cancelled.is_err());
    tokio::time::sleep(Duration::from_millis(400)).await;

    // A fresh connection answers LIST UPS, not the stale LIST VAR lines
    let units = client.list_units().await.unwrap();
    assert_eq!(units["eaton"], "Eaton");
    assert_eq!(upsd.connections(), 2);
}

#[tokio::test]
async fn test_read_timeout() {
    // Accepts connections but never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        let mut open = Vec::new();
        while let Ok((stream, _)) = listener.accept().await {
            open.push(stream);
        }
    });

    let client = NutClient::new("127.0.0.1", port).with_timeout(Duration::from_millis(200));
    let result = client.list_units().await;
    assert!(matches!(result, Err(NutError::Timeout(_))));
}

#[tokio::test]
async fn test_garbage_answer() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let _ = stream.write_all(b"HELLO THERE\n").await;
        }
    });

    let client = NutClient::new("127.0.0.1", port).with_timeout(Duration::from_secs(5));
    let result = client.list_units().await;
    assert!(matches!(result, Err(NutError::Protocol(_))));
}

#[tokio::test]
async fn test_telemetry_over_the_wire() {
    let upsd = garage_upsd().await;
    let client = Arc::new(client_for(&upsd));

    let cache = setup_telemetry(client.clone(), None, DEFAULT_MIN_INTERVAL)
        .await
        .unwrap();
    assert_eq!(cache.target_unit(), Some("eaton"));

    let snapshot = cache.get_snapshot().await;
    assert_eq!(snapshot.get("battery_runtime").unwrap().to_string(), "25.0");
    assert_eq!(snapshot.get("device_model").unwrap().to_string(), "5E 850i");

    // LIST UPS for discovery, LIST VAR for verification, nothing more
    assert_eq!(upsd.commands(), 2);
}
