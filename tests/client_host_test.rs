use callhost::config::toml_config::DEFAULT_MAX_ALLOCATION_BYTES;
use callhost::core::{ArrayValues, MethodStatus, SimpleValues, Simultaneous};
use callhost::{
    ClassHosting, DataTypedProxy, HostConfig, HostError, Result, ServiceClient, SimultaneousProxy,
};
use chrono::NaiveDate;
use futures::future::join_all;
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

fn start_host(config: HostConfig) -> (Arc<ServiceClient>, JoinHandle<Result<()>>) {
    let (client_io, host_io) = tokio::io::duplex(64 * 1024);
    let (host_reader, host_writer) = tokio::io::split(host_io);
    let (client_reader, client_writer) = tokio::io::split(client_io);

    let hosting = Arc::new(ClassHosting::from_settings(&config));
    let host = tokio::spawn(hosting.serve(host_reader, host_writer));
    let client = Arc::new(ServiceClient::connect(client_reader, client_writer));
    (client, host)
}

fn delayed_config(delay_ms: u64) -> HostConfig {
    let mut config = HostConfig::default();
    config.services.work_delay_ms = delay_ms;
    config
}

#[tokio::test]
async fn test_data_typed_proxy_round_trip() {
    let (client, host) = start_host(HostConfig::default());
    let proxy = DataTypedProxy::new(Arc::clone(&client));

    let simple = proxy
        .to_simple_text(&SimpleValues {
            y: 8,
            s: -16,
            i: 32,
            l: 64,
            f: 0.5,
            d: 0.25,
            b: true,
            c: 'q',
            t: "proxy".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(simple, "y=8, s=-16, i=32, l=64, f=0.5, d=0.25, b=true, c=q, t=proxy");

    let arrays = proxy
        .to_array_text(&ArrayValues {
            s: vec![1, 2],
            t: vec!["x".to_string()],
            ..Default::default()
        })
        .await
        .unwrap();
    assert_eq!(
        arrays,
        "y=[], s=[1, 2], i=[], l=[], f=[], d=[], b=[], c=[], t=[x]"
    );

    let lines = vec!["one".to_string(), " one ".to_string(), "two".to_string()];
    assert_eq!(proxy.get_line_count(&lines).await.unwrap(), 3);
    assert_eq!(proxy.allocate_bytes(5, 9).await.unwrap(), vec![9; 5]);

    let unique = proxy.get_unique(&lines, true).await.unwrap();
    assert_eq!(unique.len(), 2);

    let set: BTreeSet<String> = ["b", "a"].iter().map(|s| s.to_string()).collect();
    assert_eq!(
        proxy.get_double(&set).await.unwrap(),
        vec!["a", "b", "a", "b"]
    );

    let dts = NaiveDate::from_ymd_opt(2021, 12, 31)
        .unwrap()
        .and_hms_opt(23, 59, 58)
        .unwrap();
    let mut parent = BTreeMap::new();
    parent.insert("inherited".to_string(), 7);
    let vars = proxy
        .get_system_variables(dts, Duration::from_millis(61_500), &parent)
        .await
        .unwrap();
    assert_eq!(vars["inherited"], 7);
    assert_eq!(vars["year"], 2021);
    assert_eq!(vars["day_of_year"], 365);
    assert_eq!(vars["duration_minutes"], 1);
    assert_eq!(vars["duration_seconds"], 1);

    client.close().await.unwrap();
    assert!(host.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_largest_allowed_allocation_fits_in_one_message() {
    let (client, host) = start_host(HostConfig::default());
    let proxy = DataTypedProxy::new(Arc::clone(&client));

    let bytes = proxy
        .allocate_bytes(DEFAULT_MAX_ALLOCATION_BYTES, 255)
        .await
        .unwrap();
    assert_eq!(bytes.len(), DEFAULT_MAX_ALLOCATION_BYTES);
    assert!(bytes.iter().all(|b| *b == 255));

    let err = proxy
        .allocate_bytes(DEFAULT_MAX_ALLOCATION_BYTES + 1, 7)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        HostError::Remote {
            status: MethodStatus::MethodFailed,
            ..
        }
    ));

    // 連線仍然可用
    let lines = vec!["still".to_string(), "alive".to_string()];
    assert_eq!(proxy.get_line_count(&lines).await.unwrap(), 2);

    client.close().await.unwrap();
    assert!(host.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_oversized_result_fails_the_call_not_the_connection() {
    // 未經驗證的設定：允許的配置量超過單一訊息上限
    let mut config = HostConfig::default();
    config.host.max_message_bytes = 4096;
    config.host.max_allocation_bytes = 4000;
    let (client, host) = start_host(config);
    let proxy = DataTypedProxy::new(Arc::clone(&client));

    let err = proxy.allocate_bytes(3000, 255).await.unwrap_err();
    match err {
        HostError::Remote { status, message } => {
            assert_eq!(status, MethodStatus::MethodFailed);
            assert!(message.contains("exceeds the message limit"));
        }
        other => panic!("unexpected error: {}", other),
    }

    assert_eq!(proxy.allocate_bytes(10, 1).await.unwrap(), vec![1; 10]);

    client.close().await.unwrap();
    assert!(host.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_concurrent_ids_are_unique_through_host() {
    let (client, host) = start_host(delayed_config(10));
    let proxy = SimultaneousProxy::new(Arc::clone(&client));

    let ids = join_all((0..20).map(|_| proxy.get_id())).await;
    let ids: HashSet<i32> = ids.into_iter().map(|id| id.unwrap()).collect();
    assert_eq!(ids.len(), 20);

    proxy.close().await.unwrap();
    assert!(host.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_load_and_remove_through_host() {
    let (client, host) = start_host(HostConfig::default());
    let proxy = SimultaneousProxy::new(Arc::clone(&client));

    proxy.load_it("alpha".to_string()).await.unwrap();
    proxy.load_it("beta".to_string()).await.unwrap();
    assert_eq!(proxy.remove_it().await.unwrap().as_deref(), Some("beta"));
    assert_eq!(proxy.remove_it().await.unwrap().as_deref(), Some("alpha"));
    assert_eq!(proxy.remove_it().await.unwrap(), None);

    let err = proxy.load_it(String::new()).await.unwrap_err();
    assert!(matches!(
        err,
        HostError::Remote {
            status: MethodStatus::MethodFailed,
            ..
        }
    ));

    client.close().await.unwrap();
    assert!(host.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_slow_call_does_not_block_fast_call() {
    let (client, host) = start_host(delayed_config(200));
    let slow_client = Arc::clone(&client);
    let slow = tokio::spawn(async move {
        slow_client
            .call::<i32>("ISimultaneous", "GetId", Vec::new())
            .await
    });

    // GetLineCount 不受 work_delay 影響，應比 GetId 先回來
    let started = tokio::time::Instant::now();
    let count: usize = client
        .call("IDataTyped", "GetLineCount", vec![json!(["a"])])
        .await
        .unwrap();
    assert_eq!(count, 1);
    assert!(started.elapsed() < Duration::from_millis(200));

    assert_eq!(slow.await.unwrap().unwrap(), 1);

    client.close().await.unwrap();
    assert!(host.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_remote_errors_carry_status() {
    let (client, host) = start_host(HostConfig::default());

    let err = client
        .call::<Value>("INowhere", "GetId", Vec::new())
        .await
        .unwrap_err();
    match err {
        HostError::Remote { status, message } => {
            assert_eq!(status, MethodStatus::ClassNotFound);
            assert_eq!(message, "INowhere");
        }
        other => panic!("unexpected error: {}", other),
    }

    client.close().await.unwrap();
    assert!(host.await.unwrap().is_ok());
}

#[tokio::test]
async fn test_calls_after_close_fail() {
    let (client, host) = start_host(HostConfig::default());
    client.close().await.unwrap();
    assert!(host.await.unwrap().is_ok());

    let err = client
        .call::<i32>("ISimultaneous", "GetId", Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, HostError::Closed));
}

#[tokio::test]
async fn test_host_stops_when_client_goes_away() {
    let (client, host) = start_host(HostConfig::default());
    let count: usize = client
        .call("IDataTyped", "GetLineCount", vec![json!([])])
        .await
        .unwrap();
    assert_eq!(count, 0);

    drop(client);
    let stopped = tokio::time::timeout(Duration::from_secs(5), host).await;
    assert!(stopped.unwrap().unwrap().is_ok());
}
