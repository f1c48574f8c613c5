/// File store tests
///
/// End-to-end behavior of the JSON-file store through the manager:
/// durable writes, cross-store lock contention and retry recovery.
/// Run with: cargo test --test file_store_tests
use std::time::Duration;

use sysproxy::store::{FileStore, InterfaceInfo};
use sysproxy::{ProxyConfiguration, ProxyError, ProxyManager, ProxyServer, RetryPolicy};

fn wifi_info() -> InterfaceInfo {
    InterfaceInfo {
        name: "Wi-Fi".into(),
        bsd_name: Some("en0".into()),
        raw_type: Some("IEEE80211".into()),
        enabled: true,
    }
}

fn http_config(host: &str, port: u16) -> ProxyConfiguration {
    let mut config = ProxyConfiguration::empty();
    config.http_proxy = Some(ProxyServer::new(host, port));
    config
}

#[tokio::test]
async fn write_survives_manager_teardown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    {
        let store = FileStore::new(&path);
        store.register_interface(&wifi_info()).unwrap();
        let manager = ProxyManager::new(store);
        manager
            .set_proxy("Wi-Fi", &http_config("127.0.0.1", 7890))
            .await
            .unwrap();
    }

    // A fresh store over the same file sees the committed state
    let manager = ProxyManager::new(FileStore::new(&path));
    let config = manager.get_configuration("Wi-Fi").await.unwrap();
    assert_eq!(config.http_proxy.as_ref().unwrap().port, 7890);
}

#[tokio::test]
async fn state_file_stays_valid_json_across_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = FileStore::new(&path);
    store.register_interface(&wifi_info()).unwrap();
    let manager = ProxyManager::new(store);

    for port in [1000u16, 2000, 3000] {
        manager
            .set_proxy("Wi-Fi", &http_config("127.0.0.1", port))
            .await
            .unwrap();
        let parsed: serde_json::Value =
            serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert!(parsed.get("interfaces").is_some());
    }
}

#[tokio::test]
async fn foreign_lock_file_exhausts_a_no_retry_policy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = FileStore::new(&path);
    store.register_interface(&wifi_info()).unwrap();

    // Simulate another process holding the lock
    let lock_path = dir.path().join("state.json.lock");
    std::fs::write(&lock_path, "other-process").unwrap();

    let manager = ProxyManager::new(store);
    let err = manager
        .set_proxy_with(
            "Wi-Fi",
            &http_config("127.0.0.1", 7890),
            RetryPolicy::none(),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProxyError::RetryExhausted { .. }));

    // Releasing the lock lets the next write through
    std::fs::remove_file(&lock_path).unwrap();
    manager
        .set_proxy("Wi-Fi", &http_config("127.0.0.1", 7890))
        .await
        .unwrap();
}

#[tokio::test]
async fn contending_writer_retries_until_the_lock_frees() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = FileStore::new(&path);
    store.register_interface(&wifi_info()).unwrap();

    let lock_path = dir.path().join("state.json.lock");
    std::fs::write(&lock_path, "other-process").unwrap();

    // Free the lock while the writer is backing off
    let unlocker = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        std::fs::remove_file(&lock_path).unwrap();
    });

    let manager = ProxyManager::new(store);
    let policy = RetryPolicy::new(10, Duration::from_millis(20), 1.0);
    manager
        .set_proxy_with("Wi-Fi", &http_config("127.0.0.1", 7890), policy, None)
        .await
        .unwrap();
    unlocker.await.unwrap();

    let config = manager.get_configuration("Wi-Fi").await.unwrap();
    assert!(config.has_manual_proxy_enabled());
}

#[tokio::test]
async fn two_stores_on_one_file_serialize_their_writes() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");

    let store = FileStore::new(&path);
    store.register_interface(&wifi_info()).unwrap();
    store.register_interface(&InterfaceInfo {
        name: "Ethernet".into(),
        bsd_name: Some("en1".into()),
        raw_type: Some("Ethernet".into()),
        enabled: true,
    }).unwrap();

    let manager_a = ProxyManager::new(FileStore::new(&path));
    let manager_b = ProxyManager::new(FileStore::new(&path));

    let policy = RetryPolicy::new(20, Duration::from_millis(5), 1.0);
    let config_a = http_config("127.0.0.1", 1111);
    let config_b = http_config("127.0.0.1", 2222);
    let write_a = manager_a.set_proxy_with(
        "Wi-Fi",
        &config_a,
        policy,
        None,
    );
    let write_b = manager_b.set_proxy_with(
        "Ethernet",
        &config_b,
        policy,
        None,
    );
    let (a, b) = tokio::join!(write_a, write_b);
    a.unwrap();
    b.unwrap();

    // Neither write clobbered the other
    let reader = ProxyManager::new(FileStore::new(&path));
    assert_eq!(
        reader
            .get_configuration("Wi-Fi")
            .await
            .unwrap()
            .http_proxy
            .unwrap()
            .port,
        1111
    );
    assert_eq!(
        reader
            .get_configuration("Ethernet")
            .await
            .unwrap()
            .http_proxy
            .unwrap()
            .port,
        2222
    );
}
