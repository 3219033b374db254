use packstore_core::compute_hash;
use packstore_server::config::{ClusterConfig, Config, NodeConfig, PeerConfig, SyncConfig};
use packstore_server::server::{build_router, build_state};
use std::path::PathBuf;
use std::time::Duration;

async fn spawn_node(data_dir: PathBuf, peers: Vec<PeerConfig>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap().to_string();

    let config = Config {
        node: NodeConfig {
            node_id: format!("node-{}", address),
            bind_addr: address.clone(),
            advertise_addr: address.clone(),
            data_dir,
        },
        cluster: ClusterConfig { peers },
        sync: SyncConfig::default(),
    };

    let state = build_state(&config).unwrap();
    let app = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn wait_for_file(client: &reqwest::Client, url: &str) -> bytes::Bytes {
    for _ in 0..200 {
        let response = client.get(url).send().await.unwrap();
        if response.status() == reqwest::StatusCode::OK {
            return response.bytes().await.unwrap();
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("file never appeared at {}", url);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn put_read_meta_list_delete_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let address = spawn_node(dir.path().to_path_buf(), vec![]).await;
    let client = reqwest::Client::new();
    let base = format!("http://{}/files", address);

    let response = client
        .put(format!("{}/configs/a.jar?sig=s1,s2", base))
        .body(&b"jar-bytes"[..])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);
    let created: serde_json::Value = response.json().await.unwrap();
    assert_eq!(created["name"], "a.jar");
    assert_eq!(
        created["sha512"],
        serde_json::Value::String(compute_hash(b"jar-bytes"))
    );
    assert_eq!(created["sig"], serde_json::json!(["s1", "s2"]));

    let response = client
        .get(format!("{}/configs/a.jar", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert_eq!(
        response.headers()[reqwest::header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(response.bytes().await.unwrap().as_ref(), b"jar-bytes");

    let response = client
        .get(format!("{}/configs/a.jar?meta=true", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let meta: serde_json::Value = response.json().await.unwrap();
    assert_eq!(meta["size"], serde_json::json!(9));
    assert_eq!(
        meta["sha512"],
        serde_json::Value::String(compute_hash(b"jar-bytes"))
    );

    let response = client.get(format!("{}/configs", base)).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let listing: serde_json::Value = response.json().await.unwrap();
    let files = listing["files"].as_array().unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0]["name"], "a.jar");

    let response = client
        .get(format!("{}/configs/missing.jar", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let response = client
        .get(format!("{}/configs//bad", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

    let response = client
        .delete(format!("{}/configs/a.jar", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);

    let response = client
        .delete(format!("{}/configs/a.jar", base))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn sync_pushes_to_live_peers_and_reports_down_ones() {
    let dir_b = tempfile::tempdir().unwrap();
    let address_b = spawn_node(dir_b.path().to_path_buf(), vec![]).await;

    let dir_a = tempfile::tempdir().unwrap();
    let address_a = spawn_node(
        dir_a.path().to_path_buf(),
        vec![
            PeerConfig {
                node_id: "b".to_string(),
                address: address_b.clone(),
            },
            PeerConfig {
                node_id: "down".to_string(),
                address: "127.0.0.1:1".to_string(),
            },
        ],
    )
    .await;

    let client = reqwest::Client::new();

    let response = client
        .put(format!("http://{}/files/plugins/p.jar", address_a))
        .body(&b"plugin-bytes"[..])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::CREATED);

    let response = client
        .get(format!("http://{}/files/absent.jar?sync=true", address_a))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let response = client
        .get(format!(
            "http://{}/files/plugins/p.jar?sync=true",
            address_a
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let report: serde_json::Value = response.json().await.unwrap();
    assert_eq!(report["dispatched"], serde_json::json!(1));
    assert_eq!(report["unreachable"], serde_json::json!(["127.0.0.1:1"]));

    let body = wait_for_file(
        &client,
        &format!("http://{}/files/plugins/p.jar", address_b),
    )
    .await;
    assert_eq!(body.as_ref(), b"plugin-bytes");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn get_from_triggers_async_pull() {
    let dir_a = tempfile::tempdir().unwrap();
    let address_a = spawn_node(dir_a.path().to_path_buf(), vec![]).await;

    let dir_c = tempfile::tempdir().unwrap();
    let address_c = spawn_node(dir_c.path().to_path_buf(), vec![]).await;

    let client = reqwest::Client::new();

    client
        .put(format!("http://{}/files/plugins/p.jar?sig=sig-a", address_a))
        .body(&b"plugin-bytes"[..])
        .send()
        .await
        .unwrap();

    let response = client
        .get(format!(
            "http://{}/files/plugins/p.jar?getFrom={}",
            address_c, address_a
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let accepted: serde_json::Value = response.json().await.unwrap();
    assert_eq!(accepted["accepted"], serde_json::json!(true));

    let body = wait_for_file(
        &client,
        &format!("http://{}/files/plugins/p.jar", address_c),
    )
    .await;
    assert_eq!(body.as_ref(), b"plugin-bytes");

    // signatures travel with the fetched entry
    let response = client
        .get(format!(
            "http://{}/files/plugins/p.jar?meta=true",
            address_c
        ))
        .send()
        .await
        .unwrap();
    let meta: serde_json::Value = response.json().await.unwrap();
    assert_eq!(meta["sig"], serde_json::json!(["sig-a"]));
    assert_eq!(
        meta["sha512"],
        serde_json::Value::String(compute_hash(b"plugin-bytes"))
    );
}
