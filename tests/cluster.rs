//! End-to-end cluster tests: real leader and follower nodes served over HTTP
//! on ephemeral ports, driven through the public endpoints exactly the way
//! the experiment tooling drives a deployed cluster.

use axum::{
    Router,
    extract::Extension,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use quorum_kv::cluster::config::NodeConfig;
use quorum_kv::cluster::settings::RuntimeSettings;
use quorum_kv::cluster::types::{FollowerAddr, NodeRole};
use quorum_kv::replication::client::ReplicationClient;
use quorum_kv::replication::handlers::{handle_config, handle_replicate, handle_set};
use quorum_kv::replication::protocol::{ENDPOINT_CONFIG, ENDPOINT_REPLICATE, ENDPOINT_SET};
use quorum_kv::replication::writer::LeaderWriter;
use quorum_kv::storage::handlers::{
    handle_dump, handle_dump_versions, handle_get, handle_health, handle_stats,
};
use quorum_kv::storage::memory::KvStore;
use quorum_kv::storage::protocol::{
    ENDPOINT_DUMP, ENDPOINT_DUMP_VERSIONS, ENDPOINT_GET, ENDPOINT_HEALTH, ENDPOINT_STATS,
};
use quorum_kv::storage::version::{VersionPolicy, VersionSource};

struct TestNode {
    base_url: String,
    store: Arc<KvStore>,
    _shutdown_tx: watch::Sender<bool>,
}

fn read_routes() -> Router {
    Router::new()
        .route(ENDPOINT_HEALTH, get(handle_health))
        .route(&format!("{}/:key", ENDPOINT_GET), get(handle_get))
        .route(ENDPOINT_DUMP, get(handle_dump))
        .route(ENDPOINT_DUMP_VERSIONS, get(handle_dump_versions))
        .route(ENDPOINT_STATS, get(handle_stats))
}

fn node_config(role: NodeRole, followers: Vec<FollowerAddr>, quorum: usize) -> NodeConfig {
    NodeConfig {
        role,
        http_addr: "127.0.0.1:0".parse().unwrap(),
        followers,
        write_quorum: quorum,
        follower_timeout_ms: 2000,
        min_delay_ms: 0,
        max_delay_ms: 0,
        use_versioning: true,
        version_policy: VersionPolicy::Counter,
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Starts a follower node: full read surface plus `/replicate`, no `/set`.
async fn start_follower(versioned: bool) -> TestNode {
    let store = Arc::new(KvStore::new(versioned));
    let settings = Arc::new(RuntimeSettings::new(1, 0, 0));
    let config = Arc::new(node_config(NodeRole::Follower, vec![], 1));
    let (shutdown_tx, _shutdown_rx) = watch::channel(false);

    let app = read_routes()
        .route(ENDPOINT_REPLICATE, post(handle_replicate))
        .layer(Extension(config))
        .layer(Extension(store.clone()))
        .layer(Extension(settings));

    let addr = serve(app).await;
    TestNode {
        base_url: format!("http://{}", addr),
        store,
        _shutdown_tx: shutdown_tx,
    }
}

/// Starts a leader node wired to the given follower base addresses.
async fn start_leader(
    followers: Vec<FollowerAddr>,
    quorum: usize,
    min_delay_ms: u64,
    max_delay_ms: u64,
    versioned: bool,
) -> TestNode {
    let store = Arc::new(KvStore::new(versioned));
    let settings = Arc::new(RuntimeSettings::new(quorum, min_delay_ms, max_delay_ms));
    let versions = Arc::new(VersionSource::new(VersionPolicy::Counter));
    let config = Arc::new(node_config(NodeRole::Leader, followers.clone(), quorum));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let client = Arc::new(ReplicationClient::new(settings.clone()));
    let writer = Arc::new(LeaderWriter::new(
        store.clone(),
        versions,
        client,
        followers,
        settings.clone(),
        config.follower_timeout_ms,
        shutdown_rx.clone(),
    ));

    let app = read_routes()
        .route(ENDPOINT_SET, post(handle_set))
        .route(ENDPOINT_CONFIG, post(handle_config))
        .layer(Extension(writer))
        .layer(Extension(config))
        .layer(Extension(store.clone()))
        .layer(Extension(settings))
        .layer(Extension(shutdown_rx));

    let addr = serve(app).await;
    TestNode {
        base_url: format!("http://{}", addr),
        store,
        _shutdown_tx: shutdown_tx,
    }
}

fn follower_addrs(nodes: &[TestNode]) -> Vec<FollowerAddr> {
    nodes.iter().map(|n| FollowerAddr::new(&n.base_url)).collect()
}

/// Reserves an address nobody is listening on: bind an ephemeral port, then
/// drop the listener. Connections to it are refused.
fn dead_address() -> FollowerAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    FollowerAddr::new(&format!("http://{}", addr))
}

async fn set(client: &reqwest::Client, leader: &TestNode, key: &str, value: &str) -> serde_json::Value {
    client
        .post(format!("{}/set?key={}&value={}", leader.base_url, key, value))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn get_value(client: &reqwest::Client, node: &TestNode, key: &str) -> Option<String> {
    let response = client
        .get(format!("{}/get/{}", node.base_url, key))
        .send()
        .await
        .unwrap();
    if response.status() == reqwest::StatusCode::NOT_FOUND {
        return None;
    }
    Some(response.json().await.unwrap())
}

// ============================================================
// SCENARIOS
// ============================================================

#[tokio::test]
async fn basic_write_and_read_on_leader() {
    let followers = vec![start_follower(true).await, start_follower(true).await];
    let leader = start_leader(follower_addrs(&followers), 1, 0, 0, true).await;
    let client = reqwest::Client::new();

    let response = set(&client, &leader, "alpha", "one").await;
    assert_eq!(response["success"], true);
    assert_eq!(response["quorum"], 1);
    assert!(response["acks"].as_u64().unwrap() >= 1);

    assert_eq!(
        get_value(&client, &leader, "alpha").await,
        Some("one".to_string())
    );
}

#[tokio::test]
async fn full_replication_reaches_every_follower() {
    let followers: Vec<TestNode> = {
        let mut nodes = Vec::new();
        for _ in 0..5 {
            nodes.push(start_follower(true).await);
        }
        nodes
    };
    let leader = start_leader(follower_addrs(&followers), 3, 0, 1000, true).await;
    let client = reqwest::Client::new();

    let response = set(&client, &leader, "beta", "two").await;
    assert_eq!(response["success"], true);
    assert_eq!(response["quorum"], 3);
    assert!(response["acks"].as_u64().unwrap() >= 3);

    // The losers of the quorum race are still in flight; give them the full
    // delay bound to land.
    tokio::time::sleep(Duration::from_secs(2)).await;
    for follower in &followers {
        assert_eq!(
            get_value(&client, follower, "beta").await,
            Some("two".to_string())
        );
    }
}

#[tokio::test]
async fn partial_quorum_reports_failure_but_keeps_acks() {
    let alive = vec![
        start_follower(true).await,
        start_follower(true).await,
        start_follower(true).await,
    ];
    let mut followers = follower_addrs(&alive);
    followers.push(dead_address());
    followers.push(dead_address());

    let leader = start_leader(followers, 5, 0, 0, true).await;
    let client = reqwest::Client::new();

    let response = set(&client, &leader, "gamma", "three").await;
    assert_eq!(response["success"], false);
    assert_eq!(response["quorum"], 5);
    assert_eq!(response["acks"], 3);

    // The write still landed everywhere that was reachable.
    for follower in &alive {
        assert_eq!(
            get_value(&client, follower, "gamma").await,
            Some("three".to_string())
        );
    }
}

#[tokio::test]
async fn versioned_followers_converge_to_last_write_despite_reordering() {
    let followers = vec![start_follower(true).await, start_follower(true).await];
    let leader = start_leader(follower_addrs(&followers), 1, 0, 150, true).await;
    let client = reqwest::Client::new();

    for i in 0..30 {
        let key = format!("k{}", i);
        set(&client, &leader, &key, "A").await;
        set(&client, &leader, &key, "B").await;
    }

    // Everything in flight lands within the delay bound.
    tokio::time::sleep(Duration::from_millis(600)).await;

    for follower in &followers {
        for i in 0..30 {
            let key = format!("k{}", i);
            assert_eq!(
                get_value(&client, follower, &key).await,
                Some("B".to_string()),
                "follower regressed on {}",
                key
            );
        }
    }
}

#[tokio::test]
async fn naive_followers_exhibit_the_reorder_hazard() {
    // Same workload as the versioned scenario, but with arrival-order
    // followers. Some keys must end up holding the older write on some
    // follower while the leader holds the newer one.
    let followers = vec![start_follower(false).await, start_follower(false).await];
    let leader = start_leader(follower_addrs(&followers), 1, 0, 150, false).await;
    let client = reqwest::Client::new();

    let num_keys = 60;
    for i in 0..num_keys {
        let key = format!("k{}", i);
        set(&client, &leader, &key, "A").await;
        set(&client, &leader, &key, "B").await;
    }

    tokio::time::sleep(Duration::from_millis(600)).await;

    // The leader saw the writes in order.
    for i in 0..num_keys {
        let key = format!("k{}", i);
        assert_eq!(
            get_value(&client, &leader, &key).await,
            Some("B".to_string())
        );
    }

    // At least one follower kept a stale value for at least one key. With 60
    // keys, two followers and up to 150ms of random skew per delivery, a run
    // with zero reorderings is practically impossible.
    let mut stale = 0;
    for follower in &followers {
        for i in 0..num_keys {
            let key = format!("k{}", i);
            if get_value(&client, follower, &key).await == Some("A".to_string()) {
                stale += 1;
            }
        }
    }
    assert!(stale > 0, "expected at least one reordered delivery");
}

#[tokio::test]
async fn followers_do_not_accept_client_writes() {
    let follower = start_follower(true).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/set?key=x&value=y", follower.base_url))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    assert!(follower.store.is_empty());
}

// ============================================================
// SURFACE DETAILS
// ============================================================

#[tokio::test]
async fn health_reports_role() {
    let follower = start_follower(true).await;
    let leader = start_leader(vec![], 0, 0, 0, true).await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .get(format!("{}/health", leader.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["role"], "Leader");

    let body: serde_json::Value = client
        .get(format!("{}/health", follower.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["role"], "Follower");
}

#[tokio::test]
async fn dump_and_dump_versions_snapshot_the_store() {
    let leader = start_leader(vec![], 0, 0, 0, true).await;
    let client = reqwest::Client::new();

    set(&client, &leader, "a", "1").await;
    set(&client, &leader, "b", "2").await;
    set(&client, &leader, "b", "3").await;

    let dump: serde_json::Value = client
        .get(format!("{}/dump", leader.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dump["a"], "1");
    assert_eq!(dump["b"], "3");

    let versions: serde_json::Value = client
        .get(format!("{}/dump-versions", leader.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(versions["a"], 1);
    assert_eq!(versions["b"], 3);
}

#[tokio::test]
async fn get_missing_key_is_404() {
    let leader = start_leader(vec![], 0, 0, 0, true).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/get/ghost", leader.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn config_endpoint_updates_and_validates() {
    let followers = vec![start_follower(true).await, start_follower(true).await];
    let leader = start_leader(follower_addrs(&followers), 1, 0, 1000, true).await;
    let client = reqwest::Client::new();

    // Partial update, camelCase.
    let response = client
        .post(format!("{}/config", leader.base_url))
        .json(&serde_json::json!({"writeQuorum": 2, "maxDelayMs": 50}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["writeQuorum"], 2);
    assert_eq!(body["minDelayMs"], 0);
    assert_eq!(body["maxDelayMs"], 50);
    assert_eq!(body["followers"], 2);

    // The updated quorum applies to the next write.
    let response = set(&client, &leader, "cfg", "v").await;
    assert_eq!(response["quorum"], 2);

    // PascalCase aliases, as sent by the original experiment client.
    let response = client
        .post(format!("{}/config", leader.base_url))
        .json(&serde_json::json!({"WriteQuorum": 1, "MinDelayMs": 0, "MaxDelayMs": 100}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["writeQuorum"], 1);
    assert_eq!(body["maxDelayMs"], 100);

    // Out-of-range quorum is rejected and nothing changes.
    for bad in [0, 3] {
        let response = client
            .post(format!("{}/config", leader.base_url))
            .json(&serde_json::json!({"writeQuorum": bad}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    }
    let response = set(&client, &leader, "cfg", "w").await;
    assert_eq!(response["quorum"], 1);
}

#[tokio::test]
async fn set_rejects_missing_and_empty_keys() {
    let leader = start_leader(vec![], 0, 0, 0, true).await;
    let client = reqwest::Client::new();

    // Missing query parameters are rejected by extraction.
    let response = client
        .post(format!("{}/set", leader.base_url))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());

    // An empty key reaches the writer and is rejected at its boundary.
    let response = client
        .post(format!("{}/set?key=&value=x", leader.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(leader.store.is_empty());
}

#[tokio::test]
async fn stats_reports_entries_and_effective_config() {
    let leader = start_leader(vec![], 0, 0, 250, true).await;
    let client = reqwest::Client::new();

    set(&client, &leader, "s1", "v").await;
    set(&client, &leader, "s2", "v").await;

    let body: serde_json::Value = client
        .get(format!("{}/stats", leader.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["role"], "Leader");
    assert_eq!(body["entries"], 2);
    assert_eq!(body["max_delay_ms"], 250);
    assert_eq!(body["write_quorum"], 0);
}
