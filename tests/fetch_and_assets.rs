mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use blocklaunch::core::assets::AssetStore;
use blocklaunch::core::auth::{offline_uuid, LaunchAccountProfile};
use blocklaunch::core::downloader::checksum::sha1_hex;
use blocklaunch::core::downloader::{FetchState, Fetcher, ProgressEvent};
use blocklaunch::core::version::VersionDescriptor;

use common::{fast_policy, fetcher, RecordingProgress, ScriptedTransport};

const ASSET_BASE: &str = "https://assets.example.invalid";
const INDEX_URL: &str = "https://meta.example.invalid/indexes/5.json";

fn object_url(hash: &str) -> String {
    format!("{ASSET_BASE}/{}/{hash}", &hash[..2])
}

#[tokio::test]
async fn asset_failure_is_isolated_to_its_object() {
    let dir = tempfile::TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    let progress = Arc::new(RecordingProgress::default());
    let fetcher = Fetcher::new(transport.clone(), fast_policy(), progress.clone());

    let bodies = [b"one".to_vec(), b"two".to_vec(), b"three".to_vec()];
    let hashes: Vec<String> = bodies.iter().map(|b| sha1_hex(b)).collect();
    let index = json!({"objects": {
        "a.png": {"hash": hashes[0], "size": 3},
        "b.ogg": {"hash": hashes[1], "size": 3},
        "c.json": {"hash": hashes[2], "size": 5}
    }})
    .to_string();
    transport.serve(INDEX_URL, index);
    for (hash, body) in hashes.iter().zip(bodies) {
        transport.serve(&object_url(hash), body);
    }
    transport.fail_always(&object_url(&hashes[1]));

    let descriptor = VersionDescriptor::parse(
        &json!({"id": "1.16.5", "assetIndex": {"id": "5", "url": INDEX_URL}}).to_string(),
    )
    .unwrap();
    let store = AssetStore::new(fetcher, dir.path().join("assets"), ASSET_BASE, 2);

    assert!(store.ensure_assets(&descriptor).await);
    assert!(store.object_path(&hashes[0]).unwrap().is_file());
    assert!(!store.object_path(&hashes[1]).unwrap().exists());
    assert!(store.object_path(&hashes[2]).unwrap().is_file());
    assert!(dir.path().join("assets/indexes/5.json").is_file());

    let failing = object_url(&hashes[1]);
    let attempts = transport.calls().iter().filter(|u| **u == failing).count();
    assert_eq!(attempts, 5);

    let last = progress
        .events()
        .into_iter()
        .filter(|e| matches!(e, ProgressEvent::Assets { .. }))
        .last();
    assert_eq!(last, Some(ProgressEvent::Assets { done: 3, total: 3 }));
}

#[tokio::test]
async fn unreachable_index_fails_but_absent_index_is_skipped() {
    let dir = tempfile::TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.fail_always(INDEX_URL);
    let store = AssetStore::new(fetcher(transport.clone()), dir.path().join("assets"), ASSET_BASE, 1);

    let with_index = VersionDescriptor::parse(
        &json!({"id": "1.16.5", "assetIndex": {"id": "5", "url": INDEX_URL}}).to_string(),
    )
    .unwrap();
    assert!(!store.ensure_assets(&with_index).await);

    transport.reset_calls();
    let without = VersionDescriptor::parse(r#"{"id": "old"}"#).unwrap();
    assert!(store.ensure_assets(&without).await);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn index_without_digest_is_reused_once_on_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    transport.serve(INDEX_URL, json!({"objects": {}}).to_string());
    let store = AssetStore::new(fetcher(transport.clone()), dir.path().join("assets"), ASSET_BASE, 1);
    let descriptor = VersionDescriptor::parse(
        &json!({"id": "1.16.5", "assetIndex": {"id": "5", "url": INDEX_URL}}).to_string(),
    )
    .unwrap();

    assert!(store.ensure_assets(&descriptor).await);
    assert_eq!(transport.call_count(), 1);

    transport.reset_calls();
    assert!(store.ensure_assets(&descriptor).await);
    assert_eq!(transport.call_count(), 0);
}

#[tokio::test]
async fn third_attempt_succeeds_after_exponential_backoff() {
    let dir = tempfile::TempDir::new().unwrap();
    let transport = ScriptedTransport::new();
    let url = "https://files.example.invalid/client.jar";
    transport.serve(url, b"payload".to_vec());
    transport.fail_times(url, 2);

    let dest = dir.path().join("versions/x/x.jar");
    let outcome = fetcher(transport.clone())
        .fetch_outcome(url, &dest, "client x", Some(&sha1_hex(b"payload")))
        .await;

    assert_eq!(outcome.state, FetchState::Succeeded { attempt: 2 });
    assert_eq!(outcome.attempts, 3);
    assert_eq!(
        outcome.delays,
        vec![Duration::from_millis(1), Duration::from_millis(2)]
    );
    assert_eq!(std::fs::read(&dest).unwrap(), b"payload");
    assert_eq!(transport.call_count(), 3);
}

#[test]
fn offline_identity_matches_known_value() {
    assert_eq!(offline_uuid("Steve"), "5627dd98-e6be-bc21-f8a8-e92344183641");
    assert_eq!(
        LaunchAccountProfile::offline("").uuid,
        "a01e3843-e521-5998-558a-f459800e4d11"
    );
}
