#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use reqwest::StatusCode;
use serde_json::Value;
use std::{collections::BTreeMap, time::SystemTime};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use valwatch_common::{BondStatus, Snapshot, ValidatorSnapshotEntry};
use valwatch_monitor::{SnapshotCache, status_server};

fn entry(moniker: &str, status: BondStatus, jailed: bool, uptime: f64) -> ValidatorSnapshotEntry {
    ValidatorSnapshotEntry {
        moniker: moniker.to_owned(),
        uptime_percent: uptime,
        status,
        jailed,
        commission: 0.05,
    }
}

fn snapshot() -> Snapshot {
    Snapshot::new(BTreeMap::from([
        (
            "storyvaloper1aaa".to_owned(),
            entry("zeta", BondStatus::Bonded, false, 99.5),
        ),
        (
            "storyvaloper1bbb".to_owned(),
            entry("Alpha", BondStatus::Bonded, false, 82.0),
        ),
        (
            "storyvaloper1ccc".to_owned(),
            entry("jailed-node", BondStatus::Bonded, true, 0.0),
        ),
        (
            "storyvaloper1ddd".to_owned(),
            entry("idle", BondStatus::Unbonded, false, 0.0),
        ),
    ]))
}

async fn start(cache: SnapshotCache) -> (String, CancellationToken) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let shutdown = CancellationToken::new();
    tokio::spawn(status_server::serve(listener, cache, shutdown.clone()));
    (base, shutdown)
}

#[tokio::test]
async fn reports_unavailable_before_first_cycle() {
    let (base, shutdown) = start(SnapshotCache::new()).await;

    let health = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);

    let summary = reqwest::get(format!("{base}/api/v1/summary")).await.unwrap();
    assert_eq!(summary.status(), StatusCode::SERVICE_UNAVAILABLE);

    shutdown.cancel();
}

#[tokio::test]
async fn serves_summary_and_health() {
    let cache = SnapshotCache::new();
    cache.replace(snapshot(), SystemTime::now());
    let (base, shutdown) = start(cache).await;

    let health = reqwest::get(format!("{base}/health")).await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let health: Value = health.json().await.unwrap();
    assert_eq!(health["status"], "ok");
    assert!(health["age_seconds"].as_u64().unwrap() < 60);

    let summary: Value = reqwest::get(format!("{base}/api/v1/summary"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(summary["total"], 4);
    assert_eq!(summary["active"], 2);
    assert_eq!(summary["inactive"], 2);
    assert_eq!(summary["jailed"], 1);

    shutdown.cancel();
}

#[tokio::test]
async fn lists_active_validators_sorted_by_moniker() {
    let cache = SnapshotCache::new();
    cache.replace(snapshot(), SystemTime::now());
    let (base, shutdown) = start(cache).await;

    let validators: Vec<Value> = reqwest::get(format!("{base}/api/v1/validators"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let listed: Vec<(&str, &str)> = validators
        .iter()
        .map(|v| {
            (
                v["moniker"].as_str().unwrap(),
                v["uptime_band"].as_str().unwrap(),
            )
        })
        .collect();
    assert_eq!(listed, vec![("Alpha", "fair"), ("zeta", "excellent")]);

    shutdown.cancel();
}

#[tokio::test]
async fn looks_up_single_validator_case_insensitively() {
    let cache = SnapshotCache::new();
    cache.replace(snapshot(), SystemTime::now());
    let (base, shutdown) = start(cache).await;

    let found = reqwest::get(format!("{base}/api/v1/validators/StoryValoper1CCC"))
        .await
        .unwrap();
    assert_eq!(found.status(), StatusCode::OK);
    let found: Value = found.json().await.unwrap();
    assert_eq!(found["operator_address"], "storyvaloper1ccc");
    assert_eq!(found["jailed"], true);
    assert_eq!(found["status"], "BOND_STATUS_BONDED");
    assert!(found["uptime_band"].is_null());

    let missing = reqwest::get(format!("{base}/api/v1/validators/storyvaloper1zzz"))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);

    shutdown.cancel();
}
