//! Validator monitor core.
//!
//! Each poll cycle picks a live REST endpoint ([`endpoint`]), fetches validators, signing
//! infos and the signing window ([`fetcher`]), derives uptime ([`uptime`]) and a snapshot
//! ([`snapshot`]), publishes it through the [`cache`], and diffs it against the previous
//! cycle ([`diff`]) to produce at most one alert per validator, delivered by a [`notifier`].

pub mod alerts;
pub mod cache;
pub mod config;
pub mod diff;
pub mod endpoint;
pub mod fetcher;
pub mod http;
pub mod notifier;
pub mod service;
pub mod snapshot;
pub mod status_server;
pub mod subscribers;
pub mod uptime;

pub use cache::{CachedSnapshot, SnapshotCache};
pub use config::{ConfigError, MonitorConfig};
pub use service::{CycleError, CycleReport, Monitor};
