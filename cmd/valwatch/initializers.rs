use std::sync::Arc;

use tracing::{Level, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer, Registry, filter::Directive, fmt, layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};
use valwatch_monitor::{
    MonitorConfig,
    http::{HttpClient, HttpError, ReqwestClient},
    notifier::{LogNotifier, Notifier, TelegramNotifier},
    subscribers::{RegistryError, StaticSubscriberRegistry, SubscriberRegistry},
};

use crate::cli::Options;

/// Installs the global subscriber. `RUST_LOG` directives take precedence over `--log.level`.
pub fn init_tracing(opts: &Options) -> Result<(), TryInitError> {
    let log_filter = EnvFilter::builder()
        .with_default_directive(Directive::from(opts.log_level))
        .from_env_lossy();

    let include_target = matches!(opts.log_level, Level::DEBUG | Level::TRACE);

    let fmt_layer = fmt::layer()
        .with_target(include_target)
        .with_ansi(opts.log_color.use_ansi());

    Registry::default()
        .with(fmt_layer.with_filter(log_filter))
        .try_init()
}

pub fn init_http_client(config: &MonitorConfig) -> Result<Arc<dyn HttpClient>, HttpError> {
    Ok(Arc::new(ReqwestClient::new(config.http_timeout)?))
}

pub fn init_notifier(opts: &Options) -> Arc<dyn Notifier> {
    match opts.telegram() {
        Some((token, chat_id)) => {
            info!(chat_id, "delivering alerts to telegram");
            Arc::new(TelegramNotifier::new(token, chat_id))
        }
        None => {
            warn!("no telegram chat configured, alerts will only be logged");
            Arc::new(LogNotifier)
        }
    }
}

pub fn init_registry(opts: &Options) -> Result<Arc<dyn SubscriberRegistry>, RegistryError> {
    let Some(path) = &opts.subscribers_file else {
        info!("no subscribers file configured, alerts will carry no mentions");
        return Ok(Arc::new(StaticSubscriberRegistry::new()));
    };

    let registry = StaticSubscriberRegistry::from_json_file(path)?;
    info!(
        path = %path.display(),
        subscribers = registry.subscriber_count(),
        "loaded subscribers"
    );
    Ok(Arc::new(registry))
}
