use std::{io::IsTerminal, net::SocketAddr, path::PathBuf, time::Duration};

use clap::{Parser as ClapParser, ValueEnum};
use tracing::Level;
use url::Url;
use valwatch_monitor::{ConfigError, MonitorConfig};

#[allow(clippy::upper_case_acronyms)]
#[derive(ClapParser)]
#[command(
    name = "valwatch",
    version,
    about = "Watches a Cosmos validator set and alerts on validator state changes"
)]
pub struct CLI {
    #[command(flatten)]
    pub opts: Options,
}

#[derive(ClapParser, Debug, Clone)]
pub struct Options {
    #[arg(
        long = "api.primary",
        value_name = "URL",
        help = "Base URL of the primary Cosmos REST endpoint.",
        help_heading = "Endpoint options",
        env = "VALWATCH_API_PRIMARY"
    )]
    pub api_primary: Url,
    #[arg(
        long = "api.reserve",
        value_name = "URL",
        help = "Base URL used when the primary endpoint fails its liveness probe.",
        help_heading = "Endpoint options",
        env = "VALWATCH_API_RESERVE"
    )]
    pub api_reserve: Url,
    #[arg(
        long = "api.probe-path",
        value_name = "PATH",
        help = "Path probed on the primary endpoint. Defaults to the base URL.",
        help_heading = "Endpoint options",
        env = "VALWATCH_API_PROBE_PATH"
    )]
    pub api_probe_path: Option<String>,
    #[arg(
        long = "poll.interval",
        value_name = "SECONDS",
        default_value_t = 240,
        help = "Seconds between poll cycles.",
        help_heading = "Monitor options",
        env = "VALWATCH_POLL_INTERVAL"
    )]
    pub poll_interval: u64,
    #[arg(
        long = "http.timeout",
        value_name = "SECONDS",
        default_value_t = 15,
        help = "Timeout of every HTTP request. A hung request fails the cycle.",
        help_heading = "Monitor options",
        env = "VALWATCH_HTTP_TIMEOUT"
    )]
    pub http_timeout: u64,
    #[arg(
        long = "pagination.validators-limit",
        value_name = "LIMIT",
        default_value_t = 20_000,
        help = "Page size used when listing validators.",
        help_heading = "Monitor options",
        env = "VALWATCH_PAGINATION_VALIDATORS_LIMIT"
    )]
    pub validators_limit: u32,
    #[arg(
        long = "pagination.signing-infos-limit",
        value_name = "LIMIT",
        default_value_t = 2_000,
        help = "Page size used when listing signing infos.",
        help_heading = "Monitor options",
        env = "VALWATCH_PAGINATION_SIGNING_INFOS_LIMIT"
    )]
    pub signing_infos_limit: u32,
    #[arg(
        long = "bech32.valcons-prefix",
        value_name = "PREFIX",
        default_value = "storyvalcons",
        help = "Bech32 prefix of validator consensus addresses on the monitored network.",
        help_heading = "Monitor options",
        env = "VALWATCH_BECH32_VALCONS_PREFIX"
    )]
    pub valcons_prefix: String,
    #[arg(
        long = "subscribers.file",
        value_name = "SUBSCRIBERS_FILE",
        help = "JSON file mapping subscriber ids to the operator address(es) they follow.",
        long_help = "Format: {\"<subscriber id>\": \"<operator address>\"}, the value may also be a list of addresses. Followers are mentioned in the alerts of their validators.",
        help_heading = "Alert options",
        env = "VALWATCH_SUBSCRIBERS_FILE"
    )]
    pub subscribers_file: Option<PathBuf>,
    #[arg(
        long = "telegram.token",
        value_name = "TOKEN",
        requires = "telegram_chat_id",
        help = "Telegram bot token. Alerts are written to the log when unset.",
        help_heading = "Alert options",
        env = "VALWATCH_TELEGRAM_TOKEN",
        hide_env_values = true
    )]
    pub telegram_token: Option<String>,
    #[arg(
        long = "telegram.chat-id",
        value_name = "CHAT_ID",
        requires = "telegram_token",
        allow_negative_numbers = true,
        help = "Telegram chat receiving the alerts.",
        help_heading = "Alert options",
        env = "VALWATCH_TELEGRAM_CHAT_ID"
    )]
    pub telegram_chat_id: Option<i64>,
    #[arg(
        long = "status.addr",
        value_name = "ADDRESS",
        help = "Socket address of the read-only status API. Disabled when unset.",
        help_heading = "Status server options",
        env = "VALWATCH_STATUS_ADDR"
    )]
    pub status_addr: Option<SocketAddr>,
    #[arg(
        long = "log.level",
        default_value_t = Level::INFO,
        value_name = "LOG_LEVEL",
        env = "VALWATCH_LOG_LEVEL",
        help = "The verbosity level used for logs.",
        long_help = "Possible values: info, debug, trace, warn, error",
        help_heading = "Log options"
    )]
    pub log_level: Level,
    #[arg(
        long = "log.color",
        value_enum,
        ignore_case = true,
        default_value_t = ColorMode::Auto,
        help = "Output logs with ANSI color codes.",
        help_heading = "Log options",
        env = "VALWATCH_LOG_COLOR"
    )]
    pub log_color: ColorMode,
}

impl Options {
    /// Validated monitor settings. Invalid values are fatal at startup.
    pub fn monitor_config(&self) -> Result<MonitorConfig, ConfigError> {
        let config = MonitorConfig::new(self.api_primary.clone(), self.api_reserve.clone())
            .with_probe_path(self.api_probe_path.clone())
            .with_timings(
                Duration::from_secs(self.poll_interval),
                Duration::from_secs(self.http_timeout),
            )
            .with_page_limits(self.validators_limit, self.signing_infos_limit)
            .with_valcons_prefix(self.valcons_prefix.clone());
        config.validate()?;
        Ok(config)
    }

    pub fn telegram(&self) -> Option<(String, i64)> {
        self.telegram_token.clone().zip(self.telegram_chat_id)
    }
}

/// When log lines carry ANSI colors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ColorMode {
    /// Color only when stdout is a terminal.
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorMode {
    pub fn use_ansi(self) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => std::io::stdout().is_terminal(),
        }
    }
}
