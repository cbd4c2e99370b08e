//! Structured logging setup
//!
//! Installs a `tracing-subscriber` registry with:
//! - an `EnvFilter` (`RUST_LOG` wins over the configured level)
//! - a [`SamplingLayer`] thinning out debug/info volume
//! - a JSON or pretty `fmt` layer, optionally behind a non-blocking writer
//!
//! Configuration comes from `CTLR_LOG_*` environment variables, see
//! [`LogConfig::from_env`].

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{Level, Metadata, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

/// Which events reach the output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMode {
    /// Everything
    All,
    /// WARN and ERROR only
    ErrorOnly,
    /// A fraction of lower levels, every WARN and ERROR
    Sampled,
}

impl SamplingMode {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "all" => SamplingMode::All,
            "error-only" | "error_only" => SamplingMode::ErrorOnly,
            _ => SamplingMode::Sampled,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    pub sampling_mode: SamplingMode,
    /// Fraction (0.0-1.0) of sub-WARN events kept in `Sampled` mode
    pub sampling_rate: f64,
    /// Write through a background thread
    pub async_logging: bool,
    /// Extra comma-separated filter directives, e.g. `ctlroute::pipeline=debug`
    pub target_filter: Option<String>,
    /// Include file:line
    pub include_location: bool,
}

impl LogConfig {
    /// Read `CTLR_LOG_LEVEL`, `CTLR_LOG_FORMAT`, `CTLR_LOG_SAMPLING_MODE`,
    /// `CTLR_LOG_SAMPLING_RATE`, `CTLR_LOG_ASYNC`, `CTLR_LOG_TARGET_FILTER` and
    /// `CTLR_LOG_INCLUDE_LOCATION`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let flag = |key: &str, default: bool| {
            lookup(key)
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(default)
        };
        Self {
            log_level: lookup("CTLR_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: LogFormat::parse(&lookup("CTLR_LOG_FORMAT").unwrap_or_default()),
            sampling_mode: SamplingMode::parse(
                &lookup("CTLR_LOG_SAMPLING_MODE").unwrap_or_default(),
            ),
            sampling_rate: lookup("CTLR_LOG_SAMPLING_RATE")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1.0),
            async_logging: flag("CTLR_LOG_ASYNC", false),
            target_filter: lookup("CTLR_LOG_TARGET_FILTER"),
            include_location: flag("CTLR_LOG_INCLUDE_LOCATION", false),
        }
    }

    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            sampling_mode: SamplingMode::All,
            sampling_rate: 1.0,
            async_logging: false,
            target_filter: None,
            include_location: true,
        }
    }

    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            sampling_mode: SamplingMode::Sampled,
            sampling_rate: 0.1,
            async_logging: true,
            target_filter: None,
            include_location: false,
        }
    }
}

/// Keeps every n-th sub-WARN event in `Sampled` mode
pub struct SamplingLayer {
    mode: SamplingMode,
    sampling_rate: f64,
    counter: AtomicU64,
}

impl SamplingLayer {
    pub fn new(mode: SamplingMode, sampling_rate: f64) -> Self {
        Self {
            mode,
            sampling_rate: sampling_rate.clamp(0.0, 1.0),
            counter: AtomicU64::new(0),
        }
    }

    fn should_sample(&self, metadata: &Metadata<'_>) -> bool {
        let important = matches!(*metadata.level(), Level::WARN | Level::ERROR);
        match self.mode {
            SamplingMode::All => true,
            SamplingMode::ErrorOnly => important,
            SamplingMode::Sampled => {
                if important {
                    return true;
                }
                if self.sampling_rate <= 0.0 {
                    return false;
                }
                let interval = (1.0 / self.sampling_rate).round().max(1.0) as u64;
                self.counter.fetch_add(1, Ordering::Relaxed) % interval == 0
            }
        }
    }
}

impl<S> Layer<S> for SamplingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn enabled(&self, metadata: &Metadata<'_>, _ctx: LayerContext<'_, S>) -> bool {
        self.should_sample(metadata)
    }
}

/// Flushes buffered output when dropped; hold it for the life of the process
#[must_use = "dropping the guard stops async log output"]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

fn build_filter(config: &LogConfig) -> EnvFilter {
    let level = parse_level(&config.log_level);
    let mut filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    // client disconnects are logged by the engine at info
    if let Ok(directive) = "may_minihttp=warn".parse() {
        filter = filter.add_directive(directive);
    }

    for directive in config
        .target_filter
        .iter()
        .flat_map(|f| f.split(','))
        .map(str::trim)
        .filter(|d| !d.is_empty())
    {
        match directive.parse() {
            Ok(d) => filter = filter.add_directive(d),
            Err(_) => eprintln!("Warning: invalid log filter directive: {directive}"),
        }
    }
    filter
}

/// Install the global subscriber.
///
/// ```no_run
/// use ctlroute::otel::{init_logging_with_config, LogConfig};
///
/// let _guard = init_logging_with_config(&LogConfig::from_env())
///     .expect("logging already initialized");
/// ```
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<LoggingGuard> {
    let registry = tracing_subscriber::registry()
        .with(build_filter(config))
        .with(SamplingLayer::new(config.sampling_mode, config.sampling_rate));

    let (writer, worker) = if config.async_logging {
        let (non_blocking, guard) = tracing_appender::non_blocking(std::io::stdout());
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(non_blocking), Some(guard))
    } else {
        (tracing_subscriber::fmt::writer::BoxMakeWriter::new(std::io::stdout), None)
    };

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    registry
        .with(fmt_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(LoggingGuard { _worker: worker })
}
