use std::str::FromStr;
use std::time::Duration;

/// Print server configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | POLL_INTERVAL_MS | 1000 | Status poll period per printer |
/// | ERROR_THRESHOLD | 3 | Consecutive fetch errors before a forced close |
/// | EVENT_CAPACITY | 64 | Buffered status/ready events per subscriber |
/// | LOG_LEVEL | info | tracing filter, overridden by RUST_LOG |
/// | LOG_DIR | - | Daily rolling log files go here when set |
/// | PRINTERS | - | `name=host:port[/width]`, comma separated |
/// | PRINT_ON_READY | - | Markup file printed when a printer becomes ready |
/// | SHUTDOWN_AFTER_SECS | - | Close the fleet after this many seconds |
///
/// # Example
///
/// ```ignore
/// PRINTERS="bar=192.168.1.214:9100/42,kitchen=192.168.1.215:9100" cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    pub fleet: FleetConfig,
    pub log_level: String,
    pub log_dir: Option<String>,
    pub printers: Vec<PrinterEndpoint>,
    pub print_on_ready: Option<String>,
    pub shutdown_after: Option<Duration>,
}

impl Config {
    /// Load from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = FleetConfig::default();
        Self {
            fleet: FleetConfig {
                poll_interval: env_parse("POLL_INTERVAL_MS")
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.poll_interval),
                error_threshold: env_parse("ERROR_THRESHOLD").unwrap_or(defaults.error_threshold),
                event_capacity: env_parse("EVENT_CAPACITY").unwrap_or(defaults.event_capacity),
            },
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
            printers: std::env::var("PRINTERS")
                .map(|v| parse_printers(&v))
                .unwrap_or_default(),
            print_on_ready: std::env::var("PRINT_ON_READY").ok(),
            shutdown_after: env_parse("SHUTDOWN_AFTER_SECS").map(Duration::from_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Polling parameters shared by every printer of a fleet
#[derive(Debug, Clone)]
pub struct FleetConfig {
    pub poll_interval: Duration,
    /// Consecutive status fetch failures that force a close
    pub error_threshold: u32,
    /// Broadcast channel capacity for status and ready events
    pub event_capacity: usize,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            error_threshold: 3,
            event_capacity: 64,
        }
    }
}

/// A network printer declared in `PRINTERS`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterEndpoint {
    pub name: String,
    pub addr: String,
    pub width: Option<usize>,
}

impl FromStr for PrinterEndpoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, target) = s
            .split_once('=')
            .ok_or_else(|| format!("missing '=' in printer entry: {}", s))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("empty printer name: {}", s));
        }

        let (addr, width) = match target.split_once('/') {
            Some((addr, width)) => {
                let width = width
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid width in printer entry: {}", s))?;
                (addr, Some(width))
            }
            None => (target, None),
        };

        Ok(Self {
            name: name.to_string(),
            addr: addr.trim().to_string(),
            width,
        })
    }
}

/// Parse a comma separated printer list, skipping invalid entries
pub fn parse_printers(value: &str) -> Vec<PrinterEndpoint> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|entry| match entry.parse() {
            Ok(endpoint) => Some(endpoint),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring printer entry");
                None
            }
        })
        .collect()
}
