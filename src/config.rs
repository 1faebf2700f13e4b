//! Configuration management for SmsGate.
//!
//! Configuration is read from a YAML or JSON file and can be overridden by
//! environment variables prefixed with `SMSGATE`, using `__` to separate
//! nesting levels (`SMSGATE__ADMISSION__DEFAULT_SENDER_LIMIT=4`).

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use tracing::info;

use crate::error::{Result, SmsGateError};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "SMSGATE";

/// Main configuration for the SmsGate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Admission control configuration
    pub admission: AdmissionConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// gRPC server address
    #[serde(default = "default_grpc_addr")]
    pub grpc_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            grpc_addr: default_grpc_addr(),
        }
    }
}

fn default_grpc_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::LOCALHOST, 8081))
}

/// Admission control configuration: the global budget, the per-sender
/// budgets and the idle threshold after which sender state is dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Capacity of the limiter shared by every sender
    #[serde(alias = "requests_per_second")]
    pub global_requests_per_second: u32,

    /// Capacity for senders without an override
    #[serde(default = "default_sender_limit")]
    pub default_sender_limit: u32,

    /// Seconds without an admission after which a sender's limiter is evicted
    #[serde(default = "default_sender_inactivity_seconds")]
    pub sender_inactivity_seconds: u64,

    /// Per-sender capacity overrides keyed by phone number
    #[serde(default)]
    pub sender_limits: HashMap<String, u32>,

    /// Whether limiters that never admitted anything are evicted on the next sweep
    #[serde(default = "default_evict_never_admitted")]
    pub evict_never_admitted: bool,
}

fn default_sender_limit() -> u32 {
    2
}

fn default_sender_inactivity_seconds() -> u64 {
    60
}

fn default_evict_never_admitted() -> bool {
    true
}

impl AdmissionConfig {
    /// Create an admission configuration with the given global capacity and
    /// defaults for everything else.
    pub fn new(global_requests_per_second: u32) -> Self {
        Self {
            global_requests_per_second,
            default_sender_limit: default_sender_limit(),
            sender_inactivity_seconds: default_sender_inactivity_seconds(),
            sender_limits: HashMap::new(),
            evict_never_admitted: default_evict_never_admitted(),
        }
    }

    /// Add a per-sender capacity override.
    pub fn with_sender_limit(mut self, sender: impl Into<String>, limit: u32) -> Self {
        self.sender_limits.insert(sender.into(), limit);
        self
    }

    /// Check the configuration for values the gate cannot run with.
    ///
    /// A sender limit of zero is accepted and means that sender is always
    /// rejected.
    pub fn validate(&self) -> Result<()> {
        if self.global_requests_per_second == 0 {
            return Err(SmsGateError::Config(
                "global_requests_per_second must be greater than zero".to_string(),
            ));
        }
        if let Some(sender) = self.sender_limits.keys().find(|s| s.is_empty()) {
            return Err(SmsGateError::Config(format!(
                "sender_limits contains an empty sender key ({sender:?})"
            )));
        }
        Ok(())
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: GatewayConfig = serde_yaml::from_str(yaml)
            .map_err(|e| SmsGateError::Config(format!("Failed to parse configuration: {}", e)))?;
        config.admission.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML or JSON file, chosen by extension.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load(Some(path.as_ref()))
    }

    /// Load configuration from an optional file layered under `SMSGATE__*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            info!(path = %path.display(), "Loading configuration file");
            if !path.exists() {
                return Err(SmsGateError::Config(format!(
                    "configuration file not found: {}",
                    path.display()
                )));
            }
            builder = builder.add_source(config::File::from(path));
        }

        let mut config: GatewayConfig = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        if let Some(path) = path.filter(|p| is_yaml(p)) {
            config.admission.sender_limits = read_yaml_sender_limits(path)?;
        }

        config.admission.validate()?;
        Ok(config)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Sender overrides as written in a YAML file.
#[derive(Debug, Default, Deserialize)]
struct SenderLimitsFile {
    #[serde(default)]
    admission: SenderLimitsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SenderLimitsSection {
    #[serde(default)]
    sender_limits: HashMap<String, u32>,
}

/// Re-read `admission.sender_limits` with serde_yaml.
///
/// The layered loader turns an unquoted `+1111111111` key into the integer
/// `1111111111`; serde_yaml keeps the key text as written.
fn read_yaml_sender_limits(path: &Path) -> Result<HashMap<String, u32>> {
    let contents = std::fs::read_to_string(path)?;
    let file: SenderLimitsFile = serde_yaml::from_str(&contents)
        .map_err(|e| SmsGateError::Config(format!("Failed to parse sender_limits: {}", e)))?;
    Ok(file.admission.sender_limits)
}
