//! Portal policy knobs

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Portal timeout restored after a save or close, in seconds.
pub const DEFAULT_PORTAL_TIMEOUT: Duration = Duration::from_secs(120);

pub const HTTP_PORT: u16 = 80;
pub const DNS_PORT: u16 = 53;

/// Initial parameter slots, and how many more to add each time they run out.
pub const MAX_PARAMS_STEP: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    /// Zero disables the timeout.
    #[serde(rename = "timeout_secs", with = "duration_secs")]
    pub timeout: Duration,
    /// Leave the loop as soon as a save succeeds, invoking the save callback.
    pub break_after_config: bool,
    /// Render the static-IP fieldset even when no static address is set.
    pub always_show_static_ip: bool,
    /// Render and accept `dns1`/`dns2`.
    pub configurable_dns: bool,
    /// Value of `Access-Control-Allow-Origin`, when set.
    pub cors_header: Option<String>,
    /// Raw markup appended to every page head.
    pub custom_head_element: String,
    /// Carry the browser timezone through a hidden form field.
    pub capture_timezone: bool,
    pub http_port: u16,
    pub dns_port: u16,
    #[serde(rename = "poll_interval_ms", with = "duration_millis")]
    pub poll_interval: Duration,
    #[serde(rename = "reset_delay_ms", with = "duration_millis")]
    pub reset_delay: Duration,
    pub initial_param_capacity: usize,
    /// Zero keeps the registry at its initial capacity.
    pub param_growth: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PORTAL_TIMEOUT,
            break_after_config: false,
            always_show_static_ip: true,
            configurable_dns: true,
            cors_header: None,
            custom_head_element: String::new(),
            capture_timezone: false,
            http_port: HTTP_PORT,
            dns_port: DNS_PORT,
            poll_interval: Duration::from_millis(50),
            reset_delay: Duration::from_secs(5),
            initial_param_capacity: MAX_PARAMS_STEP,
            param_growth: MAX_PARAMS_STEP,
        }
    }
}

impl PortalConfig {
    /// Parse a JSON config blob, e.g. one kept in NVS. Missing keys keep their defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: PortalConfig = serde_json::from_str(json)
            .map_err(|e| anyhow::anyhow!("Failed to parse portal config: {}", e))?;
        log::debug!("portal config: {:?}", config);
        Ok(config)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_secs)
    }
}

mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
