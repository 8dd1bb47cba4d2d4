use std::net::SocketAddr;

use serde::Deserialize;

use congabridge_core::error::{BridgeError, Result};
use congabridge_core::protocol::HEADER_LEN;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeConfig {
    pub version: u32,

    #[serde(default)]
    pub bridge: BridgeSection,

    #[serde(default)]
    pub handshake: HandshakeSection,

    #[serde(default)]
    pub api: ApiSection,
}

impl BridgeConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(BridgeError::UnsupportedVersion);
        }
        self.bridge.validate()?;
        self.handshake.validate()?;
        self.api.validate()?;
        Ok(())
    }
}

fn parse_addr(field: &str, v: &str) -> Result<SocketAddr> {
    v.parse()
        .map_err(|e| BridgeError::BadConfig(format!("{field} must be a valid SocketAddr: {e}")))
}

/// Device-facing listeners.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BridgeSection {
    #[serde(default = "default_cmd_listen")]
    pub cmd_listen: String,

    #[serde(default = "default_map_listen")]
    pub map_listen: String,

    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

impl Default for BridgeSection {
    fn default() -> Self {
        Self {
            cmd_listen: default_cmd_listen(),
            map_listen: default_map_listen(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl BridgeSection {
    pub fn validate(&self) -> Result<()> {
        self.cmd_addr()?;
        self.map_addr()?;
        if self.max_frame_bytes < HEADER_LEN {
            return Err(BridgeError::BadConfig(format!(
                "bridge.max_frame_bytes must be at least {HEADER_LEN}"
            )));
        }
        Ok(())
    }

    pub fn cmd_addr(&self) -> Result<SocketAddr> {
        parse_addr("bridge.cmd_listen", &self.cmd_listen)
    }

    pub fn map_addr(&self) -> Result<SocketAddr> {
        parse_addr("bridge.map_listen", &self.map_listen)
    }
}

fn default_cmd_listen() -> String {
    "0.0.0.0:4010".into()
}
fn default_map_listen() -> String {
    "0.0.0.0:4030".into()
}
fn default_max_frame_bytes() -> usize {
    4 * 1024 * 1024
}

/// Post-login handshake tuning.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandshakeSection {
    /// Wait before asking for the map, once time sync is done.
    #[serde(default = "default_map_info_delay_ms")]
    pub map_info_delay_ms: u64,

    /// Section mask sent with the handshake map request.
    #[serde(default = "default_map_info_mask")]
    pub map_info_mask: u32,
}

impl Default for HandshakeSection {
    fn default() -> Self {
        Self {
            map_info_delay_ms: default_map_info_delay_ms(),
            map_info_mask: default_map_info_mask(),
        }
    }
}

impl HandshakeSection {
    pub fn validate(&self) -> Result<()> {
        if self.map_info_delay_ms > 60000 {
            return Err(BridgeError::BadConfig(
                "handshake.map_info_delay_ms must be at most 60000".into(),
            ));
        }
        Ok(())
    }
}

fn default_map_info_delay_ms() -> u64 {
    1000
}
fn default_map_info_mask() -> u32 {
    0x78FF
}

/// Operational HTTP surface.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiSection {
    #[serde(default = "default_api_enabled")]
    pub enabled: bool,

    #[serde(default = "default_api_listen")]
    pub listen: String,

    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            enabled: default_api_enabled(),
            listen: default_api_listen(),
            command_timeout_ms: default_command_timeout_ms(),
        }
    }
}

impl ApiSection {
    pub fn validate(&self) -> Result<()> {
        self.addr()?;
        if !(100..=600000).contains(&self.command_timeout_ms) {
            return Err(BridgeError::BadConfig(
                "api.command_timeout_ms must be between 100 and 600000".into(),
            ));
        }
        Ok(())
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        parse_addr("api.listen", &self.listen)
    }
}

fn default_api_enabled() -> bool {
    true
}
fn default_api_listen() -> String {
    "127.0.0.1:8080".into()
}
fn default_command_timeout_ms() -> u64 {
    10000
}
