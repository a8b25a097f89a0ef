//! Configuration.
//!
//! Loads observer configuration from JSON strings/files (file IO left to
//! the binary).

use serde::{Deserialize, Serialize};

/// Root configuration for an observer session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObserverConfig {
    /// Game server address, e.g. `127.0.0.1:2000`.
    pub server_addr: String,
    /// Display name announced at login.
    #[serde(default = "default_name")]
    pub name: String,
    /// Wall-clock seconds per simulation turn during playback.
    #[serde(default = "default_secs_per_turn")]
    pub secs_per_turn: f32,
    /// Last turn of the recorded session.
    #[serde(default = "default_max_turn")]
    pub max_turn: u32,
    /// Render/playback frame rate.
    #[serde(default = "default_frame_hz")]
    pub frame_hz: u32,
}

fn default_name() -> String {
    "Observer".to_string()
}

fn default_secs_per_turn() -> f32 {
    1.0
}

fn default_max_turn() -> u32 {
    100
}

fn default_frame_hz() -> u32 {
    30
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            server_addr: "127.0.0.1:2000".to_string(),
            name: default_name(),
            secs_per_turn: default_secs_per_turn(),
            max_turn: default_max_turn(),
            frame_hz: default_frame_hz(),
        }
    }
}

impl ObserverConfig {
    /// Parses config from JSON.
    pub fn from_json_str(s: &str) -> serde_json::Result<Self> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let cfg = ObserverConfig::from_json_str(r#"{"server_addr": "10.0.0.1:2000"}"#).unwrap();
        assert_eq!(cfg.server_addr, "10.0.0.1:2000");
        assert_eq!(cfg.name, "Observer");
        assert_eq!(cfg.max_turn, 100);
    }
}
