//! Configuration for the retargeting daemon.
//!
//! Loaded from a TOML file. Every section and field has a default, so a
//! partial file (or none at all) is valid.
//!
//! ```toml
//! [stream]
//! hosts = ["10.0.0.5", "10.0.0.6:802"]
//! subject_filter = ["Arm"]
//! retimed = false
//!
//! [retarget]
//! scale_aware = true
//! axis_map = ["-y", "z", "x"]
//!
//! [[retarget.subjects]]
//! subject = "Arm"
//! root_node = "Rig"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::axis::AxisMap;
use crate::core::types::Vec3;
use crate::error::{Error, Result};
use crate::io::hosts::{DEFAULT_PORT, HostList};
use crate::io::session::AcquisitionMode;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub stream: StreamConfig,
    pub retarget: RetargetConfig,
    pub timing_log: TimingLogConfig,
    pub replay: ReplayConfig,
}

/// Connection and acquisition settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Redundant capture servers, `host` or `host:port`
    pub hosts: Vec<String>,
    /// Port for hosts that don't name one
    pub port: u16,
    /// Restrict the stream to these subjects (empty = all)
    pub subject_filter: Vec<String>,
    /// Client pull with server prefetch instead of server push
    pub prefetch: bool,
    /// Retimed acquisition, driven from the consumer's update tick
    pub retimed: bool,
    /// Request reduced-bandwidth segment data
    pub lightweight: bool,
    /// Enable the marker channel (non-retimed only)
    pub marker_data: bool,
    /// Retiming offset in seconds, passed on every update
    pub retime_offset: f64,
    /// Delay between connect attempts in milliseconds
    pub connect_retry_ms: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            hosts: vec!["localhost".to_string()],
            port: DEFAULT_PORT,
            subject_filter: Vec::new(),
            prefetch: false,
            retimed: false,
            lightweight: true,
            marker_data: true,
            retime_offset: 0.0,
            connect_retry_ms: 200,
        }
    }
}

impl StreamConfig {
    pub fn host_list(&self) -> HostList {
        HostList::new(&self.hosts, self.port)
    }

    pub fn acquisition_mode(&self) -> AcquisitionMode {
        if self.retimed {
            AcquisitionMode::Retimed
        } else if self.prefetch {
            AcquisitionMode::ClientPullPreFetch
        } else {
            AcquisitionMode::ServerPush
        }
    }
}

/// One subject driven onto a local hierarchy
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SubjectTarget {
    /// Subject name in the stream
    pub subject: String,
    /// Name of the local node under which the skeleton is searched
    pub root_node: String,
}

/// Retargeting settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetargetConfig {
    /// Use ancestor-descaled translations and apply segment scale
    pub scale_aware: bool,
    /// Added to every converted position, in scene meters
    pub position_offset: [f64; 3],
    /// Stream-to-scene axis calibration
    pub axis_map: AxisMap,
    /// Articulated subjects
    pub subjects: Vec<SubjectTarget>,
    /// Rigid bodies: root segment only, onto a single node
    pub rigid_bodies: Vec<SubjectTarget>,
}

impl Default for RetargetConfig {
    fn default() -> Self {
        Self {
            scale_aware: false,
            position_offset: [0.0; 3],
            axis_map: AxisMap::default(),
            subjects: Vec::new(),
            rigid_bodies: Vec::new(),
        }
    }
}

impl RetargetConfig {
    pub fn offset(&self) -> Vec3 {
        Vec3::from_array(self.position_offset)
    }
}

/// Per-channel timing logs written by the client SDK
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimingLogConfig {
    pub enabled: bool,
    pub directory: PathBuf,
}

impl Default for TimingLogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            directory: PathBuf::from("."),
        }
    }
}

impl TimingLogConfig {
    /// Date-stamped `(client, stream)` log paths.
    pub fn paths_for(&self, date: chrono::NaiveDate) -> (PathBuf, PathBuf) {
        let stamp = date.format("%Y%m%d");
        (
            self.directory.join(format!("{stamp}_ClientLog.csv")),
            self.directory.join(format!("{stamp}_StreamLog.csv")),
        )
    }
}

/// Capture replay settings for the daemon
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Capture file to serve through the simulated client
    pub capture: PathBuf,
    /// Loop back to the first frame when the capture ends
    pub loop_playback: bool,
    /// Consumer update rate
    pub update_rate_hz: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            capture: PathBuf::from("capture.bag"),
            loop_playback: true,
            update_rate_hz: 60.0,
        }
    }
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Reject values that would make the pipeline misbehave.
    pub fn validate(&self) -> Result<()> {
        if self.stream.host_list().is_empty() {
            return Err(Error::Config("stream.hosts is empty".into()));
        }
        if !self.stream.retime_offset.is_finite() {
            return Err(Error::Config("stream.retime_offset must be finite".into()));
        }
        let rate = self.replay.update_rate_hz;
        if !rate.is_finite() || rate <= 0.0 {
            return Err(Error::Config("replay.update_rate_hz must be positive".into()));
        }
        for target in self.retarget.subjects.iter().chain(&self.retarget.rigid_bodies) {
            if target.subject.trim().is_empty() {
                return Err(Error::Config("retarget target with empty subject".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.stream.port, 801);
        assert_eq!(config.stream.host_list().connection_string(), "localhost:801");
        assert_eq!(config.stream.acquisition_mode(), AcquisitionMode::ServerPush);
        assert_eq!(config.retarget.axis_map, AxisMap::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_toml_deserialization() {
        let toml_content = r#"
[stream]
hosts = ["10.0.0.5", "10.0.0.6:802"]
subject_filter = ["Arm"]
prefetch = true

[retarget]
scale_aware = true
position_offset = [0.0, 1.5, 0.0]
axis_map = ["x", "z", "-y"]

[[retarget.subjects]]
subject = "Arm"
root_node = "Rig"
"#;

        let config: Config = toml::from_str(toml_content).unwrap();
        assert_eq!(
            config.stream.host_list().connection_string(),
            "10.0.0.5:801;10.0.0.6:802"
        );
        assert_eq!(config.stream.acquisition_mode(), AcquisitionMode::ClientPullPreFetch);
        assert!(config.retarget.scale_aware);
        assert_eq!(config.retarget.offset(), Vec3::new(0.0, 1.5, 0.0));
        assert_eq!(config.retarget.axis_map, AxisMap::parse(["x", "z", "-y"]).unwrap());
        assert_eq!(config.retarget.subjects[0].root_node, "Rig");
        // untouched sections keep defaults
        assert!(!config.timing_log.enabled);
        assert_eq!(config.replay.update_rate_hz, 60.0);
    }

    #[test]
    fn test_shipped_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/mocap-retarget.toml");
        let config = Config::from_file(path).unwrap();
        assert_eq!(config.retarget.axis_map, AxisMap::default());
        assert_eq!(config.retarget.subjects[0].subject, "Arm");
        assert_eq!(config.retarget.rigid_bodies[0].root_node, "Wand");
    }

    #[test]
    fn test_retimed_wins_over_prefetch() {
        let config: Config = toml::from_str("[stream]\nretimed = true\nprefetch = true\n").unwrap();
        assert_eq!(config.stream.acquisition_mode(), AcquisitionMode::Retimed);
    }

    #[test]
    fn test_invalid_axis_map_rejected() {
        let result: std::result::Result<Config, _> =
            toml::from_str("[retarget]\naxis_map = [\"x\", \"x\", \"z\"]\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mocap.toml");

        let mut config = Config::default();
        config.stream.subject_filter = vec!["Wand".into()];
        config.to_file(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.stream.subject_filter, vec!["Wand".to_string()]);
    }

    #[test]
    fn test_validate_rejects_empty_hosts() {
        let mut config = Config::default();
        config.stream.hosts = vec![" ".into()];
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_timing_log_paths() {
        let cfg = TimingLogConfig {
            enabled: true,
            directory: PathBuf::from("/tmp/logs"),
        };
        let date = chrono::NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let (client, stream) = cfg.paths_for(date);
        assert_eq!(client, PathBuf::from("/tmp/logs/20240309_ClientLog.csv"));
        assert_eq!(stream, PathBuf::from("/tmp/logs/20240309_StreamLog.csv"));
    }
}
