//! Configuration for a shoal node
//!
//! Loaded from a TOML file at startup: the node's own address, its
//! publish directory, the sync policy for the group, and the static
//! group membership list. Validation runs before anything is wired up.

use crate::core_log::NodeId;
use crate::core_sync::{Peer, SyncPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

mod error;

pub use error::ConfigError;

/// Address settings of the local node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSettings {
    /// Address the node is known under within the group
    pub ip: String,

    /// Port the node is known under within the group
    pub port: u16,

    /// Port the sync transport listens on
    pub sync_port: u16,
}

/// One group member as listed in the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberSettings {
    pub ip: String,
    pub port: u16,

    /// Sync port of the member; defaults to the node's own sync port,
    /// matching groups deployed with one uniform transport port
    pub sync_port: Option<u16>,
}

/// Full node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    pub node: NodeSettings,

    /// Directory published files are copied into
    pub publish_dir: PathBuf,

    /// Peer-selection policy for sync rounds
    pub policy: SyncPolicy,

    /// How often a periodically driven node starts a round
    #[serde(with = "humantime_serde", default = "default_sync_interval")]
    pub sync_interval: Duration,

    /// Every node in the group, the local one included
    pub group: Vec<MemberSettings>,
}

fn default_sync_interval() -> Duration {
    Duration::from_secs(30)
}

impl NodeConfig {
    /// Parse a configuration file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        let config: NodeConfig =
            toml::from_str(&raw).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.node.ip.is_empty() {
            return Err(ConfigError::InvalidValue("node.ip must not be empty".to_string()));
        }
        if self.node.port == 0 {
            return Err(ConfigError::InvalidValue("node.port must not be zero".to_string()));
        }
        if self.publish_dir.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue("publish_dir must not be empty".to_string()));
        }
        if self.group.is_empty() {
            return Err(ConfigError::InvalidValue(
                "group must list at least the local node".to_string(),
            ));
        }
        if self.sync_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "sync_interval must not be zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Group-wide identifier of the local node
    pub fn node_id(&self) -> NodeId {
        format!("{}:{}", self.node.ip, self.node.port)
    }

    /// Base URI remote nodes fetch published files from
    pub fn base_uri(&self) -> String {
        format!("http://{}:{}/shared", self.node.ip, self.node.port)
    }

    /// Every group member except the local node, as connectable peers
    pub fn peers(&self) -> Vec<Peer> {
        let local = self.node_id();
        self.group
            .iter()
            .map(|member| {
                Peer::new(
                    member.ip.clone(),
                    member.port,
                    member.sync_port.unwrap_or(self.node.sync_port),
                )
            })
            .filter(|peer| peer.id != local)
            .collect()
    }

    /// Total number of group members, the local node included
    pub fn group_size(&self) -> usize {
        self.group.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> NodeConfig {
        NodeConfig {
            node: NodeSettings { ip: "10.0.0.1".to_string(), port: 7001, sync_port: 9001 },
            publish_dir: PathBuf::from("/var/shoal/shared"),
            policy: SyncPolicy::Multicast,
            sync_interval: Duration::from_secs(30),
            group: vec![
                MemberSettings { ip: "10.0.0.1".to_string(), port: 7001, sync_port: None },
                MemberSettings { ip: "10.0.0.2".to_string(), port: 7001, sync_port: Some(9002) },
            ],
        }
    }

    #[test]
    fn test_node_id_and_base_uri() {
        let config = sample();
        assert_eq!(config.node_id(), "10.0.0.1:7001");
        assert_eq!(config.base_uri(), "http://10.0.0.1:7001/shared");
    }

    #[test]
    fn test_peers_exclude_local_node() {
        let config = sample();
        let peers = config.peers();

        assert_eq!(peers.len(), 1);
        assert_eq!(peers[0].id, "10.0.0.2:7001");
        assert_eq!(peers[0].sync_port, 9002);
        assert_eq!(config.group_size(), 2);
    }

    #[test]
    fn test_validate_rejects_empty_group() {
        let mut config = sample();
        config.group.clear();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn test_validate_rejects_zero_port() {
        let mut config = sample();
        config.node.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
publish_dir = "/var/shoal/shared"
policy = "broadcast"
sync_interval = "45s"

[node]
ip = "10.0.0.1"
port = 7001
sync_port = 9001

[[group]]
ip = "10.0.0.1"
port = 7001

[[group]]
ip = "10.0.0.2"
port = 7001
"#
        )
        .unwrap();

        let config = NodeConfig::from_file(file.path()).unwrap();
        assert_eq!(config.node_id(), "10.0.0.1:7001");
        assert_eq!(config.policy, SyncPolicy::Broadcast);
        assert_eq!(config.sync_interval, Duration::from_secs(45));
        assert_eq!(config.peers().len(), 1);
    }

    #[test]
    fn test_from_file_rejects_garbage() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not toml at all [").unwrap();
        assert!(matches!(
            NodeConfig::from_file(file.path()),
            Err(ConfigError::ParseError(_))
        ));
    }
}
