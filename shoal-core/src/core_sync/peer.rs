/*
    peer.rs - Connection descriptor for a group member
*/

use crate::core_log::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Address of one fellow node in the group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Peer {
    /// Group-wide identifier, `ip:port`
    pub id: NodeId,

    pub ip: String,

    /// Port the node itself is known under
    pub port: u16,

    /// Port its sync transport listens on
    pub sync_port: u16,
}

impl Peer {
    pub fn new(ip: impl Into<String>, port: u16, sync_port: u16) -> Self {
        let ip = ip.into();
        Peer { id: format!("{ip}:{port}"), ip, port, sync_port }
    }
}

impl fmt::Display for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Peer[{},{}]", self.id, self.sync_port)
    }
}
