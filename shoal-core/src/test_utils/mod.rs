//! Helpers shared by unit, scenario and integration tests

mod fixtures;

pub use fixtures::{cluster_node_id, foreign_add, test_config, TestCluster};
