/*!
   Description of a single node of a scenario: its identity and the
   persistence policy it runs with.
*/

use core::fmt::{self, Display};

use serde::Serializer;
use serde_derive::{Deserialize, Serialize};

/// The state pruning strategy of a node, as understood by the Cosmos SDK.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PruningStrategy {
    /// Keep the last 362880 states, prune at 10 block intervals.
    #[default]
    Default,
    /// Archive node: keep every state.
    Nothing,
    /// Keep only the current state.
    Everything,
    /// Use the `pruning-keep-recent` and `pruning-interval` settings.
    Custom,
}

impl PruningStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Nothing => "nothing",
            Self::Everything => "everything",
            Self::Custom => "custom",
        }
    }
}

impl Display for PruningStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/**
   Topology entry for one node.

   Serialized with the field names expected by the chain initialization
   image, which receives the node list as JSON.
*/
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NodeConfig {
    /// Also the node's container name, hence unique within a scenario.
    pub name: String,

    pub pruning: PruningStrategy,

    #[serde(serialize_with = "as_string")]
    pub pruning_keep_recent: u64,

    #[serde(serialize_with = "as_string")]
    pub pruning_interval: u64,

    pub snapshot_interval: u64,

    pub snapshot_keep_recent: u32,

    pub is_validator: bool,
}

impl NodeConfig {
    /**
       A copy of this entry whose name carries the scenario identifier,
       so that concurrently running scenarios never share a container name.
    */
    pub fn with_identifier(&self, identifier: &str) -> Self {
        Self {
            name: format!("{}-{}", self.name, identifier),
            ..self.clone()
        }
    }
}

/// Suffix every node name with the scenario identifier.
pub fn node_configs_with_identifier(identifier: &str, configs: &[NodeConfig]) -> Vec<NodeConfig> {
    configs
        .iter()
        .map(|config| config.with_identifier(identifier))
        .collect()
}

fn as_string<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(value)
}
