/*!
   Relayers wiring IBC channels between the two chains of a scenario.

   Both relayers run as containers on the scenario network and reach the
   chains through the relayer node of each chain
   (see [`ChainConfig::relayer_node`]).
*/

use core::fmt::{self, Display};

use crate::chain::config::ChainConfig;
use crate::error::Error;
use crate::types::channel::ChannelConfig;

pub mod hermes;
pub mod rly;

/// Prefix of account addresses on Babylon chains.
pub const ACCOUNT_PREFIX: &str = "bbn";

pub const FEE_DENOM: &str = "ubbn";

/// Name of the relayer key in both relayers' keyrings.
pub const RELAYER_KEY: &str = "relayer";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayerKind {
    Hermes,
    Go,
}

impl Display for RelayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hermes => write!(f, "Hermes"),
            Self::Go => write!(f, "Go"),
        }
    }
}

/**
   What a relayer needs to know about one side of the channel it opens.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RelayerEndpoint {
    pub chain_id: String,

    /// Container of the node the relayer connects to.
    pub node: String,

    /// Mnemonic of the account the relayer signs with.
    pub mnemonic: String,

    pub channel: ChannelConfig,
}

impl RelayerEndpoint {
    pub fn from_chain(chain: &ChainConfig) -> Result<Self, Error> {
        let node = chain.relayer_node()?;

        Ok(Self {
            chain_id: chain.chain_id.clone(),
            node: node.container_name().to_string(),
            mnemonic: node.mnemonic.clone(),
            channel: chain.ibc_config()?.clone(),
        })
    }

    pub fn rpc_address(&self) -> String {
        format!("http://{}:26657", self.node)
    }

    pub fn grpc_address(&self) -> String {
        format!("http://{}:9090", self.node)
    }

    pub fn websocket_address(&self) -> String {
        format!("ws://{}:26657/websocket", self.node)
    }
}
