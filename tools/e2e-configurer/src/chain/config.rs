/*!
   The handle of one scenario chain.
*/

use core::time::Duration;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use eyre::eyre;
use tracing::info;

use super::app_config::apply_node_config;
use super::init::InitializedChain;
use super::node::{export_nodes, ChainNode};
use crate::container::manager::ContainerManager;
use crate::error::{handle_generic_error, Error};
use crate::types::channel::ChannelConfig;
use crate::types::env::{EnvWriter, ExportEnv};
use crate::types::topology::NodeConfig;

pub const DEFAULT_VOTING_PERIOD: Duration = Duration::from_secs(30);

pub const DEFAULT_EXPEDITED_VOTING_PERIOD: Duration = Duration::from_secs(10);

/**
   A chain of the scenario, declared by its id, its node topology and
   optionally the IBC channel end it exposes.

   The chain has no nodes until [`configure`](ChainConfig::configure)
   initializes and starts them.
*/
#[derive(Debug)]
pub struct ChainConfig {
    pub chain_id: String,

    pub voting_period: Duration,

    pub expedited_voting_period: Duration,

    pub data_dir: PathBuf,

    pub node_configs: Vec<NodeConfig>,

    pub ibc_config: Option<ChannelConfig>,

    /// Address of the instantiated Babylon contract, if any.
    pub contract_address: Option<String>,

    nodes: Vec<ChainNode>,

    manager: Arc<ContainerManager>,
}

impl ChainConfig {
    pub fn new(
        manager: Arc<ContainerManager>,
        chain_id: &str,
        node_configs: Vec<NodeConfig>,
        ibc_config: Option<ChannelConfig>,
    ) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            voting_period: DEFAULT_VOTING_PERIOD,
            expedited_voting_period: DEFAULT_EXPEDITED_VOTING_PERIOD,
            data_dir: manager.scenario_dir().join(chain_id),
            node_configs,
            ibc_config,
            contract_address: None,
            nodes: Vec::new(),
            manager,
        }
    }

    pub fn nodes(&self) -> &[ChainNode] {
        &self.nodes
    }

    pub fn is_configured(&self) -> bool {
        !self.nodes.is_empty()
    }

    pub fn validator_nodes(&self) -> impl Iterator<Item = &ChainNode> {
        self.nodes.iter().filter(|node| node.is_validator)
    }

    pub fn node(&self, name: &str) -> Option<&ChainNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    /**
       Initialize the chain, apply every node's persistence policy and
       start one container per node.
    */
    pub fn configure(&mut self) -> Result<(), Error> {
        info!(
            "configuring chain {} with {} node(s)",
            self.chain_id,
            self.node_configs.len()
        );

        fs::create_dir_all(&self.data_dir)?;

        let initialized = self.manager.run_chain_init_resource(
            &self.chain_id,
            self.voting_period,
            self.expedited_voting_period,
            &self.node_configs,
            &self.data_dir,
        )?;

        let mut nodes = Vec::with_capacity(self.node_configs.len());

        for node_config in &self.node_configs {
            let initialized_node = initialized.node(&node_config.name).ok_or_else(|| {
                Error::generic(eyre!(
                    "chain initialization of {} produced no node {}",
                    self.chain_id,
                    node_config.name
                ))
            })?;

            let node = ChainNode::new(&self.chain_id, initialized_node, self.manager.clone());
            update_app_config(&node.config_dir, node_config)?;

            nodes.push(node);
        }

        for node in &nodes {
            node.run()?;
        }

        self.nodes = nodes;

        Ok(())
    }

    /// Wait until every validator produces blocks.
    pub fn run_validators(&self) -> Result<(), Error> {
        if !self.is_configured() {
            return Err(Error::chain_not_configured(self.chain_id.clone()));
        }

        info!("waiting for validators of chain {}", self.chain_id);

        for node in self.validator_nodes() {
            node.wait_for_next_block()?;
        }

        Ok(())
    }

    /**
       The node the relayers submit transactions through: the last
       non-validator node. Validators send BLS transactions of their own
       which conflict with the relayer's account sequence.
    */
    pub fn relayer_node(&self) -> Result<&ChainNode, Error> {
        if !self.is_configured() {
            return Err(Error::chain_not_configured(self.chain_id.clone()));
        }

        self.nodes
            .iter()
            .rev()
            .find(|node| !node.is_validator)
            .ok_or_else(|| Error::missing_relayer_node(self.chain_id.clone()))
    }

    pub fn ibc_config(&self) -> Result<&ChannelConfig, Error> {
        self.ibc_config
            .as_ref()
            .ok_or_else(|| Error::missing_ibc_config(self.chain_id.clone()))
    }

    /// Record the instantiated contract and route IBC to its port.
    pub fn set_contract_address(&mut self, address: &str) -> Result<(), Error> {
        let ibc_config = self
            .ibc_config
            .as_mut()
            .ok_or_else(|| Error::missing_ibc_config(self.chain_id.clone()))?;

        ibc_config.set_contract_port(address)?;
        self.contract_address = Some(address.to_string());

        info!(
            "chain {} now uses port {}",
            self.chain_id, ibc_config.port_id
        );

        Ok(())
    }
}

fn update_app_config(config_dir: &Path, node_config: &NodeConfig) -> Result<(), Error> {
    let path = config_dir.join("config").join("app.toml");
    let content = fs::read_to_string(&path)?;

    let mut app_config: toml::Value = toml::from_str(&content).map_err(handle_generic_error)?;
    apply_node_config(&mut app_config, node_config)?;

    let content = toml::to_string_pretty(&app_config).map_err(handle_generic_error)?;
    fs::write(&path, content)?;

    Ok(())
}

impl ExportEnv for ChainConfig {
    fn export_env(&self, writer: &mut impl EnvWriter) {
        writer.write_env("CHAIN_ID", &self.chain_id);
        writer.write_env("DATA_DIR", &self.data_dir.display().to_string());

        if let Some(ibc_config) = &self.ibc_config {
            writer.write_env("PORT", ibc_config.port_id.as_str());
        }

        if let Some(address) = &self.contract_address {
            writer.write_env("CONTRACT", address);
        }

        export_nodes(&self.nodes, writer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;
    use test_log::test;

    use crate::types::topology::PruningStrategy;

    #[test]
    fn app_config_is_rewritten_in_place() {
        let dir = std::env::temp_dir().join(format!(
            "app-config-{:x}",
            crate::util::random::random_u32()
        ));
        fs::create_dir_all(dir.join("config")).unwrap();

        let mut file = fs::File::create(dir.join("config").join("app.toml")).unwrap();
        writeln!(file, "pruning = \"default\"\nminimum-gas-prices = \"1ubbn\"").unwrap();

        let node = NodeConfig {
            name: "node".to_string(),
            pruning: PruningStrategy::Nothing,
            pruning_keep_recent: 0,
            pruning_interval: 0,
            snapshot_interval: 1500,
            snapshot_keep_recent: 2,
            is_validator: false,
        };

        update_app_config(&dir, &node).unwrap();

        let content = fs::read_to_string(dir.join("config").join("app.toml")).unwrap();
        let value: toml::Value = toml::from_str(&content).unwrap();

        assert_eq!(value["pruning"].as_str(), Some("nothing"));
        assert_eq!(value["minimum-gas-prices"].as_str(), Some("1ubbn"));
        assert_eq!(value["state-sync"]["snapshot-interval"].as_integer(), Some(1500));

        fs::remove_dir_all(dir).unwrap();
    }
}
