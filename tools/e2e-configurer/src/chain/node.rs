/*!
   A running full node of a scenario chain.
*/

use std::path::PathBuf;
use std::sync::Arc;

use eyre::eyre;
use tracing::{debug, info};

use super::cli;
use super::init::InitializedNode;
use crate::container::manager::ContainerManager;
use crate::error::Error;
use crate::types::env::{prefix_writer, EnvWriter, ExportEnv};
use crate::util::retry::assert_eventually_succeed;

#[derive(Clone, Debug)]
pub struct ChainNode {
    pub chain_id: String,

    /// The node name, which is also the name of its container.
    pub name: String,

    pub config_dir: PathBuf,

    pub mnemonic: String,

    pub public_address: String,

    pub peer_id: String,

    pub is_validator: bool,

    manager: Arc<ContainerManager>,
}

impl ChainNode {
    pub fn new(chain_id: &str, node: &InitializedNode, manager: Arc<ContainerManager>) -> Self {
        Self {
            chain_id: chain_id.to_string(),
            name: node.name.clone(),
            config_dir: PathBuf::from(&node.config_dir),
            mnemonic: node.mnemonic.clone(),
            public_address: node.public_address.clone(),
            peer_id: node.peer_id.clone(),
            is_validator: node.is_validator,
            manager,
        }
    }

    pub fn container_name(&self) -> &str {
        &self.name
    }

    /// Start the node container and wait until it is running.
    pub fn run(&self) -> Result<(), Error> {
        self.manager
            .run_node_resource(&self.chain_id, &self.name, &self.config_dir)?;
        self.manager.wait_until_running(&self.name)?;

        info!("node {} of chain {} is running", self.name, self.chain_id);

        Ok(())
    }

    pub fn latest_height(&self) -> Result<u64, Error> {
        cli::query_latest_height(&self.manager, &self.name)
    }

    /// Wait until the node serves its status, and return the height seen.
    pub fn wait_until_synced(&self) -> Result<u64, Error> {
        assert_eventually_succeed(
            &format!("node {} reports a block height", self.name),
            self.manager.readiness(),
            || self.latest_height(),
        )
    }

    /// Wait until a block past the current latest height is committed.
    pub fn wait_for_next_block(&self) -> Result<u64, Error> {
        let current = self.wait_until_synced()?;

        let next = assert_eventually_succeed(
            &format!("node {} commits a block after height {}", self.name, current),
            self.manager.readiness(),
            || {
                let height = self.latest_height()?;
                if height > current {
                    Ok(height)
                } else {
                    Err(Error::generic(eyre!(
                        "node {} still at height {}",
                        self.name,
                        height
                    )))
                }
            },
        )?;

        debug!("node {} reached height {}", self.name, next);

        Ok(next)
    }

    pub fn store_wasm_code(&self, wasm_file: &str, from: &str) -> Result<(), Error> {
        info!("storing wasm code {} on node {}", wasm_file, self.name);
        cli::store_wasm_code(&self.manager, &self.name, &self.chain_id, wasm_file, from)
    }

    pub fn instantiate_wasm_contract(
        &self,
        code_id: u64,
        init_msg: &str,
        from: &str,
    ) -> Result<(), Error> {
        info!("instantiating wasm code {} on node {}", code_id, self.name);
        cli::instantiate_wasm_contract(
            &self.manager,
            &self.name,
            &self.chain_id,
            code_id,
            init_msg,
            from,
        )
    }

    pub fn query_latest_wasm_code_id(&self) -> Result<u64, Error> {
        cli::query_latest_wasm_code_id(&self.manager, &self.name)
    }

    pub fn query_contracts_from_code_id(&self, code_id: u64) -> Result<Vec<String>, Error> {
        cli::query_contracts_from_code_id(&self.manager, &self.name, code_id)
    }
}

impl ExportEnv for ChainNode {
    fn export_env(&self, writer: &mut impl EnvWriter) {
        writer.write_env("CONTAINER", &self.name);
        writer.write_env("HOME", &self.config_dir.display().to_string());
        writer.write_env("ADDRESS", &self.public_address);
        writer.write_env("VALIDATOR", &self.is_validator.to_string());
    }
}

/// Export every node under a prefix made of its position in the chain.
pub fn export_nodes(nodes: &[ChainNode], writer: &mut impl EnvWriter) {
    for (i, node) in nodes.iter().enumerate() {
        node.export_env(&mut prefix_writer(&format!("NODE_{i}"), writer));
    }
}
