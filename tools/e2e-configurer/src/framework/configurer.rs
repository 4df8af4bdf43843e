/*!
   The lifecycle contract of a scenario, and its implementation driving
   the chains of the current branch.
*/

use std::collections::BTreeSet;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use ibc_relayer_types::core::ics24_host::identifier::ConnectionId;
use serde_json as json;
use tracing::{info, warn};

use super::setup::{SetupPhase, SetupPlan};
use crate::chain::config::ChainConfig;
use crate::chain::node::ChainNode;
use crate::container::manager::{ContainerManager, TeardownReport, BYTECODE_DIR};
use crate::error::{handle_generic_error, Error};
use crate::relayer::hermes::HermesRelayer;
use crate::relayer::rly::GoRelayer;
use crate::relayer::{RelayerEndpoint, RelayerKind};
use crate::types::env::{prefix_writer, write_env, EnvWriter, ExportEnv};

/// Contract stored and instantiated by the phase 2 scenarios.
pub const BABYLON_CONTRACT: &str = "babylon_contract.wasm";

/// Key the contract transactions are signed with.
pub const CONTRACT_SIGNER: &str = "val";

/**
   Operations to drive a scenario from declared chains to a ready
   environment, and to tear it down.

   Except for [`clear_resources`](Configurer::clear_resources), each
   operation is meant to be called once, in the order implied by the
   scenario's [`SetupPlan`]. `clear_resources` can be called at any time,
   any number of times.
*/
pub trait Configurer {
    /// Initialize every chain and start its node containers.
    fn configure_chains(&mut self) -> Result<(), Error>;

    /// Remove every resource of the scenario. Never fails.
    fn clear_resources(&mut self) -> TeardownReport;

    /// The chain declared at `chain_index`, in declaration order.
    fn get_chain_config(&self, chain_index: usize) -> Result<&ChainConfig, Error>;

    /// Run all phases of the scenario's setup plan, in order.
    fn run_setup(&mut self) -> Result<(), Error>;

    fn run_validators(&mut self) -> Result<(), Error>;

    fn instantiate_babylon_contract(&mut self) -> Result<(), Error>;

    fn run_hermes_relayer_ibc(&mut self) -> Result<(), Error>;

    fn run_cosmos_relayer_ibc(&mut self) -> Result<(), Error>;

    fn run_ibc_transfer_channel(&mut self) -> Result<(), Error>;
}

#[derive(Debug)]
pub struct CurrentBranchConfigurer {
    chains: Vec<ChainConfig>,
    plan: SetupPlan,
    relayer: Option<RelayerKind>,
    manager: Arc<ContainerManager>,
    skip_cleanup: bool,
    cleared: bool,
    hermes: Option<HermesRelayer>,
    go_relayer: Option<GoRelayer>,
    connection_id: Option<ConnectionId>,
}

impl CurrentBranchConfigurer {
    pub fn new(
        chains: Vec<ChainConfig>,
        plan: SetupPlan,
        manager: Arc<ContainerManager>,
    ) -> Result<Self, Error> {
        let relayer = plan.relayer()?;

        let mut names = BTreeSet::new();
        for node in chains.iter().flat_map(|chain| &chain.node_configs) {
            if !names.insert(node.name.as_str()) {
                return Err(Error::duplicate_node_name(node.name.clone()));
            }
        }

        if plan.wires_ibc() {
            if chains.len() != 2 {
                return Err(Error::ibc_requires_two_chains(chains.len()));
            }

            for chain in &chains {
                chain.ibc_config()?;
            }
        }

        if relayer == Some(RelayerKind::Go) && !manager.needs_go_relayer() {
            return Err(Error::go_relayer_unavailable(
                manager.identifier().to_string(),
            ));
        }

        Ok(Self {
            chains,
            plan,
            relayer,
            manager,
            skip_cleanup: false,
            cleared: false,
            hermes: None,
            go_relayer: None,
            connection_id: None,
        })
    }

    /// Keep the containers when the configurer is dropped uncleared.
    pub fn skip_cleanup(mut self, skip_cleanup: bool) -> Self {
        self.skip_cleanup = skip_cleanup;
        self
    }

    pub fn chains(&self) -> &[ChainConfig] {
        &self.chains
    }

    pub fn plan(&self) -> &SetupPlan {
        &self.plan
    }

    pub fn manager(&self) -> &Arc<ContainerManager> {
        &self.manager
    }

    pub fn connection_id(&self) -> Option<&ConnectionId> {
        self.connection_id.as_ref()
    }

    pub fn env_path(&self) -> PathBuf {
        self.manager.scenario_dir().join("scenario.env")
    }

    fn run_phase(&mut self, phase: SetupPhase) -> Result<(), Error> {
        match phase {
            SetupPhase::ConfigureChains => self.configure_chains(),
            SetupPhase::RunValidators => self.run_validators(),
            SetupPhase::InstantiateContract => self.instantiate_babylon_contract(),
            SetupPhase::HermesRelayerIbc => self.run_hermes_relayer_ibc(),
            SetupPhase::CosmosRelayerIbc => self.run_cosmos_relayer_ibc(),
            SetupPhase::IbcTransferChannel => self.run_ibc_transfer_channel(),
        }
    }

    fn require_relayer(&self, requested: RelayerKind) -> Result<(), Error> {
        match self.relayer {
            Some(selected) if selected == requested => Ok(()),
            selected => Err(Error::relayer_not_selected(
                requested.to_string(),
                selected.map_or_else(|| "no relayer".to_string(), |kind| kind.to_string()),
            )),
        }
    }

    fn ibc_chains(&self) -> Result<(&ChainConfig, &ChainConfig), Error> {
        match self.chains.as_slice() {
            [chain_a, chain_b] => Ok((chain_a, chain_b)),
            chains => Err(Error::ibc_requires_two_chains(chains.len())),
        }
    }

    /// Phase 2 channels target the contract port of chain B.
    fn relayer_endpoints(&self) -> Result<(RelayerEndpoint, RelayerEndpoint), Error> {
        let (chain_a, chain_b) = self.ibc_chains()?;

        if self.plan.deploys_contract() && chain_b.contract_address.is_none() {
            return Err(Error::contract_not_instantiated(chain_b.chain_id.clone()));
        }

        Ok((
            RelayerEndpoint::from_chain(chain_a)?,
            RelayerEndpoint::from_chain(chain_b)?,
        ))
    }

    fn ensure_hermes(&mut self) -> Result<&HermesRelayer, Error> {
        let (chain_a, chain_b) = self.relayer_endpoints()?;

        let hermes = match self.hermes.take() {
            Some(hermes) => hermes,
            None => HermesRelayer::start(
                &self.manager,
                &self.manager.scenario_dir().join("hermes"),
                chain_a,
                chain_b,
            )?,
        };

        Ok(self.hermes.insert(hermes))
    }

    fn instantiate_contract_on(node: &ChainNode) -> Result<String, Error> {
        node.store_wasm_code(&format!("{BYTECODE_DIR}/{BABYLON_CONTRACT}"), CONTRACT_SIGNER)?;
        node.wait_for_next_block()?;

        let code_id = node.query_latest_wasm_code_id()?;
        node.instantiate_wasm_contract(code_id, &contract_init_msg()?, CONTRACT_SIGNER)?;
        node.wait_for_next_block()?;

        node.query_contracts_from_code_id(code_id)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::contract_not_instantiated(node.chain_id.clone()))
    }

    fn write_scenario_env(&self) -> Result<(), Error> {
        fs::create_dir_all(self.manager.scenario_dir())?;
        write_env(self.env_path(), self)?;

        info!(
            "written scenario environment to {}",
            self.env_path().display()
        );

        Ok(())
    }
}

/// Instantiation message of the Babylon contract on a regtest network.
pub fn contract_init_msg() -> Result<String, Error> {
    let msg = json::json!({
        "network": "regtest",
        "babylon_tag": "01020304",
        "btc_confirmation_depth": 1,
        "checkpoint_finalization_timeout": 2,
        "notify_cosmos_zone": false,
    });

    json::to_string(&msg).map_err(handle_generic_error)
}

impl Configurer for CurrentBranchConfigurer {
    fn configure_chains(&mut self) -> Result<(), Error> {
        for chain in self.chains.iter_mut() {
            chain.configure()?;
        }

        Ok(())
    }

    fn clear_resources(&mut self) -> TeardownReport {
        self.cleared = true;
        self.hermes = None;
        self.go_relayer = None;

        self.manager.clear_resources()
    }

    fn get_chain_config(&self, chain_index: usize) -> Result<&ChainConfig, Error> {
        self.chains
            .get(chain_index)
            .ok_or_else(|| Error::chain_index_out_of_range(chain_index, self.chains.len()))
    }

    fn run_setup(&mut self) -> Result<(), Error> {
        info!(
            "setting up scenario {} in {}",
            self.manager.identifier(),
            self.manager.scenario_dir().display()
        );

        for phase in self.plan.phases() {
            info!("running setup phase: {}", phase);
            self.run_phase(phase)?;
        }

        self.write_scenario_env()
    }

    fn run_validators(&mut self) -> Result<(), Error> {
        for chain in &self.chains {
            chain.run_validators()?;
        }

        Ok(())
    }

    fn instantiate_babylon_contract(&mut self) -> Result<(), Error> {
        if !self.plan.deploys_contract() {
            return Err(Error::contract_not_declared());
        }

        let (_, chain_b) = self.ibc_chains()?;
        let address = Self::instantiate_contract_on(chain_b.relayer_node()?)?;

        info!(
            "babylon contract instantiated on chain {} at {}",
            chain_b.chain_id, address
        );

        self.chains[1].set_contract_address(&address)
    }

    fn run_hermes_relayer_ibc(&mut self) -> Result<(), Error> {
        self.require_relayer(RelayerKind::Hermes)?;

        let manager = self.manager.clone();
        let connection_id = self.ensure_hermes()?.create_channel(&manager)?;

        info!("IBC channel open on connection {}", connection_id);
        self.connection_id = Some(connection_id);

        Ok(())
    }

    fn run_cosmos_relayer_ibc(&mut self) -> Result<(), Error> {
        self.require_relayer(RelayerKind::Go)?;

        let (chain_a, chain_b) = self.relayer_endpoints()?;

        let relayer = GoRelayer::start(
            &self.manager,
            &self.manager.scenario_dir().join("rly"),
            chain_a,
            chain_b,
        )?;

        self.go_relayer = Some(relayer);

        Ok(())
    }

    fn run_ibc_transfer_channel(&mut self) -> Result<(), Error> {
        self.require_relayer(RelayerKind::Hermes)?;

        let (chain_a, _) = self.ibc_chains()?;

        let (hermes, connection_id) = match (&self.hermes, &self.connection_id) {
            (Some(hermes), Some(connection_id)) => (hermes, connection_id),
            _ => return Err(Error::connection_not_established(chain_a.chain_id.clone())),
        };

        hermes.create_transfer_channel(&self.manager, connection_id)
    }
}

impl ExportEnv for CurrentBranchConfigurer {
    fn export_env(&self, writer: &mut impl EnvWriter) {
        writer.write_env("SCENARIO", self.manager.identifier());
        writer.write_env("NETWORK", &self.manager.network_name());

        for (i, chain) in self.chains.iter().enumerate() {
            chain.export_env(&mut prefix_writer(&format!("CHAIN_{i}"), writer));
        }

        if let Some(hermes) = &self.hermes {
            writer.write_env("HERMES_CONTAINER", &hermes.container);
        }

        if let Some(relayer) = &self.go_relayer {
            writer.write_env("RLY_CONTAINER", &relayer.container);
        }

        if let Some(connection_id) = &self.connection_id {
            writer.write_env("CONNECTION", connection_id.as_str());
        }
    }
}

impl Drop for CurrentBranchConfigurer {
    fn drop(&mut self) {
        if self.cleared {
            return;
        }

        if self.skip_cleanup {
            info!(
                "skipping cleanup of scenario {}, resources are kept in {}",
                self.manager.identifier(),
                self.manager.scenario_dir().display()
            );
            return;
        }

        let report = self.clear_resources();

        if !report.is_clean() {
            warn!(
                "scenario {} left {} resource(s) behind",
                self.manager.identifier(),
                report.failures.len()
            );
        }
    }
}
