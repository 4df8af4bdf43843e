/*!
   The named end-to-end scenarios.

   Each scenario picks its chains, their node topologies and channel
   ends, and a [`SetupPlan`]. The node tables are built fresh for every
   scenario and suffixed with the scenario identifier, so that scenarios
   running side by side never share a container name.
*/

use core::fmt::{self, Display};
use std::sync::Arc;

use super::configurer::CurrentBranchConfigurer;
use super::setup::SetupPlan;
use crate::chain::config::ChainConfig;
use crate::container::manager::ContainerManager;
use crate::container::runtime::{ContainerRuntime, DockerCli};
use crate::error::Error;
use crate::types::channel::ChannelConfig;
use crate::types::config::TestConfig;
use crate::types::topology::{node_configs_with_identifier, NodeConfig, PruningStrategy};

pub const CHAIN_A_ID: &str = "chain-A";

pub const CHAIN_B_ID: &str = "chain-B";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Scenario {
    BtcTimestamping,
    IbcTransfer,
    BtcTimestampingPhase2,
    BtcTimestampingPhase2Rly,
    BtcStaking,
}

impl Scenario {
    pub const ALL: [Scenario; 5] = [
        Self::BtcTimestamping,
        Self::IbcTransfer,
        Self::BtcTimestampingPhase2,
        Self::BtcTimestampingPhase2Rly,
        Self::BtcStaking,
    ];

    /// Namespace of the scenario's containers and data.
    pub fn identifier(&self) -> &'static str {
        match self {
            Self::BtcTimestamping => "btc-timestamp",
            Self::IbcTransfer => "ibc-transfer",
            Self::BtcTimestampingPhase2 => "btc-timestamping",
            Self::BtcTimestampingPhase2Rly => "btc-timestamping-rly",
            Self::BtcStaking => "btc-staking",
        }
    }

    pub fn needs_go_relayer(&self) -> bool {
        matches!(self, Self::BtcTimestampingPhase2Rly)
    }

    pub fn plan(&self) -> SetupPlan {
        match self {
            Self::BtcTimestamping => SetupPlan::base().with_ibc(),
            // the transfer channel is built on the connection of the IBC phase
            Self::IbcTransfer => SetupPlan::base().with_ibc().with_transfer_channel(),
            Self::BtcTimestampingPhase2 => SetupPlan::base().with_phase2_ibc(),
            Self::BtcTimestampingPhase2Rly => SetupPlan::base().with_phase2_rly_ibc(),
            Self::BtcStaking => SetupPlan::base(),
        }
    }

    /// Build the scenario's configurer backed by the `docker` CLI.
    pub fn build(&self, config: &TestConfig) -> Result<CurrentBranchConfigurer, Error> {
        let runtime = Arc::new(DockerCli::new(&config.docker_command));
        self.build_with_runtime(config, runtime)
    }

    pub fn build_with_runtime(
        &self,
        config: &TestConfig,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Result<CurrentBranchConfigurer, Error> {
        let identifier = self.identifier();

        let manager = Arc::new(ContainerManager::with_runtime(
            identifier,
            self.needs_go_relayer(),
            config,
            runtime,
        )?);

        let chain_a = ChainConfig::new(
            manager.clone(),
            CHAIN_A_ID,
            node_configs_with_identifier(identifier, &validator_configs_chain_a()),
            self.has_ibc().then(ibc_config_chain_a).transpose()?,
        );

        let chains = if self.has_ibc() {
            let chain_b = ChainConfig::new(
                manager.clone(),
                CHAIN_B_ID,
                node_configs_with_identifier(identifier, &validator_configs_chain_b()),
                Some(ibc_config_chain_b()?),
            );

            vec![chain_a, chain_b]
        } else {
            vec![chain_a]
        };

        Ok(CurrentBranchConfigurer::new(chains, self.plan(), manager)?
            .skip_cleanup(config.skip_cleanup))
    }

    fn has_ibc(&self) -> bool {
        !matches!(self, Self::BtcStaking)
    }
}

impl Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.identifier())
    }
}

pub fn new_btc_timestamping_configurer(
    config: &TestConfig,
) -> Result<CurrentBranchConfigurer, Error> {
    Scenario::BtcTimestamping.build(config)
}

pub fn new_ibc_transfer_configurer(config: &TestConfig) -> Result<CurrentBranchConfigurer, Error> {
    Scenario::IbcTransfer.build(config)
}

pub fn new_btc_timestamping_phase2_configurer(
    config: &TestConfig,
) -> Result<CurrentBranchConfigurer, Error> {
    Scenario::BtcTimestampingPhase2.build(config)
}

pub fn new_btc_timestamping_phase2_rly_configurer(
    config: &TestConfig,
) -> Result<CurrentBranchConfigurer, Error> {
    Scenario::BtcTimestampingPhase2Rly.build(config)
}

pub fn new_btc_staking_configurer(config: &TestConfig) -> Result<CurrentBranchConfigurer, Error> {
    Scenario::BtcStaking.build(config)
}

fn node(
    name: &str,
    pruning: PruningStrategy,
    snapshot_interval: u64,
    snapshot_keep_recent: u32,
    is_validator: bool,
) -> NodeConfig {
    NodeConfig {
        name: name.to_string(),
        pruning,
        pruning_keep_recent: 0,
        pruning_interval: 0,
        snapshot_interval,
        snapshot_keep_recent,
        is_validator,
    }
}

/// Chain A: two validators and one non-validator serving the relayer.
pub fn validator_configs_chain_a() -> Vec<NodeConfig> {
    vec![
        node("babylon-default-a-1", PruningStrategy::Default, 25, 10, true),
        node("babylon-default-a-2", PruningStrategy::Nothing, 1500, 2, true),
        node("babylon-default-a-3", PruningStrategy::Nothing, 1500, 2, false),
    ]
}

pub fn validator_configs_chain_b() -> Vec<NodeConfig> {
    vec![
        node("babylon-default-b-1", PruningStrategy::Default, 1500, 2, true),
        node("babylon-default-b-2", PruningStrategy::Nothing, 1500, 2, true),
        node("babylon-default-b-3", PruningStrategy::Nothing, 1500, 2, false),
    ]
}

pub fn ibc_config_chain_a() -> Result<ChannelConfig, Error> {
    ChannelConfig::zoneconcierge()
}

/// The port is replaced by the contract port in phase 2 scenarios.
pub fn ibc_config_chain_b() -> Result<ChannelConfig, Error> {
    ChannelConfig::zoneconcierge()
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn node_tables_are_fresh_for_every_call() {
        let suffixed = node_configs_with_identifier("btc-staking", &validator_configs_chain_a());

        assert_eq!(suffixed[0].name, "babylon-default-a-1-btc-staking");
        assert_eq!(validator_configs_chain_a()[0].name, "babylon-default-a-1");
    }

    #[test]
    fn every_chain_has_validators_and_a_relayer_node() {
        for table in [validator_configs_chain_a(), validator_configs_chain_b()] {
            assert_eq!(table.iter().filter(|n| n.is_validator).count(), 2);
            assert!(!table.last().unwrap().is_validator);
        }
    }

    #[test]
    fn scenario_identifiers_are_distinct() {
        let mut identifiers = Scenario::ALL.map(|s| s.identifier()).to_vec();
        identifiers.sort();
        identifiers.dedup();

        assert_eq!(identifiers.len(), Scenario::ALL.len());
    }
}
