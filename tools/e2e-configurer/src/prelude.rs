/*!
   Re-export of common constructs that are used by test cases.
*/

pub use crate::bootstrap::init::init_test;
pub use crate::chain::config::ChainConfig;
pub use crate::chain::node::ChainNode;
pub use crate::container::{ContainerManager, ContainerRuntime, TeardownReport};
pub use crate::error::{handle_generic_error, Error};
pub use crate::framework::configurer::{Configurer, CurrentBranchConfigurer};
pub use crate::framework::scenario::{
    new_btc_staking_configurer, new_btc_timestamping_configurer,
    new_btc_timestamping_phase2_configurer, new_btc_timestamping_phase2_rly_configurer,
    new_ibc_transfer_configurer, Scenario, CHAIN_A_ID, CHAIN_B_ID,
};
pub use crate::framework::setup::{SetupPhase, SetupPlan};
pub use crate::relayer::RelayerKind;
pub use crate::types::channel::ChannelConfig;
pub use crate::types::config::TestConfig;
pub use crate::types::topology::{NodeConfig, PruningStrategy};
pub use crate::util::retry::{assert_eventually_succeed, RetryPolicy};
