/*!
   Setup plans: which bring-up phases a scenario runs, and in what order.

   A plan is built by wrapping the [`SetupPlan::Base`] plan, and every
   wrapper appends its own phases after those of the plan it wraps. The
   cross-chain phases therefore always run after the chains they need
   are up.
*/

use core::fmt::{self, Display};

use crate::error::Error;
use crate::relayer::RelayerKind;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetupPlan {
    /// Bring the chains up and wait for their validators.
    Base,

    /// Open the IBC channel with the Hermes relayer.
    WithIbc(Box<SetupPlan>),

    /// Open an ICS-20 transfer channel on the established connection.
    WithTransferChannel(Box<SetupPlan>),

    /// Instantiate the contract, then open the IBC channel to its port
    /// with the Hermes relayer.
    WithPhase2Ibc(Box<SetupPlan>),

    /// Same as [`SetupPlan::WithPhase2Ibc`] with the Go relayer.
    WithPhase2RlyIbc(Box<SetupPlan>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetupPhase {
    ConfigureChains,
    RunValidators,
    InstantiateContract,
    HermesRelayerIbc,
    CosmosRelayerIbc,
    IbcTransferChannel,
}

impl Display for SetupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ConfigureChains => "configure chains",
            Self::RunValidators => "run validators",
            Self::InstantiateContract => "instantiate babylon contract",
            Self::HermesRelayerIbc => "hermes relayer ibc",
            Self::CosmosRelayerIbc => "cosmos relayer ibc",
            Self::IbcTransferChannel => "ibc transfer channel",
        };

        write!(f, "{name}")
    }
}

impl SetupPhase {
    pub fn relayer(&self) -> Option<RelayerKind> {
        match self {
            Self::HermesRelayerIbc | Self::IbcTransferChannel => Some(RelayerKind::Hermes),
            Self::CosmosRelayerIbc => Some(RelayerKind::Go),
            _ => None,
        }
    }
}

impl SetupPlan {
    pub fn base() -> Self {
        Self::Base
    }

    pub fn with_ibc(self) -> Self {
        Self::WithIbc(Box::new(self))
    }

    pub fn with_transfer_channel(self) -> Self {
        Self::WithTransferChannel(Box::new(self))
    }

    pub fn with_phase2_ibc(self) -> Self {
        Self::WithPhase2Ibc(Box::new(self))
    }

    pub fn with_phase2_rly_ibc(self) -> Self {
        Self::WithPhase2RlyIbc(Box::new(self))
    }

    /// The phases of this plan in execution order.
    pub fn phases(&self) -> Vec<SetupPhase> {
        match self {
            Self::Base => vec![SetupPhase::ConfigureChains, SetupPhase::RunValidators],
            Self::WithIbc(inner) => inner.phases_then(&[SetupPhase::HermesRelayerIbc]),
            Self::WithTransferChannel(inner) => {
                inner.phases_then(&[SetupPhase::IbcTransferChannel])
            }
            Self::WithPhase2Ibc(inner) => inner.phases_then(&[
                SetupPhase::InstantiateContract,
                SetupPhase::HermesRelayerIbc,
            ]),
            Self::WithPhase2RlyIbc(inner) => inner.phases_then(&[
                SetupPhase::InstantiateContract,
                SetupPhase::CosmosRelayerIbc,
            ]),
        }
    }

    fn phases_then(&self, own: &[SetupPhase]) -> Vec<SetupPhase> {
        let mut phases = self.phases();
        phases.extend_from_slice(own);
        phases
    }

    pub fn wires_ibc(&self) -> bool {
        self.phases().iter().any(|phase| phase.relayer().is_some())
    }

    pub fn deploys_contract(&self) -> bool {
        self.phases().contains(&SetupPhase::InstantiateContract)
    }

    /**
       The relayer this plan selects, if it wires IBC at all.
       Fails if the plan needs both relayers.
    */
    pub fn relayer(&self) -> Result<Option<RelayerKind>, Error> {
        let mut selected = None;

        for relayer in self.phases().iter().filter_map(SetupPhase::relayer) {
            match selected {
                Some(kind) if kind != relayer => return Err(Error::conflicting_relayers()),
                _ => selected = Some(relayer),
            }
        }

        Ok(selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    use SetupPhase::*;

    #[test]
    fn base_plan_brings_chains_up() {
        let plan = SetupPlan::base();

        assert_eq!(plan.phases(), [ConfigureChains, RunValidators]);
        assert_eq!(plan.relayer().unwrap(), None);
        assert!(!plan.wires_ibc());
        assert!(!plan.deploys_contract());
    }

    #[test]
    fn wrapped_phases_run_after_inner_ones() {
        let plan = SetupPlan::base().with_ibc().with_transfer_channel();

        assert_eq!(
            plan.phases(),
            [
                ConfigureChains,
                RunValidators,
                HermesRelayerIbc,
                IbcTransferChannel
            ]
        );
        assert_eq!(plan.relayer().unwrap(), Some(RelayerKind::Hermes));
    }

    #[test]
    fn phase2_plans_instantiate_contract_before_relaying() {
        let hermes = SetupPlan::base().with_phase2_ibc();
        let rly = SetupPlan::base().with_phase2_rly_ibc();

        assert_eq!(
            hermes.phases(),
            [ConfigureChains, RunValidators, InstantiateContract, HermesRelayerIbc]
        );
        assert_eq!(
            rly.phases(),
            [ConfigureChains, RunValidators, InstantiateContract, CosmosRelayerIbc]
        );
        assert!(hermes.deploys_contract());
        assert_eq!(rly.relayer().unwrap(), Some(RelayerKind::Go));
    }

    #[test]
    fn mixing_relayers_is_rejected() {
        let plan = SetupPlan::base().with_phase2_rly_ibc().with_transfer_channel();

        assert!(plan.relayer().is_err());
    }
}
