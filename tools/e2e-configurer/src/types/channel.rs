/*!
   Application-level identity of one side of an IBC channel.
*/

use core::str::FromStr;

use babylon_zoneconcierge::types as zctypes;
use eyre::eyre;
use ibc_relayer_types::core::ics04_channel::channel::Ordering;
use ibc_relayer_types::core::ics04_channel::version::Version;
use ibc_relayer_types::core::ics24_host::identifier::PortId;

use crate::error::Error;

pub const TRANSFER_VERSION: &str = "ics20-1";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelConfig {
    /**
       The port on this side of the channel.

       For scenarios relaying to a smart contract, the port is only known
       once the contract is instantiated and gets overwritten then.
    */
    pub port_id: PortId,

    pub ordering: Ordering,

    pub version: Version,
}

impl ChannelConfig {
    /// The zone concierge channel end.
    pub fn zoneconcierge() -> Result<Self, Error> {
        Ok(Self {
            port_id: parse_port_id(zctypes::PORT_ID)?,
            ordering: zctypes::ORDERING,
            version: Version::new(zctypes::VERSION.to_string()),
        })
    }

    /// The ICS-20 fungible token transfer channel end.
    pub fn transfer() -> Self {
        Self {
            port_id: PortId::transfer(),
            ordering: Ordering::Unordered,
            version: Version::new(TRANSFER_VERSION.to_string()),
        }
    }

    /// Point this channel end at the port owned by a wasm contract.
    pub fn set_contract_port(&mut self, contract_address: &str) -> Result<(), Error> {
        self.port_id = parse_port_id(&format!("wasm.{contract_address}"))?;
        Ok(())
    }

    /// The value of the `--order` flag accepted by the relayer CLIs.
    pub fn ordering_flag(&self) -> &'static str {
        match self.ordering {
            Ordering::Ordered => "ordered",
            Ordering::Unordered | Ordering::Uninitialized => "unordered",
        }
    }
}

pub fn parse_port_id(port_id: &str) -> Result<PortId, Error> {
    PortId::from_str(port_id)
        .map_err(|e| Error::generic(eyre!("invalid port identifier '{}': {}", port_id, e)))
}
