/*!
   The zone concierge keeper and the external collaborators it reads from.
*/

use core::str::FromStr;

use ibc_relayer_types::core::ics04_channel::channel::IdentifiedChannelEnd;
use ibc_relayer_types::core::ics24_host::identifier::PortId;
use tracing::debug;

use crate::store::{KvStore, PrefixStore, ReadStore};
use crate::types::{IBC_CHANNELS_KEY, PORT_KEY};

pub mod ibc_channels;
pub mod ibc_module;

/**
   Read access to the IBC core channel registry of the host chain.
*/
pub trait ChannelKeeper {
    /**
       Return every channel known to the host chain, regardless of state
       or owning port. The order is whatever the registry yields.
    */
    fn get_all_channels(&self) -> Vec<IdentifiedChannelEnd>;
}

impl<C: ChannelKeeper + ?Sized> ChannelKeeper for &C {
    fn get_all_channels(&self) -> Vec<IdentifiedChannelEnd> {
        (**self).get_all_channels()
    }
}

impl ChannelKeeper for Vec<IdentifiedChannelEnd> {
    fn get_all_channels(&self) -> Vec<IdentifiedChannelEnd> {
        self.clone()
    }
}

#[derive(Debug)]
pub struct Keeper<S, C> {
    store: S,
    channel_keeper: C,
}

impl<S, C> Keeper<S, C>
where
    S: KvStore,
    C: ChannelKeeper,
{
    pub fn new(store: S, channel_keeper: C) -> Self {
        Self {
            store,
            channel_keeper,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Record the port the application has bound to.
    pub fn bind_port(&mut self, port_id: &PortId) {
        debug!("binding zone concierge to port {}", port_id);

        self.store.set(PORT_KEY, port_id.as_str().as_bytes());
    }

    /// The port the application has bound to, if any.
    pub fn get_port(&self) -> Option<PortId> {
        let raw = self.store.get(PORT_KEY)?;
        let port = core::str::from_utf8(&raw).ok()?;

        PortId::from_str(port).ok()
    }

    /**
       Whether the given port is the one bound by the zone concierge
       application.
    */
    pub fn is_bound(&self, port_id: &PortId) -> bool {
        self.get_port().as_ref() == Some(port_id)
    }

    fn uninitialized_channel_store(&mut self) -> PrefixStore<&mut S> {
        PrefixStore::new(&mut self.store, IBC_CHANNELS_KEY)
    }

    fn uninitialized_channel_view(&self) -> PrefixStore<&S> {
        PrefixStore::new(&self.store, IBC_CHANNELS_KEY)
    }
}
