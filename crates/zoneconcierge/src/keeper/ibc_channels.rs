/*!
   Channel bookkeeping of the zone concierge keeper.

   A channel is tracked from the moment it opens until its one-time
   initialization completes. Presence of an entry means "uninitialized";
   absence means either "never registered" or "already initialized", and
   the two cannot be told apart.
*/

use ibc_relayer_types::core::ics04_channel::channel::{IdentifiedChannelEnd, State};
use ibc_relayer_types::core::ics24_host::identifier::ChannelId;
use tracing::debug;

use super::{ChannelKeeper, Keeper};
use crate::store::{KvStore, ReadStore};
use crate::types::UNINITIALIZED_MARKER;

impl<S, C> Keeper<S, C>
where
    S: KvStore,
    C: ChannelKeeper,
{
    pub fn get_all_channels(&self) -> Vec<IdentifiedChannelEnd> {
        self.channel_keeper.get_all_channels()
    }

    /// All open channels connected to the zone concierge port.
    pub fn get_all_open_zc_channels(&self) -> Vec<IdentifiedChannelEnd> {
        let Some(zc_port) = self.get_port() else {
            return Vec::new();
        };

        self.get_all_channels()
            .into_iter()
            .filter(|channel| matches!(channel.channel_end.state, State::Open(_)))
            .filter(|channel| channel.port_id == zc_port)
            .collect()
    }

    /// Registering an already registered channel leaves the state unchanged.
    pub fn add_uninitialized_channel(&mut self, channel_id: &ChannelId) {
        debug!("registering uninitialized channel {}", channel_id);

        self.uninitialized_channel_store()
            .set(channel_id.as_str().as_bytes(), UNINITIALIZED_MARKER);
    }

    pub(crate) fn after_channel_initialized(&mut self, channel_id: &ChannelId) {
        debug!("channel {} initialized", channel_id);

        self.uninitialized_channel_store()
            .delete(channel_id.as_str().as_bytes());
    }

    pub fn is_channel_uninitialized(&self, channel_id: &ChannelId) -> bool {
        self.uninitialized_channel_view()
            .has(channel_id.as_str().as_bytes())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use core::str::FromStr;
    use ibc_relayer_types::core::ics04_channel::channel::{
        ChannelEnd, Counterparty, Ordering, UpgradeState,
    };
    use ibc_relayer_types::core::ics04_channel::packet::Sequence;
    use ibc_relayer_types::core::ics04_channel::version::Version;
    use ibc_relayer_types::core::ics24_host::identifier::{ConnectionId, PortId};
    use test_log::test;

    use crate::store::MemStore;
    use crate::types::{IBC_CHANNELS_KEY, PORT_ID, VERSION};

    pub fn port(port: &str) -> PortId {
        PortId::from_str(port).unwrap()
    }

    pub fn channel(port_id: &str, sequence: u64, state: State) -> IdentifiedChannelEnd {
        let channel_end = ChannelEnd::new(
            state,
            Ordering::Ordered,
            Counterparty::new(port(port_id), Some(ChannelId::new(sequence))),
            vec![ConnectionId::new(0)],
            Version::new(VERSION.to_string()),
            Sequence::from(0),
        );

        IdentifiedChannelEnd::new(port(port_id), ChannelId::new(sequence), channel_end)
    }

    pub fn open() -> State {
        State::Open(UpgradeState::NotUpgrading)
    }

    pub fn zc_keeper(
        channels: Vec<IdentifiedChannelEnd>,
    ) -> Keeper<MemStore, Vec<IdentifiedChannelEnd>> {
        let mut keeper = Keeper::new(MemStore::new(), channels);
        keeper.bind_port(&port(PORT_ID));
        keeper
    }

    #[test]
    fn registered_channel_is_uninitialized() {
        let mut keeper = zc_keeper(vec![]);
        let channel_id = ChannelId::new(0);

        assert!(!keeper.is_channel_uninitialized(&channel_id));

        keeper.add_uninitialized_channel(&channel_id);
        assert!(keeper.is_channel_uninitialized(&channel_id));
    }

    #[test]
    fn registration_is_idempotent() {
        let mut keeper = zc_keeper(vec![]);
        let channel_id = ChannelId::new(3);

        keeper.add_uninitialized_channel(&channel_id);
        let snapshot = keeper.store().clone();

        keeper.add_uninitialized_channel(&channel_id);

        assert!(keeper.is_channel_uninitialized(&channel_id));
        assert_eq!(keeper.store(), &snapshot);
    }

    #[test]
    fn initialized_channel_is_no_longer_tracked() {
        let mut keeper = zc_keeper(vec![]);
        let channel_id = ChannelId::new(1);

        keeper.add_uninitialized_channel(&channel_id);
        keeper.after_channel_initialized(&channel_id);

        assert!(!keeper.is_channel_uninitialized(&channel_id));
    }

    #[test]
    fn initializing_unregistered_channel_is_noop() {
        let mut keeper = zc_keeper(vec![]);
        keeper.add_uninitialized_channel(&ChannelId::new(7));
        let snapshot = keeper.store().clone();

        keeper.after_channel_initialized(&ChannelId::new(8));

        assert_eq!(keeper.store(), &snapshot);
        assert!(keeper.is_channel_uninitialized(&ChannelId::new(7)));
    }

    #[test]
    fn channel_entries_live_under_prefix() {
        let mut keeper = zc_keeper(vec![]);
        keeper.add_uninitialized_channel(&ChannelId::new(2));

        let key = [IBC_CHANNELS_KEY, b"channel-2".as_slice()].concat();
        assert_eq!(keeper.store().get(&key), Some(UNINITIALIZED_MARKER.to_vec()));
    }

    #[test]
    fn open_zc_channels_are_filtered_by_state_and_port() {
        let keeper = zc_keeper(vec![
            channel(PORT_ID, 0, open()),
            channel(PORT_ID, 1, State::Closed),
            channel("other", 2, open()),
        ]);

        assert_eq!(keeper.get_all_channels().len(), 3);

        let open_channels = keeper.get_all_open_zc_channels();
        assert_eq!(open_channels, vec![channel(PORT_ID, 0, open())]);
    }

    #[test]
    fn upgrading_channel_counts_as_open() {
        let keeper = zc_keeper(vec![
            channel(PORT_ID, 0, State::Open(UpgradeState::Upgrading)),
            channel(PORT_ID, 1, State::Init),
            channel(PORT_ID, 2, State::TryOpen),
        ]);

        let ids: Vec<_> = keeper
            .get_all_open_zc_channels()
            .into_iter()
            .map(|c| c.channel_id)
            .collect();

        assert_eq!(ids, vec![ChannelId::new(0)]);
    }

    #[test]
    fn open_zc_channels_follow_registry_order() {
        let keeper = zc_keeper(vec![
            channel(PORT_ID, 5, open()),
            channel(PORT_ID, 1, open()),
            channel(PORT_ID, 3, open()),
        ]);

        let ids: Vec<_> = keeper
            .get_all_open_zc_channels()
            .into_iter()
            .map(|c| c.channel_id)
            .collect();

        assert_eq!(
            ids,
            vec![ChannelId::new(5), ChannelId::new(1), ChannelId::new(3)]
        );
    }

    #[test]
    fn unbound_keeper_owns_no_channels() {
        let keeper = Keeper::new(MemStore::new(), vec![channel(PORT_ID, 0, open())]);

        assert!(keeper.get_port().is_none());
        assert!(keeper.get_all_open_zc_channels().is_empty());
    }
}
