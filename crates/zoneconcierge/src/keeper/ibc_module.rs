/*!
   Channel handshake callbacks and the one-time initialization pass.

   Channels opened on the zone concierge port are registered as
   uninitialized once their handshake completes on this chain. The
   initialization pass then performs the first-time work (e.g. sending
   the full header history) for each of them exactly once.
*/

use core::fmt::Display;

use ibc_relayer_types::core::ics04_channel::channel::IdentifiedChannelEnd;
use ibc_relayer_types::core::ics24_host::identifier::{ChannelId, PortId};
use tracing::{debug, info, warn};

use super::{ChannelKeeper, Keeper};
use crate::store::KvStore;

impl<S, C> Keeper<S, C>
where
    S: KvStore,
    C: ChannelKeeper,
{
    /// The handshake completed on the side that initiated it.
    pub fn on_chan_open_ack(&mut self, port_id: &PortId, channel_id: &ChannelId) {
        self.on_channel_opened(port_id, channel_id)
    }

    /// The handshake completed on the side that answered it.
    pub fn on_chan_open_confirm(&mut self, port_id: &PortId, channel_id: &ChannelId) {
        self.on_channel_opened(port_id, channel_id)
    }

    fn on_channel_opened(&mut self, port_id: &PortId, channel_id: &ChannelId) {
        if !self.is_bound(port_id) {
            debug!(
                "ignoring channel {} opened on foreign port {}",
                channel_id, port_id
            );
            return;
        }

        self.add_uninitialized_channel(channel_id);
    }

    /**
       Run `init` once for every open zone concierge channel that is still
       uninitialized, and mark it initialized when `init` succeeds.

       A failed initialization leaves the channel registered so that the
       next pass retries it. Returns the channels initialized in this pass,
       in registry order.
    */
    pub fn initialize_pending_channels<E: Display>(
        &mut self,
        mut init: impl FnMut(&IdentifiedChannelEnd) -> Result<(), E>,
    ) -> Vec<ChannelId> {
        let mut initialized = Vec::new();

        for channel in self.get_all_open_zc_channels() {
            if !self.is_channel_uninitialized(&channel.channel_id) {
                continue;
            }

            match init(&channel) {
                Ok(()) => {
                    self.after_channel_initialized(&channel.channel_id);
                    initialized.push(channel.channel_id);
                }
                Err(e) => {
                    warn!(
                        "failed to initialize channel {}/{}: {}",
                        channel.port_id, channel.channel_id, e
                    );
                }
            }
        }

        if !initialized.is_empty() {
            info!("initialized {} zone concierge channel(s)", initialized.len());
        }

        initialized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use ibc_relayer_types::core::ics04_channel::channel::State;
    use test_log::test;

    use crate::keeper::ibc_channels::tests::{channel, open, port, zc_keeper};
    use crate::types::PORT_ID;

    #[test]
    fn open_callbacks_register_zc_channels_only() {
        let mut keeper = zc_keeper(vec![]);

        keeper.on_chan_open_ack(&port(PORT_ID), &ChannelId::new(0));
        keeper.on_chan_open_confirm(&port(PORT_ID), &ChannelId::new(1));
        keeper.on_chan_open_ack(&port("transfer"), &ChannelId::new(2));

        assert!(keeper.is_channel_uninitialized(&ChannelId::new(0)));
        assert!(keeper.is_channel_uninitialized(&ChannelId::new(1)));
        assert!(!keeper.is_channel_uninitialized(&ChannelId::new(2)));
    }

    #[test]
    fn pending_channels_are_initialized_once() {
        let mut keeper = zc_keeper(vec![
            channel(PORT_ID, 0, open()),
            channel(PORT_ID, 1, open()),
            channel(PORT_ID, 2, State::Closed),
        ]);

        for sequence in 0..3 {
            keeper.add_uninitialized_channel(&ChannelId::new(sequence));
        }

        let mut calls = Vec::new();
        let initialized = keeper.initialize_pending_channels(|c| {
            calls.push(c.channel_id.clone());
            Ok::<_, String>(())
        });

        assert_eq!(initialized, vec![ChannelId::new(0), ChannelId::new(1)]);
        assert_eq!(calls, initialized);

        // closed channels are not initialized, but stay registered
        assert!(keeper.is_channel_uninitialized(&ChannelId::new(2)));

        let again = keeper.initialize_pending_channels(|_| Ok::<_, String>(()));
        assert!(again.is_empty());
    }

    #[test]
    fn failed_initialization_is_retried() {
        let mut keeper = zc_keeper(vec![channel(PORT_ID, 4, open())]);
        keeper.add_uninitialized_channel(&ChannelId::new(4));

        let first = keeper.initialize_pending_channels(|_| Err("relay queue full"));
        assert!(first.is_empty());
        assert!(keeper.is_channel_uninitialized(&ChannelId::new(4)));

        let second = keeper.initialize_pending_channels(|_| Ok::<_, &str>(()));
        assert_eq!(second, vec![ChannelId::new(4)]);
        assert!(!keeper.is_channel_uninitialized(&ChannelId::new(4)));
    }
}
