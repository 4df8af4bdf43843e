/*!
   Constants identifying the zone concierge IBC application and the
   layout of its keeper store.
*/

use ibc_relayer_types::core::ics04_channel::channel::Ordering;

/// Name of the module, also used as its store key.
pub const MODULE_NAME: &str = "zoneconcierge";

/// The port the zone concierge application binds to.
pub const PORT_ID: &str = "zoneconcierge";

/// The IBC application version negotiated on zone concierge channels.
pub const VERSION: &str = "zoneconcierge-1";

/// Zone concierge channels are always ordered.
pub const ORDERING: Ordering = Ordering::Ordered;

/// Store key under which the bound port identifier is kept.
pub const PORT_KEY: &[u8] = &[0x11];

/**
   Namespace prefix of the uninitialized channel store.

   Key: channel identifier bytes. Value: [`UNINITIALIZED_MARKER`].
*/
pub const IBC_CHANNELS_KEY: &[u8] = &[0x16];

/// Sentinel value stored for every channel pending initialization.
pub const UNINITIALIZED_MARKER: &[u8] = &[0x00];
