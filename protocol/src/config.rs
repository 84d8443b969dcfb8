//! # Protocol Configuration & Constants
//!
//! Every magic string the ledger writes to disk or puts on an event stream
//! lives here. Record layouts and event names are part of the public
//! contract with downstream listeners; renaming one is a breaking change.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// Major version: bump when the persisted record layout changes.
pub const PROTOCOL_VERSION_MAJOR: u16 = 0;

/// Minor version: bump on backward-compatible additions.
pub const PROTOCOL_VERSION_MINOR: u16 = 1;

/// Patch version: bump on fixes that do not touch stored data.
pub const PROTOCOL_VERSION_PATCH: u16 = 0;

/// The full version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Storage
// ---------------------------------------------------------------------------

/// sled tree holding every investor and asset record, keyed by natural id.
pub const WORLD_STATE_TREE: &str = "world_state";

/// sled tree holding host bookkeeping (last committed tx id, etc.).
pub const METADATA_TREE: &str = "metadata";

/// Metadata key under which the id of the last committed transaction lives.
pub const META_LAST_TX_ID: &[u8] = b"last_tx_id";

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Event emitted after a successful subscription commits.
pub const EVENT_ASSET_SUBSCRIBED: &str = "AssetSubscribed";

/// Event emitted after a successful redemption commits.
pub const EVENT_ASSET_REDEEMED: &str = "AssetRedeemed";

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Seconds in one lock-in day. Lock-in periods are whole calendar-free days.
pub const SECONDS_PER_DAY: i64 = 86_400;

/// Legacy holding timestamp layout, minus the trailing zone abbreviation:
/// `2024-03-01 09:30:00.123456789 +0000`. The abbreviation (`UTC`, `IST`, ...)
/// carries no information the numeric offset does not, so it is stripped
/// before parsing.
pub const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";
