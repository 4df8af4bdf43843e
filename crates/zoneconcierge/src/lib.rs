#![forbid(unsafe_code)]
#![deny(trivial_numeric_casts, unused_import_braces, rust_2018_idioms)]
#![doc = include_str!("../README.md")]

//! ## Overview
//!
//! The [`Keeper`](keeper::Keeper) records, for every IBC channel opened
//! against the zone concierge port, whether the one-time initialization
//! work for that channel has completed. The state lives in a byte-keyed
//! [`KvStore`](store::KvStore) scoped under a fixed namespace prefix, and
//! the set of channels itself is read from an external
//! [`ChannelKeeper`](keeper::ChannelKeeper).

pub mod keeper;
pub mod store;
pub mod types;
