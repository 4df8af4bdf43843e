#![allow(clippy::too_many_arguments)]
#![doc = include_str!("../README.md")]

//!
//! ## Overview
//!
//! A scenario is a small set of containerized Babylon chains, optionally
//! connected through IBC by a relayer. Each named scenario is built by a
//! factory in [`framework::scenario`], which returns a
//! [`CurrentBranchConfigurer`](framework::configurer::CurrentBranchConfigurer)
//! implementing the [`Configurer`](framework::configurer::Configurer)
//! lifecycle:
//!
//! ```rust,no_run
//! use babylon_e2e_configurer::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = init_test()?;
//! let mut configurer = new_btc_timestamping_configurer(&config)?;
//!
//! configurer.run_setup()?;
//!
//! let chain_a = configurer.get_chain_config(0)?;
//! let node = chain_a.relayer_node()?;
//! println!("chain {} at height {}", chain_a.chain_id, node.latest_height()?);
//!
//! let report = configurer.clear_resources();
//! assert!(report.is_clean());
//! # Ok(())
//! # }
//! ```
//!
//! `run_setup` runs the phases of the scenario's
//! [`SetupPlan`](framework::setup::SetupPlan) in order, and writes the
//! scenario environment to `scenario.env` in the scenario directory:
//!
//! ```text
//! INFO setting up scenario btc-timestamp in /path/to/data/btc-timestamp-5f3a91c2
//! INFO running setup phase: configure chains
//! ...
//! INFO written scenario environment to /path/to/data/btc-timestamp-5f3a91c2/scenario.env
//! ```
//!
//! Setting `E2E_SKIP_CLEANUP=1` keeps the containers of a configurer that
//! is dropped without being cleared, so that they can be inspected with
//! the variables of `scenario.env`.

pub mod bootstrap;
pub mod chain;
pub mod container;
pub mod error;
pub mod framework;
pub mod prelude;
pub mod relayer;
pub mod types;
pub mod util;

#[cfg(test)]
mod tests;
