/*!
   Functions for initializing each test at the beginning of a Rust test
   session.
*/

use core::str::FromStr;
use core::time::Duration;
use eyre::{eyre, Report as Error};
use std::env;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Once;
use tracing::warn;
use tracing_subscriber::{
    self as ts,
    filter::{EnvFilter, LevelFilter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::types::config::{ImageConfig, TestConfig};

static INIT: Once = Once::new();

/**
   Initialize the test with a global logger and error handlers,
   read the environment variables and return a [`TestConfig`].
*/
pub fn init_test() -> Result<TestConfig, Error> {
    let no_color_log = env_flag("NO_COLOR_LOG");

    INIT.call_once(|| {
        install_logger(!no_color_log);

        if std::io::stderr().is_terminal() && !no_color_log {
            if let Err(e) = color_eyre::install() {
                warn!("failed to install color-eyre: {}", e);
            }
        }
    });

    load_test_config(|key| env::var(key).ok())
}

/**
   Build the [`TestConfig`] from the given variable lookup, falling back
   to the defaults for unset variables.
*/
pub fn load_test_config(var: impl Fn(&str) -> Option<String>) -> Result<TestConfig, Error> {
    let defaults = TestConfig::default();
    let flag = |key: &str| {
        var(key)
            .map(|val| val == "1" || val.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    };

    let default_images = ImageConfig::default();
    let images = ImageConfig {
        babylon: var("E2E_BABYLON_IMAGE").unwrap_or(default_images.babylon),
        init: var("E2E_INIT_IMAGE").unwrap_or(default_images.init),
        hermes: var("E2E_HERMES_IMAGE").unwrap_or(default_images.hermes),
        rly: match var("E2E_RLY_IMAGE") {
            Some(image) if image.is_empty() => None,
            Some(image) => Some(image),
            None => default_images.rly,
        },
    };

    let readiness_attempts = match var("E2E_READY_ATTEMPTS") {
        Some(val) => parse_var("E2E_READY_ATTEMPTS", &val)?,
        None => defaults.readiness_attempts,
    };

    let readiness_interval = match var("E2E_READY_INTERVAL_MS") {
        Some(val) => Duration::from_millis(parse_var("E2E_READY_INTERVAL_MS", &val)?),
        None => defaults.readiness_interval,
    };

    Ok(TestConfig {
        chain_store_dir: var("E2E_STORE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.chain_store_dir),
        debug_logging: flag("E2E_DEBUG_LOG"),
        skip_cleanup: flag("E2E_SKIP_CLEANUP"),
        docker_command: var("E2E_DOCKER_COMMAND").unwrap_or(defaults.docker_command),
        images,
        contract_dir: var("E2E_CONTRACT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.contract_dir),
        readiness_attempts,
        readiness_interval,
    })
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|val| val == "1").unwrap_or(false)
}

fn parse_var<T: FromStr>(key: &str, val: &str) -> Result<T, Error> {
    val.parse()
        .map_err(|_| eyre!("invalid value '{}' for environment variable {}", val, key))
}

/**
   Install the [`tracing_subscriber`] logger handlers so that logs will
   be displayed during test.
*/
pub fn install_logger(with_color: bool) {
    // Use log level INFO by default if RUST_LOG is not set.
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    let layer = ts::fmt::layer().with_ansi(with_color);

    // a logger may already be installed by the test harness
    let _ = ts::registry().with(env_filter).with(layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::BTreeMap;
    use test_log::test;

    fn load(vars: &[(&str, &str)]) -> Result<TestConfig, Error> {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        load_test_config(|key| vars.get(key).cloned())
    }

    #[test]
    fn unset_variables_fall_back_to_defaults() {
        assert_eq!(load(&[]).unwrap(), TestConfig::default());
    }

    #[test]
    fn variables_override_defaults() {
        let config = load(&[
            ("E2E_STORE_DIR", "/tmp/e2e"),
            ("E2E_DEBUG_LOG", "true"),
            ("E2E_SKIP_CLEANUP", "1"),
            ("E2E_DOCKER_COMMAND", "podman"),
            ("E2E_RLY_IMAGE", ""),
            ("E2E_READY_ATTEMPTS", "5"),
            ("E2E_READY_INTERVAL_MS", "10"),
        ])
        .unwrap();

        assert_eq!(config.chain_store_dir, PathBuf::from("/tmp/e2e"));
        assert!(config.debug_logging);
        assert!(config.skip_cleanup);
        assert_eq!(config.docker_command, "podman");
        assert_eq!(config.images.rly, None);
        assert_eq!(config.readiness_attempts, 5);
        assert_eq!(config.readiness_interval, Duration::from_millis(10));
    }

    #[test]
    fn malformed_numbers_are_rejected() {
        assert!(load(&[("E2E_READY_ATTEMPTS", "many")]).is_err());
    }
}
