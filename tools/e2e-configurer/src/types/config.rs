/*!
   Definition for the test configuration.
*/

use core::time::Duration;
use std::path::PathBuf;

use crate::util::retry::RetryPolicy;

pub const DEFAULT_BABYLON_IMAGE: &str = "babylonchain/babylond:latest";
pub const DEFAULT_INIT_IMAGE: &str = "babylonchain/babylond-e2e-init-chain:latest";
pub const DEFAULT_HERMES_IMAGE: &str = "informalsystems/hermes:v1.8.2";
pub const DEFAULT_RLY_IMAGE: &str = "public.ecr.aws/t9e9i3h0/cosmos-relayer:main";

/**
   The container images used to run each kind of process in a scenario.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageConfig {
    /// Image running the chain full nodes.
    pub babylon: String,

    /// Image that generates genesis and node home directories for a chain.
    pub init: String,

    pub hermes: String,

    /// The Go relayer image. Only required by scenarios relaying with `rly`.
    pub rly: Option<String>,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            babylon: DEFAULT_BABYLON_IMAGE.to_string(),
            init: DEFAULT_INIT_IMAGE.to_string(),
            hermes: DEFAULT_HERMES_IMAGE.to_string(),
            rly: Some(DEFAULT_RLY_IMAGE.to_string()),
        }
    }
}

/**
   The test configuration, loaded from environment variables by
   [`init_test`](crate::bootstrap::init::init_test).

   All fields can be overridden by test authors before a scenario is
   built.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestConfig {
    /**
       The directory under which every scenario creates its own data
       directory, named after the scenario identifier and a random suffix.

       Configured through the `E2E_STORE_DIR` environment variable.
    */
    pub chain_store_dir: PathBuf,

    /**
       Log the output of every command executed inside a container.
    */
    pub debug_logging: bool,

    /**
       Keep the containers alive when a configurer is dropped without
       being cleared, so that they can be inspected manually.
    */
    pub skip_cleanup: bool,

    /// The container engine CLI. Defaults to `docker`.
    pub docker_command: String,

    pub images: ImageConfig,

    /**
       Host directory holding the smart contract bytecode. It is mounted
       read-only at `/bytecode` in every chain node container.
    */
    pub contract_dir: PathBuf,

    pub readiness_attempts: u16,

    pub readiness_interval: Duration,
}

impl TestConfig {
    pub fn readiness_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.readiness_attempts, self.readiness_interval)
    }
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            chain_store_dir: PathBuf::from("data"),
            debug_logging: false,
            skip_cleanup: false,
            docker_command: "docker".to_string(),
            images: ImageConfig::default(),
            contract_dir: PathBuf::from("bytecode"),
            readiness_attempts: 300,
            readiness_interval: Duration::from_secs(1),
        }
    }
}
