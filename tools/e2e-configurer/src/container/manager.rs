/*!
   Per-scenario container lifecycle.

   A [`ContainerManager`] namespaces every resource it creates with the
   scenario identifier, so that several scenarios can run side by side
   against the same container engine. It keeps track of what it started
   and tears all of it down in [`clear_resources`](ContainerManager::clear_resources).
*/

use core::fmt::{self, Display};
use core::time::Duration;
use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockWriteGuard};

use eyre::eyre;
use tracing::{debug, info, warn};

use super::runtime::{ContainerRuntime, ContainerSpec, DockerCli, Mount, RunMode};
use crate::chain::exec::ExecOutput;
use crate::chain::init::InitializedChain;
use crate::error::{handle_generic_error, Error};
use crate::types::config::{ImageConfig, TestConfig};
use crate::types::topology::NodeConfig;
use crate::util::random::random_u32;
use crate::util::retry::{assert_eventually_succeed, RetryPolicy};

/// Home directory of the chain binary inside node containers.
pub const NODE_HOME: &str = "/home/babylon/babylondata";

/// Where the contract bytecode directory is mounted in node containers.
pub const BYTECODE_DIR: &str = "/bytecode";

/// Where the Hermes configuration directory is mounted.
pub const HERMES_HOME: &str = "/root/hermes";

/// Where the Go relayer configuration directory is mounted.
pub const RLY_HOME: &str = "/home/relayer";

const CONTAINER_USER: &str = "root:root";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContainerRole {
    Node { chain_id: String },
    HermesRelayer,
    GoRelayer,
}

impl Display for ContainerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node { chain_id } => write!(f, "node of {chain_id}"),
            Self::HermesRelayer => write!(f, "hermes relayer"),
            Self::GoRelayer => write!(f, "go relayer"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TeardownFailure {
    pub resource: String,
    pub reason: String,
}

/**
   Best-effort result of tearing down a scenario.
*/
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TeardownReport {
    pub removed: Vec<String>,
    pub failures: Vec<TeardownFailure>,
}

impl TeardownReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, resource: String, result: Result<(), Error>) {
        match result {
            Ok(()) => self.removed.push(resource),
            Err(e) => {
                warn!("failed to remove {}: {}", resource, e);
                self.failures.push(TeardownFailure {
                    resource,
                    reason: e.to_string(),
                });
            }
        }
    }

}

#[derive(Debug, Default)]
struct Resources {
    containers: BTreeMap<String, ContainerRole>,
    network_created: bool,
}

#[derive(Debug)]
pub struct ContainerManager {
    identifier: String,
    debug_logging: bool,
    needs_go_relayer: bool,
    images: ImageConfig,
    contract_dir: PathBuf,
    scenario_dir: PathBuf,
    logs_dir: PathBuf,
    readiness: RetryPolicy,
    runtime: Arc<dyn ContainerRuntime>,
    resources: RwLock<Resources>,
}

impl ContainerManager {
    /**
       Create a manager backed by the `docker` CLI with the default
       [`TestConfig`].
    */
    pub fn new(
        identifier: &str,
        debug_logging: bool,
        needs_go_relayer: bool,
    ) -> Result<Self, Error> {
        let config = TestConfig {
            debug_logging,
            ..TestConfig::default()
        };

        Self::with_config(identifier, needs_go_relayer, &config)
    }

    pub fn with_config(
        identifier: &str,
        needs_go_relayer: bool,
        config: &TestConfig,
    ) -> Result<Self, Error> {
        let runtime = Arc::new(DockerCli::new(&config.docker_command));

        Self::with_runtime(identifier, needs_go_relayer, config, runtime)
    }

    pub fn with_runtime(
        identifier: &str,
        needs_go_relayer: bool,
        config: &TestConfig,
        runtime: Arc<dyn ContainerRuntime>,
    ) -> Result<Self, Error> {
        validate_identifier(identifier)?;

        if needs_go_relayer && config.images.rly.is_none() {
            return Err(Error::go_relayer_unavailable(identifier.to_string()));
        }

        let run_name = format!("{}-{:x}", identifier, random_u32());
        let scenario_dir = absolute_path(&config.chain_store_dir.join(&run_name))?;
        let logs_dir = absolute_path(&config.chain_store_dir.join("logs").join(&run_name))?;

        Ok(Self {
            identifier: identifier.to_string(),
            debug_logging: config.debug_logging,
            needs_go_relayer,
            images: config.images.clone(),
            contract_dir: absolute_path(&config.contract_dir)?,
            scenario_dir,
            logs_dir,
            readiness: config.readiness_policy(),
            runtime,
            resources: RwLock::new(Resources::default()),
        })
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn needs_go_relayer(&self) -> bool {
        self.needs_go_relayer
    }

    /// All data of the scenario lives under this directory.
    pub fn scenario_dir(&self) -> &Path {
        &self.scenario_dir
    }

    /**
       Logs of containers that failed to start are saved here. The
       directory survives [`clear_resources`](Self::clear_resources).
    */
    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn readiness(&self) -> RetryPolicy {
        self.readiness
    }

    pub fn network_name(&self) -> String {
        format!("bbn-testnet-{}", self.identifier)
    }

    pub fn hermes_container_name(&self) -> String {
        format!("hermes-relayer-{}", self.identifier)
    }

    pub fn rly_container_name(&self) -> String {
        format!("rly-relayer-{}", self.identifier)
    }

    /// Names of the containers currently owned by this manager.
    pub fn containers(&self) -> Vec<String> {
        self.resources().containers.keys().cloned().collect()
    }

    pub fn is_tracked(&self, container: &str) -> bool {
        self.resources().containers.contains_key(container)
    }

    fn resources(&self) -> RwLockWriteGuard<'_, Resources> {
        // the registry stays consistent even if a holder panicked
        self.resources
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn ensure_network(&self) -> Result<(), Error> {
        let mut resources = self.resources();

        if !resources.network_created {
            let network = self.network_name();
            debug!("creating network {}", network);

            self.runtime.create_network(&network)?;
            resources.network_created = true;
        }

        Ok(())
    }

    /**
       Start a detached container and take ownership of it.

       The container is owned even if starting it fails, since the engine
       may have created it before failing to start it.
    */
    pub fn start_container(&self, spec: &ContainerSpec, role: ContainerRole) -> Result<(), Error> {
        self.ensure_network()?;

        info!("starting {} container {}", role, spec.name);

        self.resources()
            .containers
            .insert(spec.name.clone(), role);

        self.runtime.run(spec)?;

        Ok(())
    }

    /**
       Run the chain initialization image for one chain and return its
       description of the generated nodes.
    */
    pub fn run_chain_init_resource(
        &self,
        chain_id: &str,
        voting_period: Duration,
        expedited_voting_period: Duration,
        node_configs: &[NodeConfig],
        data_dir: &Path,
    ) -> Result<InitializedChain, Error> {
        self.ensure_network()?;
        fs::create_dir_all(data_dir)?;

        let config_json = serde_json::to_string(node_configs).map_err(handle_generic_error)?;
        let data_dir_str = data_dir.display().to_string();

        let spec = ContainerSpec::new(
            format!("{}-init-{}", chain_id, self.identifier),
            &self.images.init,
            RunMode::Foreground,
        )
        .network(&self.network_name())
        .user(CONTAINER_USER)
        .mount(Mount::new(data_dir, &data_dir_str))
        .args([
            format!("--data-dir={data_dir_str}"),
            format!("--chain-id={chain_id}"),
            format!("--config={config_json}"),
            format!("--voting-period={}s", voting_period.as_secs()),
            format!(
                "--expedited-voting-period={}s",
                expedited_voting_period.as_secs()
            ),
        ]);

        info!("initializing chain {} in {}", chain_id, data_dir_str);

        let output = self.runtime.run(&spec)?;
        self.log_output(&spec.name, &output);

        InitializedChain::read(data_dir, chain_id)
    }

    /// Start a full node from its initialized home directory.
    pub fn run_node_resource(
        &self,
        chain_id: &str,
        node_name: &str,
        config_dir: &Path,
    ) -> Result<(), Error> {
        let spec = ContainerSpec::new(node_name, &self.images.babylon, RunMode::Detached)
            .network(&self.network_name())
            .user(CONTAINER_USER)
            .mount(Mount::new(config_dir, NODE_HOME))
            .mount(Mount::new(&self.contract_dir, BYTECODE_DIR).read_only())
            .env("BABYLON_BLS_PASSWORD", "password")
            .entrypoint("sh")
            .args(["-c".to_string(), format!("babylond start --home {NODE_HOME}")]);

        self.start_container(
            &spec,
            ContainerRole::Node {
                chain_id: chain_id.to_string(),
            },
        )
    }

    /**
       Start the Hermes relayer with the configuration directory prepared
       in `hermes_dir`. `startup_script` runs in the container's shell.
    */
    pub fn run_hermes_resource(&self, hermes_dir: &Path, startup_script: &str) -> Result<String, Error> {
        let name = self.hermes_container_name();

        let spec = ContainerSpec::new(&name, &self.images.hermes, RunMode::Detached)
            .network(&self.network_name())
            .user(CONTAINER_USER)
            .mount(Mount::new(hermes_dir, HERMES_HOME))
            .entrypoint("sh")
            .args(["-c", startup_script]);

        self.start_container(&spec, ContainerRole::HermesRelayer)?;

        Ok(name)
    }

    /// Start the Go relayer with the configuration prepared in `rly_dir`.
    pub fn run_rly_resource(
        &self,
        rly_dir: &Path,
        startup_script: &str,
        env: &[(&str, &str)],
    ) -> Result<String, Error> {
        let image = match (&self.images.rly, self.needs_go_relayer) {
            (Some(image), true) => image.clone(),
            _ => return Err(Error::go_relayer_unavailable(self.identifier.clone())),
        };

        let name = self.rly_container_name();

        let mut spec = ContainerSpec::new(&name, image, RunMode::Detached)
            .network(&self.network_name())
            .user(CONTAINER_USER)
            .mount(Mount::new(rly_dir, format!("{RLY_HOME}/config-files")))
            .entrypoint("sh")
            .args(["-c", startup_script]);

        for (key, value) in env {
            spec = spec.env(key, value);
        }

        self.start_container(&spec, ContainerRole::GoRelayer)?;

        Ok(name)
    }

    /**
       Wait until the container reports a running state. On timeout the
       container logs are saved to the [logs directory](Self::logs_dir).
    */
    pub fn wait_until_running(&self, container: &str) -> Result<(), Error> {
        let res = assert_eventually_succeed(
            &format!("container {container} is running"),
            self.readiness,
            || {
                if self.runtime.is_running(container)? {
                    Ok(())
                } else {
                    Err(Error::container_not_running(container.to_string()))
                }
            },
        );

        if res.is_err() {
            self.save_logs(container);
            return Err(Error::container_not_running(container.to_string()));
        }

        Ok(())
    }

    fn save_logs(&self, container: &str) {
        let log_path = self.logs_dir.join(format!("{container}.log"));

        let res = self.runtime.logs(container).and_then(|logs| {
            fs::create_dir_all(&self.logs_dir)?;
            fs::write(&log_path, logs)?;
            Ok(())
        });

        match res {
            Ok(()) => info!("saved logs of {} to {}", container, log_path.display()),
            Err(e) => warn!("failed to save logs of {}: {}", container, e),
        }
    }

    /// Execute a command in a container once.
    pub fn exec(&self, container: &str, command: &[&str]) -> Result<ExecOutput, Error> {
        let output = self.runtime.exec(container, command)?;
        self.log_output(container, &output);

        Ok(output)
    }

    /**
       Execute a command in a container until it succeeds and its output
       contains `success`. An empty `success` accepts any successful run.
    */
    pub fn exec_cmd(
        &self,
        container: &str,
        command: &[&str],
        success: &str,
    ) -> Result<ExecOutput, Error> {
        debug!(
            "running `{}` in container {}",
            itertools::join(command, " "),
            container
        );

        assert_eventually_succeed(
            &format!("`{}` in {}", itertools::join(command, " "), container),
            self.readiness,
            || {
                let output = self.exec(container, command)?;

                if success.is_empty() || output.contains(success) {
                    Ok(output)
                } else {
                    Err(Error::generic(eyre!(
                        "expected output to contain '{}', got: {}",
                        success,
                        output.stdout
                    )))
                }
            },
        )
    }

    fn log_output(&self, container: &str, output: &ExecOutput) {
        if self.debug_logging {
            info!(
                "output of {}:\nstdout: {}\nstderr: {}",
                container, output.stdout, output.stderr
            );
        }
    }

    /**
       Remove every container this manager started, then the scenario
       network and data directory.

       Failures are logged and reported but never stop the teardown.
       Resources are forgotten even when their removal failed, so calling
       this again is a no-op.
    */
    pub fn clear_resources(&self) -> TeardownReport {
        let mut report = TeardownReport::default();

        let (containers, network_created) = {
            let mut resources = self.resources();
            let containers = core::mem::take(&mut resources.containers);
            let network_created = core::mem::replace(&mut resources.network_created, false);
            (containers, network_created)
        };

        if !containers.is_empty() || network_created {
            info!("tearing down scenario {}", self.identifier);
        }

        for (name, role) in containers {
            debug!("removing {} container {}", role, name);
            let res = self.runtime.remove(&name);
            report.record(name, res);
        }

        if network_created {
            let network = self.network_name();
            let res = self.runtime.remove_network(&network);
            report.record(network, res);
        }

        if self.scenario_dir.exists() {
            let res = fs::remove_dir_all(&self.scenario_dir).map_err(Error::from);
            report.record(self.scenario_dir.display().to_string(), res);
        }

        report
    }
}

fn validate_identifier(identifier: &str) -> Result<(), Error> {
    let mut chars = identifier.chars();

    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_lowercase() || first.is_ascii_digit())
                && chars.all(|c| {
                    c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_' | '.')
                })
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(Error::invalid_identifier(identifier.to_string()))
    }
}

fn absolute_path(path: &Path) -> Result<PathBuf, Error> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn identifiers_are_validated() {
        for valid in ["btc-timestamp", "ibc-transfer", "btc-timestamping-rly", "a.b_c-1"] {
            assert!(validate_identifier(valid).is_ok(), "{valid}");
        }

        for invalid in ["", "-leading", "Upper", "with space", "slash/ed"] {
            assert!(validate_identifier(invalid).is_err(), "{invalid}");
        }
    }

    #[test]
    fn go_relayer_requires_an_image() {
        let mut config = TestConfig::default();
        config.images.rly = None;

        assert!(ContainerManager::with_config("needs-rly", true, &config).is_err());
        assert!(ContainerManager::with_config("no-rly", false, &config).is_ok());
    }

    #[test]
    fn resource_names_are_namespaced() {
        let manager = ContainerManager::new("btc-staking", false, false).unwrap();

        assert_eq!(manager.network_name(), "bbn-testnet-btc-staking");
        assert_eq!(manager.hermes_container_name(), "hermes-relayer-btc-staking");
        assert_eq!(manager.rly_container_name(), "rly-relayer-btc-staking");
        assert!(manager.scenario_dir().is_absolute());
        assert!(!manager.logs_dir().starts_with(manager.scenario_dir()));
        assert!(manager
            .scenario_dir()
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("btc-staking-"));
    }

    #[test]
    fn clearing_an_unused_manager_is_clean() {
        let manager = ContainerManager::new("unused", false, false).unwrap();

        assert!(manager.clear_resources().is_clean());
        assert!(manager.clear_resources().removed.is_empty());
    }
}
