/*!
   A [`ContainerRuntime`] that records every call and answers like the
   containers of a scenario would.

   Running the chain initialization image writes the files the real image
   produces: one home directory per node with a minimal `app.toml`, and
   the `<chain id>-encode` description of the chain.
*/

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use eyre::eyre;
use serde_json as json;

use crate::chain::exec::ExecOutput;
use crate::container::runtime::{ContainerRuntime, ContainerSpec, RunMode};
use crate::error::Error;

pub const CONTRACT_ADDRESS: &str = "bbn14hj2tavq8fpesdwxxcu44rty3hh90vhujrvcmstl4zr3txmfvw9syx25zy";

#[derive(Debug, Default)]
struct MockState {
    networks: BTreeSet<String>,
    containers: BTreeMap<String, ContainerSpec>,
    heights: BTreeMap<String, u64>,
    code_stored: bool,
    contract_instantiated: bool,
    events: Vec<String>,
    never_running: BTreeSet<String>,
    failing_starts: BTreeSet<String>,
    failing_removals: BTreeSet<String>,
}

#[derive(Debug, Default)]
pub struct MockRuntime {
    state: Mutex<MockState>,
}

impl MockRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    /// Containers with this name start but never report running.
    pub fn never_running(&self, container: &str) {
        self.state().never_running.insert(container.to_string());
    }

    /// Containers with this name are created, then fail to start.
    pub fn fail_start(&self, container: &str) {
        self.state().failing_starts.insert(container.to_string());
    }

    /// Removing this container fails.
    pub fn fail_removal(&self, container: &str) {
        self.state().failing_removals.insert(container.to_string());
    }

    pub fn events(&self) -> Vec<String> {
        self.state().events.clone()
    }

    /// Position of the first recorded event containing `pattern`.
    pub fn position(&self, pattern: &str) -> Option<usize> {
        self.state()
            .events
            .iter()
            .position(|event| event.contains(pattern))
    }

    pub fn count(&self, pattern: &str) -> usize {
        self.state()
            .events
            .iter()
            .filter(|event| event.contains(pattern))
            .count()
    }

    pub fn running_containers(&self) -> Vec<String> {
        self.state().containers.keys().cloned().collect()
    }

    pub fn networks(&self) -> Vec<String> {
        self.state().networks.iter().cloned().collect()
    }

    pub fn spec(&self, container: &str) -> Option<ContainerSpec> {
        self.state().containers.get(container).cloned()
    }

    fn record(&self, event: String) {
        self.state().events.push(event);
    }

    fn init_chain(&self, spec: &ContainerSpec) -> Result<ExecOutput, Error> {
        let arg = |name: &str| {
            spec.args
                .iter()
                .find_map(|a| a.strip_prefix(&format!("--{name}=")))
                .map(str::to_string)
                .ok_or_else(|| Error::generic(eyre!("missing --{} argument", name)))
        };

        let data_dir = PathBuf::from(arg("data-dir")?);
        let chain_id = arg("chain-id")?;
        let nodes: Vec<json::Value> =
            json::from_str(&arg("config")?).map_err(|e| Error::generic(e.into()))?;

        let mut initialized = Vec::new();

        for (i, node) in nodes.iter().enumerate() {
            let name = node["Name"].as_str().unwrap_or_default().to_string();
            let config_dir = data_dir.join(&name);

            fs::create_dir_all(config_dir.join("config"))?;
            fs::write(
                config_dir.join("config").join("app.toml"),
                "pruning = \"default\"\nminimum-gas-prices = \"0.002ubbn\"\n",
            )?;

            initialized.push(json::json!({
                "name": name,
                "configDir": config_dir.display().to_string(),
                "mnemonic": format!("mnemonic of {name}"),
                "publicAddress": format!("bbn1address{i}"),
                "peerId": format!("peer{i}"),
                "isValidator": node["IsValidator"].as_bool().unwrap_or_default(),
            }));
        }

        let encoded = json::json!({
            "chainMeta": { "dataDir": data_dir.display().to_string(), "id": chain_id },
            "nodes": initialized,
        });

        fs::write(
            data_dir.join(format!("{chain_id}-encode")),
            encoded.to_string(),
        )?;

        Ok(ExecOutput::new("initialized", ""))
    }

    fn answer(&self, container: &str, command: &[&str]) -> String {
        let line = command.join(" ");
        let mut state = self.state();

        if line.starts_with("babylond status") {
            let height = state.heights.entry(container.to_string()).or_insert(0);
            *height += 1;
            return json::json!({ "sync_info": { "latest_block_height": height.to_string() } })
                .to_string();
        }

        if line.starts_with("babylond tx wasm store") {
            state.code_stored = true;
            return "code: 0\ntxhash: ABCD".to_string();
        }

        if line.starts_with("babylond tx wasm instantiate") {
            state.contract_instantiated = state.code_stored;
            return "code: 0\ntxhash: EF01".to_string();
        }

        if line.starts_with("babylond query wasm list-code") {
            let infos = if state.code_stored {
                json::json!([{ "code_id": "1" }])
            } else {
                json::json!([])
            };
            return json::json!({ "code_infos": infos }).to_string();
        }

        if line.starts_with("babylond query wasm list-contract-by-code") {
            let contracts = if state.contract_instantiated {
                vec![CONTRACT_ADDRESS]
            } else {
                vec![]
            };
            return json::json!({ "contracts": contracts }).to_string();
        }

        if line.starts_with("hermes") && line.contains("health-check") {
            return "SUCCESS performed health check for all chains".to_string();
        }

        if line.starts_with("hermes") && line.contains("create channel") {
            return "SUCCESS Channel { ordering: Ordered }".to_string();
        }

        if line.starts_with("hermes --json") && line.contains("query connections") {
            return "{\"result\":[\"connection-0\"],\"status\":\"success\"}".to_string();
        }

        if line.starts_with("rly q channels") {
            return json::json!({ "port_id": "zoneconcierge", "channel_id": "channel-0" })
                .to_string();
        }

        String::new()
    }
}

impl ContainerRuntime for MockRuntime {
    fn create_network(&self, name: &str) -> Result<(), Error> {
        self.record(format!("network create {name}"));
        self.state().networks.insert(name.to_string());
        Ok(())
    }

    fn remove_network(&self, name: &str) -> Result<(), Error> {
        self.record(format!("network rm {name}"));
        self.state().networks.remove(name);
        Ok(())
    }

    fn run(&self, spec: &ContainerSpec) -> Result<ExecOutput, Error> {
        self.record(format!("run {}", spec.name));

        match spec.mode {
            RunMode::Foreground => self.init_chain(spec),
            RunMode::Detached => {
                let mut state = self.state();
                state.containers.insert(spec.name.clone(), spec.clone());

                if state.failing_starts.contains(&spec.name) {
                    return Err(Error::exec_failed(
                        format!("docker run {}", spec.name),
                        Some(125),
                        "failed to start: invalid mount config".to_string(),
                    ));
                }

                Ok(ExecOutput::new(format!("{}-id", spec.name), ""))
            }
        }
    }

    fn exec(&self, container: &str, command: &[&str]) -> Result<ExecOutput, Error> {
        self.record(format!("exec {} {}", container, command.join(" ")));

        if !self.is_running(container)? {
            return Err(Error::exec_failed(
                command.join(" "),
                Some(1),
                format!("container {container} is not running"),
            ));
        }

        Ok(ExecOutput::new(self.answer(container, command), ""))
    }

    fn is_running(&self, container: &str) -> Result<bool, Error> {
        let state = self.state();
        Ok(state.containers.contains_key(container) && !state.never_running.contains(container))
    }

    fn logs(&self, container: &str) -> Result<String, Error> {
        Ok(format!("logs of {container}"))
    }

    fn remove(&self, container: &str) -> Result<(), Error> {
        self.record(format!("remove {container}"));

        let mut state = self.state();
        if state.failing_removals.contains(container) {
            return Err(Error::exec_failed(
                format!("docker rm {container}"),
                Some(1),
                "device or resource busy".to_string(),
            ));
        }

        state.containers.remove(container);
        Ok(())
    }
}
