/*!
   The Hermes relayer.

   The relayer config is generated from the relayer endpoints and mounted
   into the Hermes container, which imports the relayer keys and then
   runs `hermes start`. Channels are created by executing the Hermes CLI
   inside the running container.
*/

use core::str::FromStr;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::eyre;
use ibc_relayer_types::core::ics24_host::identifier::ConnectionId;
use serde_derive::Serialize;
use serde_json as json;
use tracing::info;

use super::{RelayerEndpoint, ACCOUNT_PREFIX, FEE_DENOM, RELAYER_KEY};
use crate::container::manager::{ContainerManager, HERMES_HOME};
use crate::error::{handle_generic_error, Error};
use crate::types::channel::ChannelConfig;

const SUCCESS: &str = "SUCCESS";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HermesConfig {
    pub global: GlobalConfig,
    pub mode: ModeConfig,
    pub rest: ServiceConfig,
    pub telemetry: ServiceConfig,
    pub chains: Vec<HermesChainConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalConfig {
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModeConfig {
    pub clients: Toggle,
    pub connections: Toggle,
    pub channels: Toggle,
    pub packets: PacketsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Toggle {
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PacketsConfig {
    pub enabled: bool,
    pub clear_interval: u64,
    pub clear_on_start: bool,
    pub tx_confirmation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HermesChainConfig {
    pub id: String,
    #[serde(rename = "type")]
    pub chain_type: String,
    pub rpc_addr: String,
    pub grpc_addr: String,
    pub event_source: EventSource,
    pub rpc_timeout: String,
    pub account_prefix: String,
    pub key_name: String,
    pub store_prefix: String,
    pub max_gas: u64,
    pub gas_price: GasPrice,
    pub gas_multiplier: f64,
    pub clock_drift: String,
    pub trusting_period: String,
    pub trust_threshold: TrustThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventSource {
    pub mode: String,
    pub url: String,
    pub batch_delay: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GasPrice {
    pub price: f64,
    pub denom: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrustThreshold {
    pub numerator: String,
    pub denominator: String,
}

impl HermesConfig {
    pub fn new(endpoints: &[&RelayerEndpoint]) -> Self {
        Self {
            global: GlobalConfig {
                log_level: "info".to_string(),
            },
            mode: ModeConfig {
                clients: Toggle { enabled: true },
                connections: Toggle { enabled: false },
                channels: Toggle { enabled: false },
                packets: PacketsConfig {
                    enabled: true,
                    clear_interval: 100,
                    clear_on_start: true,
                    tx_confirmation: true,
                },
            },
            rest: ServiceConfig {
                enabled: true,
                host: "0.0.0.0".to_string(),
                port: 3031,
            },
            telemetry: ServiceConfig {
                enabled: true,
                host: "0.0.0.0".to_string(),
                port: 3001,
            },
            chains: endpoints
                .iter()
                .map(|endpoint| HermesChainConfig::new(endpoint))
                .collect(),
        }
    }
}

impl HermesChainConfig {
    pub fn new(endpoint: &RelayerEndpoint) -> Self {
        Self {
            id: endpoint.chain_id.clone(),
            chain_type: "CosmosSdk".to_string(),
            rpc_addr: endpoint.rpc_address(),
            grpc_addr: endpoint.grpc_address(),
            event_source: EventSource {
                mode: "push".to_string(),
                url: endpoint.websocket_address(),
                batch_delay: "500ms".to_string(),
            },
            rpc_timeout: "10s".to_string(),
            account_prefix: ACCOUNT_PREFIX.to_string(),
            key_name: RELAYER_KEY.to_string(),
            store_prefix: "ibc".to_string(),
            max_gas: 3_000_000,
            gas_price: GasPrice {
                price: 1.0,
                denom: FEE_DENOM.to_string(),
            },
            gas_multiplier: 1.5,
            clock_drift: "1m".to_string(),
            trusting_period: "14days".to_string(),
            trust_threshold: TrustThreshold {
                numerator: "1".to_string(),
                denominator: "3".to_string(),
            },
        }
    }
}

/**
   A running Hermes relayer between chain A and chain B.
*/
#[derive(Debug, Clone)]
pub struct HermesRelayer {
    pub container: String,
    pub chain_a: RelayerEndpoint,
    pub chain_b: RelayerEndpoint,
}

impl HermesRelayer {
    /**
       Write the relayer config and key files under `hermes_dir`, start
       the Hermes container and wait until it reports healthy.
    */
    pub fn start(
        manager: &ContainerManager,
        hermes_dir: &Path,
        chain_a: RelayerEndpoint,
        chain_b: RelayerEndpoint,
    ) -> Result<Self, Error> {
        fs::create_dir_all(hermes_dir)?;

        let config = HermesConfig::new(&[&chain_a, &chain_b]);
        save_hermes_config(&config, &hermes_dir.join("config.toml"))?;

        for endpoint in [&chain_a, &chain_b] {
            fs::write(mnemonic_file(hermes_dir, &endpoint.chain_id), &endpoint.mnemonic)?;
        }

        let container = manager.run_hermes_resource(hermes_dir, &startup_script(&chain_a, &chain_b))?;
        manager.wait_until_running(&container)?;

        let relayer = Self {
            container,
            chain_a,
            chain_b,
        };

        relayer.exec(manager, &["health-check"], SUCCESS)?;

        info!("hermes relayer {} is healthy", relayer.container);

        Ok(relayer)
    }

    fn exec(&self, manager: &ContainerManager, args: &[&str], success: &str) -> Result<String, Error> {
        let config_path = format!("{HERMES_HOME}/config.toml");

        let mut command = vec!["hermes", "--config", config_path.as_str()];
        command.extend_from_slice(args);

        let output = manager.exec_cmd(&self.container, &command, success)?;

        Ok(output.stdout)
    }

    /**
       Create a channel with a new client and connection between the
       configured channel ends of chain A and chain B, and return the
       connection it is built on.
    */
    pub fn create_channel(&self, manager: &ContainerManager) -> Result<ConnectionId, Error> {
        let (a, b) = (&self.chain_a.channel, &self.chain_b.channel);
        let version = a.version.to_string();

        info!(
            "creating channel {}:{} <-> {}:{}",
            self.chain_a.chain_id, a.port_id, self.chain_b.chain_id, b.port_id
        );

        self.exec(
            manager,
            &[
                "create",
                "channel",
                "--a-chain",
                &self.chain_a.chain_id,
                "--b-chain",
                &self.chain_b.chain_id,
                "--a-port",
                a.port_id.as_str(),
                "--b-port",
                b.port_id.as_str(),
                "--order",
                a.ordering_flag(),
                "--channel-version",
                &version,
                "--new-client-connection",
                "--yes",
            ],
            SUCCESS,
        )?;

        self.query_connection(manager)
    }

    /// Create an ICS-20 transfer channel on top of an existing connection.
    pub fn create_transfer_channel(
        &self,
        manager: &ContainerManager,
        connection_id: &ConnectionId,
    ) -> Result<(), Error> {
        let transfer = ChannelConfig::transfer();
        let version = transfer.version.to_string();

        info!(
            "creating transfer channel on {} of chain {}",
            connection_id, self.chain_a.chain_id
        );

        self.exec(
            manager,
            &[
                "create",
                "channel",
                "--a-chain",
                &self.chain_a.chain_id,
                "--a-connection",
                connection_id.as_str(),
                "--a-port",
                transfer.port_id.as_str(),
                "--b-port",
                transfer.port_id.as_str(),
                "--order",
                transfer.ordering_flag(),
                "--channel-version",
                &version,
                "--yes",
            ],
            SUCCESS,
        )?;

        Ok(())
    }

    /// The most recent connection of chain A, by connection sequence.
    pub fn query_connection(&self, manager: &ContainerManager) -> Result<ConnectionId, Error> {
        let config_path = format!("{HERMES_HOME}/config.toml");
        let command = [
            "hermes",
            "--json",
            "--config",
            config_path.as_str(),
            "query",
            "connections",
            "--chain",
            self.chain_a.chain_id.as_str(),
        ];

        let output = manager.exec_cmd(&self.container, &command, "")?;

        latest_connection(parse_connection_ids(&output.stdout)?)
            .ok_or_else(|| Error::connection_not_established(self.chain_a.chain_id.clone()))
    }
}

pub fn save_hermes_config(config: &HermesConfig, config_path: &Path) -> Result<(), Error> {
    let config_str = toml::to_string_pretty(config).map_err(handle_generic_error)?;

    fs::write(config_path, &config_str)?;

    info!(
        "written hermes config.toml to {}:\n{}",
        config_path.display(),
        config_str
    );

    Ok(())
}

fn mnemonic_file(dir: &Path, chain_id: &str) -> PathBuf {
    dir.join(format!("{chain_id}.mnemonic"))
}

fn startup_script(chain_a: &RelayerEndpoint, chain_b: &RelayerEndpoint) -> String {
    let config_path = format!("{HERMES_HOME}/config.toml");

    let add_keys = [chain_a, chain_b].map(|endpoint| {
        format!(
            "hermes --config {config_path} keys add --chain {chain} --key-name {RELAYER_KEY} --mnemonic-file {HERMES_HOME}/{chain}.mnemonic --overwrite",
            chain = endpoint.chain_id,
        )
    });

    format!(
        "{} && {} && hermes --config {config_path} start",
        add_keys[0], add_keys[1]
    )
}

/**
   The connection with the highest sequence. Hermes lists connections in
   lexicographic order, where `connection-10` comes before `connection-2`.
*/
pub fn latest_connection(ids: Vec<ConnectionId>) -> Option<ConnectionId> {
    ids.into_iter().max_by_key(connection_sequence)
}

fn connection_sequence(id: &ConnectionId) -> u64 {
    id.as_str()
        .rsplit('-')
        .next()
        .and_then(|sequence| sequence.parse().ok())
        .unwrap_or_default()
}

/**
   Extract the connection ids from the JSON output of
   `hermes --json query connections`.

   Hermes prints log lines before the result, so only the last line
   carrying a `result` is considered.
*/
pub fn parse_connection_ids(output: &str) -> Result<Vec<ConnectionId>, Error> {
    let result = output
        .lines()
        .rev()
        .filter_map(|line| json::from_str::<json::Value>(line.trim()).ok())
        .find_map(|value| value.get("result").cloned())
        .ok_or_else(|| eyre!("no result in hermes output: {}", output))?;

    let entries = result
        .as_array()
        .ok_or_else(|| eyre!("expect hermes result to be a list"))?;

    entries
        .iter()
        .filter_map(|entry| {
            entry
                .as_str()
                .or_else(|| entry.get("connection_id").and_then(|id| id.as_str()))
        })
        .map(|id| {
            ConnectionId::from_str(id)
                .map_err(|e| Error::generic(eyre!("invalid connection id '{}': {}", id, e)))
        })
        .collect()
}
