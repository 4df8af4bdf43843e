/*!
   The Go relayer (`rly`).

   Everything the relayer does is scripted into its container: it adds
   both chains, restores the relayer keys from the mnemonics passed in
   the environment, links a path between the configured channel ends and
   starts relaying.
*/

use std::fs;
use std::path::Path;

use serde_derive::Serialize;
use tracing::info;

use super::{RelayerEndpoint, ACCOUNT_PREFIX, FEE_DENOM, RELAYER_KEY};
use crate::container::manager::{ContainerManager, RLY_HOME};
use crate::error::{handle_generic_error, Error};

pub const PATH_NAME: &str = "bbn-path";

const MNEMONIC_A_ENV: &str = "RLY_MNEMONIC_A";
const MNEMONIC_B_ENV: &str = "RLY_MNEMONIC_B";

/// Chain definition as accepted by `rly chains add --file`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RlyChainFile {
    #[serde(rename = "type")]
    pub chain_type: String,
    pub value: RlyChainValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RlyChainValue {
    pub key: String,
    pub chain_id: String,
    pub rpc_addr: String,
    pub account_prefix: String,
    pub keyring_backend: String,
    pub gas_adjustment: f64,
    pub gas_prices: String,
    pub min_gas_amount: u64,
    pub debug: bool,
    pub timeout: String,
    pub output_format: String,
    pub sign_mode: String,
}

impl RlyChainFile {
    pub fn new(endpoint: &RelayerEndpoint) -> Self {
        Self {
            chain_type: "cosmos".to_string(),
            value: RlyChainValue {
                key: RELAYER_KEY.to_string(),
                chain_id: endpoint.chain_id.clone(),
                rpc_addr: endpoint.rpc_address(),
                account_prefix: ACCOUNT_PREFIX.to_string(),
                keyring_backend: "test".to_string(),
                gas_adjustment: 1.5,
                gas_prices: format!("0.002{FEE_DENOM}"),
                min_gas_amount: 1,
                debug: true,
                timeout: "20s".to_string(),
                output_format: "json".to_string(),
                sign_mode: "direct".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub struct GoRelayer {
    pub container: String,
    pub chain_a: RelayerEndpoint,
    pub chain_b: RelayerEndpoint,
}

impl GoRelayer {
    /**
       Write the chain files under `rly_dir`, start the relayer container
       and wait until the channel of chain A's port shows up.
    */
    pub fn start(
        manager: &ContainerManager,
        rly_dir: &Path,
        chain_a: RelayerEndpoint,
        chain_b: RelayerEndpoint,
    ) -> Result<Self, Error> {
        fs::create_dir_all(rly_dir)?;

        for endpoint in [&chain_a, &chain_b] {
            let content = serde_json::to_string_pretty(&RlyChainFile::new(endpoint))
                .map_err(handle_generic_error)?;
            fs::write(rly_dir.join(chain_file_name(&endpoint.chain_id)), content)?;
        }

        let script = startup_script(&chain_a, &chain_b);
        let env = [
            (MNEMONIC_A_ENV, chain_a.mnemonic.as_str()),
            (MNEMONIC_B_ENV, chain_b.mnemonic.as_str()),
        ];

        let container = manager.run_rly_resource(rly_dir, &script, &env)?;
        manager.wait_until_running(&container)?;

        let relayer = Self {
            container,
            chain_a,
            chain_b,
        };

        relayer.wait_for_channel(manager)?;

        Ok(relayer)
    }

    fn wait_for_channel(&self, manager: &ContainerManager) -> Result<(), Error> {
        let command = [
            "rly",
            "q",
            "channels",
            self.chain_a.chain_id.as_str(),
            "--home",
            RLY_HOME,
        ];

        manager.exec_cmd(
            &self.container,
            &command,
            self.chain_a.channel.port_id.as_str(),
        )?;

        info!(
            "go relayer {} opened a channel on port {}",
            self.container, self.chain_a.channel.port_id
        );

        Ok(())
    }
}

fn chain_file_name(chain_id: &str) -> String {
    format!("{chain_id}.json")
}

fn startup_script(chain_a: &RelayerEndpoint, chain_b: &RelayerEndpoint) -> String {
    let home = format!("--home {RLY_HOME}");
    let files = format!("{RLY_HOME}/config-files");
    let (a, b) = (&chain_a.channel, &chain_b.channel);

    [
        format!("rly config init {home}"),
        format!(
            "rly chains add --file {files}/{} {} {home}",
            chain_file_name(&chain_a.chain_id),
            chain_a.chain_id
        ),
        format!(
            "rly chains add --file {files}/{} {} {home}",
            chain_file_name(&chain_b.chain_id),
            chain_b.chain_id
        ),
        format!(
            "rly keys restore {} {RELAYER_KEY} \"${MNEMONIC_A_ENV}\" {home}",
            chain_a.chain_id
        ),
        format!(
            "rly keys restore {} {RELAYER_KEY} \"${MNEMONIC_B_ENV}\" {home}",
            chain_b.chain_id
        ),
        format!(
            "rly paths new {} {} {PATH_NAME} {home}",
            chain_a.chain_id, chain_b.chain_id
        ),
        format!(
            "rly tx link {PATH_NAME} --src-port {} --dst-port {} --order {} --version {} {home}",
            a.port_id,
            b.port_id,
            a.ordering_flag(),
            a.version
        ),
        format!("rly start {PATH_NAME} {home}"),
    ]
    .join(" && ")
}

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json as json;
    use test_log::test;

    use crate::types::channel::ChannelConfig;

    fn endpoint(chain_id: &str, port: Option<&str>) -> RelayerEndpoint {
        let mut channel = ChannelConfig::zoneconcierge().unwrap();
        if let Some(address) = port {
            channel.set_contract_port(address).unwrap();
        }

        RelayerEndpoint {
            chain_id: chain_id.to_string(),
            node: format!("{chain_id}-node"),
            mnemonic: "mnemonic".to_string(),
            channel,
        }
    }

    #[test]
    fn chain_file_uses_kebab_case_keys() {
        let file = json::to_value(RlyChainFile::new(&endpoint("chain-A", None))).unwrap();

        assert_eq!(file["type"], "cosmos");
        assert_eq!(file["value"]["chain-id"], "chain-A");
        assert_eq!(file["value"]["rpc-addr"], "http://chain-A-node:26657");
        assert_eq!(file["value"]["account-prefix"], "bbn");
    }

    #[test]
    fn script_links_the_configured_ports() {
        let script = startup_script(
            &endpoint("chain-A", None),
            &endpoint("chain-B", Some("bbn1contract")),
        );

        assert!(script.contains(
            "rly tx link bbn-path --src-port zoneconcierge --dst-port wasm.bbn1contract --order ordered --version zoneconcierge-1"
        ));
        assert!(script.contains("\"$RLY_MNEMONIC_B\""));
        assert!(!script.contains("mnemonic "));
    }
}
