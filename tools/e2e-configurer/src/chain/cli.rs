/*!
   `babylond` commands executed inside node containers.
*/

use eyre::eyre;
use serde_json as json;

use crate::chain::exec::ExecOutput;
use crate::container::manager::{ContainerManager, NODE_HOME};
use crate::error::{handle_generic_error, Error};

/// Marker printed by the CLI for a transaction accepted by the mempool.
const TX_SUCCESS: &str = "code: 0";

const GAS_PRICES: &str = "--gas-prices=1ubbn";

/// Appends the flags every transaction submitted from a node needs.
fn tx_command(chain_id: &str, args: &[&str]) -> Vec<String> {
    let mut command: Vec<String> = vec!["babylond".to_string(), "tx".to_string()];
    command.extend(args.iter().map(|s| s.to_string()));
    command.extend([
        format!("--chain-id={chain_id}"),
        format!("--home={NODE_HOME}"),
        "--keyring-backend=test".to_string(),
        "--broadcast-mode=sync".to_string(),
        "--yes".to_string(),
    ]);
    command
}

fn query_command(args: &[&str]) -> Vec<String> {
    let mut command: Vec<String> = vec!["babylond".to_string(), "query".to_string()];
    command.extend(args.iter().map(|s| s.to_string()));
    command.extend([format!("--home={NODE_HOME}"), "--output=json".to_string()]);
    command
}

fn exec_strings(
    manager: &ContainerManager,
    container: &str,
    command: &[String],
    success: &str,
) -> Result<ExecOutput, Error> {
    let command = command.iter().map(String::as_str).collect::<Vec<_>>();
    manager.exec_cmd(container, &command, success)
}

fn parse_json(output: &ExecOutput) -> Result<json::Value, Error> {
    // some CometBFT versions print query results to stderr
    let raw = if output.stdout.trim().is_empty() {
        &output.stderr
    } else {
        &output.stdout
    };

    json::from_str(raw.trim()).map_err(handle_generic_error)
}

fn json_u64(value: &json::Value) -> Option<u64> {
    match value {
        json::Value::String(s) => s.parse().ok(),
        json::Value::Number(n) => n.as_u64(),
        _ => None,
    }
}

/// Latest block height reported by the node.
pub fn query_latest_height(manager: &ContainerManager, container: &str) -> Result<u64, Error> {
    let output = manager.exec(container, &["babylond", "status", "--home", NODE_HOME])?;
    parse_latest_height(&parse_json(&output)?)
}

pub fn parse_latest_height(status: &json::Value) -> Result<u64, Error> {
    let sync_info = status
        .get("sync_info")
        .or_else(|| status.get("SyncInfo"))
        .ok_or_else(|| eyre!("expect sync_info field in status"))?;

    let height = sync_info
        .get("latest_block_height")
        .and_then(json_u64)
        .ok_or_else(|| eyre!("expect latest_block_height in sync_info"))?;

    Ok(height)
}

pub fn store_wasm_code(
    manager: &ContainerManager,
    container: &str,
    chain_id: &str,
    wasm_file: &str,
    from: &str,
) -> Result<(), Error> {
    let command = tx_command(
        chain_id,
        &[
            "wasm",
            "store",
            wasm_file,
            &format!("--from={from}"),
            "--gas=auto",
            GAS_PRICES,
            "--gas-adjustment=1.3",
        ],
    );

    exec_strings(manager, container, &command, TX_SUCCESS)?;

    Ok(())
}

pub fn instantiate_wasm_contract(
    manager: &ContainerManager,
    container: &str,
    chain_id: &str,
    code_id: u64,
    init_msg: &str,
    from: &str,
) -> Result<(), Error> {
    let command = tx_command(
        chain_id,
        &[
            "wasm",
            "instantiate",
            &code_id.to_string(),
            init_msg,
            &format!("--from={from}"),
            "--no-admin",
            "--label=contract",
            "--gas=auto",
            GAS_PRICES,
            "--gas-adjustment=1.3",
        ],
    );

    exec_strings(manager, container, &command, TX_SUCCESS)?;

    Ok(())
}

pub fn query_latest_wasm_code_id(manager: &ContainerManager, container: &str) -> Result<u64, Error> {
    let command = query_command(&["wasm", "list-code"]);
    let output = exec_strings(manager, container, &command, "")?;

    parse_json(&output)?
        .get("code_infos")
        .and_then(|infos| infos.as_array())
        .and_then(|infos| infos.last())
        .and_then(|info| info.get("code_id"))
        .and_then(json_u64)
        .ok_or_else(|| Error::generic(eyre!("no wasm code has been stored")))
}

pub fn query_contracts_from_code_id(
    manager: &ContainerManager,
    container: &str,
    code_id: u64,
) -> Result<Vec<String>, Error> {
    let command = query_command(&["wasm", "list-contract-by-code", &code_id.to_string()]);
    let output = exec_strings(manager, container, &command, "")?;

    let contracts = parse_json(&output)?
        .get("contracts")
        .and_then(|contracts| contracts.as_array())
        .map(|contracts| {
            contracts
                .iter()
                .filter_map(|c| c.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();

    Ok(contracts)
}
