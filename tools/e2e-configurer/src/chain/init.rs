/*!
   Output of the chain initialization image.

   The image writes genesis, keys and per-node home directories under the
   chain data directory, and describes the result in
   `<data dir>/<chain id>-encode` as JSON.
*/

use std::fs;
use std::path::{Path, PathBuf};

use serde_derive::Deserialize;

use crate::error::{handle_generic_error, Error};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainMeta {
    pub data_dir: String,
    pub id: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializedNode {
    pub name: String,
    pub config_dir: String,
    pub mnemonic: String,
    pub public_address: String,
    #[serde(default)]
    pub peer_id: String,
    pub is_validator: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializedChain {
    pub chain_meta: ChainMeta,
    pub nodes: Vec<InitializedNode>,
}

impl InitializedChain {
    pub fn output_path(data_dir: &Path, chain_id: &str) -> PathBuf {
        data_dir.join(format!("{chain_id}-encode"))
    }

    pub fn read(data_dir: &Path, chain_id: &str) -> Result<Self, Error> {
        let content = fs::read_to_string(Self::output_path(data_dir, chain_id))?;

        serde_json::from_str(&content).map_err(handle_generic_error)
    }

    pub fn node(&self, name: &str) -> Option<&InitializedNode> {
        self.nodes.iter().find(|node| node.name == name)
    }
}
