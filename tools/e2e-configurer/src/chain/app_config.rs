/*!
    Helper functions for modifying the node's `app.toml` config.

    Since we do not need to understand the full structure of the
    Cosmos SDK config, we are updating the config as dynamic TOML
    values instead of serializing them into proper types.
*/

use eyre::{eyre, Report as Error};
use toml::Value;

use crate::types::topology::{NodeConfig, PruningStrategy};

/// Set the top-level `pruning` field.
pub fn set_pruning(config: &mut Value, strategy: PruningStrategy) -> Result<(), Error> {
    config
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?
        .insert("pruning".to_string(), strategy.as_str().into());

    Ok(())
}

/// Set the `pruning-keep-recent` and `pruning-interval` fields.
pub fn set_custom_pruning(config: &mut Value, keep_recent: u64, interval: u64) -> Result<(), Error> {
    let table = config
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?;

    table.insert(
        "pruning-keep-recent".to_string(),
        keep_recent.to_string().into(),
    );
    table.insert("pruning-interval".to_string(), interval.to_string().into());

    Ok(())
}

/// Set the `state-sync.snapshot-interval` field.
pub fn set_snapshot_interval(config: &mut Value, interval: u64) -> Result<(), Error> {
    state_sync_section(config)?.insert(
        "snapshot-interval".to_string(),
        Value::Integer(to_toml_integer(interval)?),
    );

    Ok(())
}

/// Set the `state-sync.snapshot-keep-recent` field.
pub fn set_snapshot_keep_recent(config: &mut Value, keep_recent: u32) -> Result<(), Error> {
    state_sync_section(config)?.insert(
        "snapshot-keep-recent".to_string(),
        Value::Integer(i64::from(keep_recent)),
    );

    Ok(())
}

/// Apply the persistence policy of a node to its `app.toml`.
pub fn apply_node_config(config: &mut Value, node: &NodeConfig) -> Result<(), Error> {
    set_pruning(config, node.pruning)?;
    set_custom_pruning(config, node.pruning_keep_recent, node.pruning_interval)?;
    set_snapshot_interval(config, node.snapshot_interval)?;
    set_snapshot_keep_recent(config, node.snapshot_keep_recent)?;

    if node.pruning == PruningStrategy::Custom && node.pruning_interval == 0 {
        return Err(eyre!(
            "node {} uses custom pruning with a zero pruning interval",
            node.name
        ));
    }

    Ok(())
}

fn state_sync_section(config: &mut Value) -> Result<&mut toml::map::Map<String, Value>, Error> {
    let table = config
        .as_table_mut()
        .ok_or_else(|| eyre!("expect object"))?;

    table
        .entry("state-sync")
        .or_insert(Value::Table(Default::default()))
        .as_table_mut()
        .ok_or_else(|| eyre!("expect state-sync section to be a table"))
}

fn to_toml_integer(value: u64) -> Result<i64, Error> {
    i64::try_from(value).map_err(|_| eyre!("value {} does not fit a TOML integer", value))
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    const APP_TOML: &str = r#"
pruning = "everything"
pruning-keep-recent = "100"
pruning-interval = "10"
minimum-gas-prices = "0.002ubbn"

[state-sync]
snapshot-interval = 0
snapshot-keep-recent = 2
"#;

    fn node(pruning: PruningStrategy, interval: u64) -> NodeConfig {
        NodeConfig {
            name: "babylon-default-a-1".to_string(),
            pruning,
            pruning_keep_recent: 0,
            pruning_interval: interval,
            snapshot_interval: 25,
            snapshot_keep_recent: 10,
            is_validator: true,
        }
    }

    #[test]
    fn node_policy_overrides_app_config() {
        let mut config: Value = toml::from_str(APP_TOML).unwrap();

        apply_node_config(&mut config, &node(PruningStrategy::Default, 0)).unwrap();

        assert_eq!(config["pruning"].as_str(), Some("default"));
        assert_eq!(config["pruning-keep-recent"].as_str(), Some("0"));
        assert_eq!(config["pruning-interval"].as_str(), Some("0"));
        assert_eq!(config["state-sync"]["snapshot-interval"].as_integer(), Some(25));
        assert_eq!(config["state-sync"]["snapshot-keep-recent"].as_integer(), Some(10));
        assert_eq!(config["minimum-gas-prices"].as_str(), Some("0.002ubbn"));
    }

    #[test]
    fn missing_state_sync_section_is_created() {
        let mut config: Value = toml::from_str("pruning = \"nothing\"").unwrap();

        set_snapshot_interval(&mut config, 1500).unwrap();

        assert_eq!(config["state-sync"]["snapshot-interval"].as_integer(), Some(1500));
    }

    #[test]
    fn custom_pruning_needs_an_interval() {
        let mut config: Value = toml::from_str(APP_TOML).unwrap();

        assert!(apply_node_config(&mut config, &node(PruningStrategy::Custom, 0)).is_err());
        assert!(apply_node_config(&mut config, &node(PruningStrategy::Custom, 10)).is_ok());
    }
}
