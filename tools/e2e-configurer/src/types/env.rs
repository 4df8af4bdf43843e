/*!
   Exporting a scenario as a shell environment file.

   After setup, the configurer writes the containers, directories and IBC
   identifiers of a scenario to `scenario.env`. Sourcing it gives shell
   access to the scenario while it is kept alive with `E2E_SKIP_CLEANUP`.
*/

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use itertools::Itertools;

use crate::error::Error;

/**
   Implemented by the parts of a scenario that describe themselves as
   environment variables.
*/
pub trait ExportEnv {
    fn export_env(&self, writer: &mut impl EnvWriter);
}

pub trait EnvWriter {
    /// Later writes to the same key override earlier ones.
    fn write_env(&mut self, key: &str, value: &str);
}

/**
   Scope every key written through the returned writer under `prefix`,
   as in `CHAIN_0_NODE_1_CONTAINER`.
*/
pub fn prefix_writer<'a, Writer: EnvWriter>(
    prefix: &str,
    writer: &'a mut Writer,
) -> impl EnvWriter + 'a {
    Prefixed {
        prefix: prefix.to_string(),
        writer,
    }
}

struct Prefixed<'a, Writer> {
    prefix: String,
    writer: &'a mut Writer,
}

impl<'a, Writer: EnvWriter> EnvWriter for Prefixed<'a, Writer> {
    fn write_env(&mut self, key: &str, value: &str) {
        self.writer
            .write_env(&format!("{}_{}", self.prefix, key), value);
    }
}

/// Variables collected in key order, rendered as `export` lines.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnvFile {
    vars: BTreeMap<String, String>,
}

impl EnvFile {
    pub fn collect(exporter: &impl ExportEnv) -> Self {
        let mut file = Self::default();
        exporter.export_env(&mut file);
        file
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn render(&self) -> String {
        self.vars
            .iter()
            .map(|(key, value)| format!("export {}={}", key, shell_quote(value)))
            .join("\n")
    }
}

impl EnvWriter for EnvFile {
    fn write_env(&mut self, key: &str, value: &str) {
        let key = key.to_ascii_uppercase().replace(['-', '.'], "_");
        self.vars.insert(key, value.to_string());
    }
}

/// Save the variables exported by `exporter` to a sourceable file.
pub fn write_env(path: impl AsRef<Path>, exporter: &impl ExportEnv) -> Result<(), Error> {
    let mut content = EnvFile::collect(exporter).render();
    content.push('\n');

    fs::write(path, content)?;

    Ok(())
}

fn shell_quote(value: &str) -> String {
    let plain = !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':'));

    if plain {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', r"'\''"))
    }
}
