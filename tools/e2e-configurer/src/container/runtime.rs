/*!
   The seam between the configurer and the container engine.

   Everything the configurer does to processes goes through
   [`ContainerRuntime`], so that scenarios can be driven against a real
   engine through [`DockerCli`] or against a recording implementation in
   tests.
*/

use core::fmt::Debug;
use std::path::PathBuf;
use tracing::debug;

use crate::chain::exec::{simple_exec, ExecOutput};
use crate::error::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Block until the container exits, then remove it.
    Foreground,
    /// Start the container in the background and keep it.
    Detached,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mount {
    pub source: PathBuf,
    pub target: String,
    pub read_only: bool,
}

impl Mount {
    pub fn new(source: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            read_only: false,
        }
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    fn as_volume_arg(&self) -> String {
        let mut arg = format!("{}:{}", self.source.display(), self.target);
        if self.read_only {
            arg.push_str(":ro");
        }
        arg
    }
}

/**
   Everything needed to start one container.
*/
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContainerSpec {
    pub name: String,
    pub image: String,
    pub mode: RunMode,
    pub network: Option<String>,
    pub user: Option<String>,
    pub mounts: Vec<Mount>,
    pub env: Vec<(String, String)>,
    pub entrypoint: Option<String>,
    pub args: Vec<String>,
}

impl ContainerSpec {
    pub fn new(name: impl Into<String>, image: impl Into<String>, mode: RunMode) -> Self {
        Self {
            name: name.into(),
            image: image.into(),
            mode,
            network: None,
            user: None,
            mounts: Vec::new(),
            env: Vec::new(),
            entrypoint: None,
            args: Vec::new(),
        }
    }

    pub fn network(mut self, network: &str) -> Self {
        self.network = Some(network.to_string());
        self
    }

    pub fn user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn mount(mut self, mount: Mount) -> Self {
        self.mounts.push(mount);
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    pub fn entrypoint(mut self, entrypoint: &str) -> Self {
        self.entrypoint = Some(entrypoint.to_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Arguments of `docker run` that start this container.
    pub fn docker_run_args(&self) -> Vec<String> {
        let mut res = vec!["run".to_string()];

        match self.mode {
            RunMode::Foreground => res.push("--rm".to_string()),
            RunMode::Detached => res.push("--detach".to_string()),
        }

        res.push("--name".to_string());
        res.push(self.name.clone());

        if let Some(network) = &self.network {
            res.push("--network".to_string());
            res.push(network.clone());
        }

        if let Some(user) = &self.user {
            res.push("--user".to_string());
            res.push(user.clone());
        }

        for mount in &self.mounts {
            res.push("--volume".to_string());
            res.push(mount.as_volume_arg());
        }

        for (key, value) in &self.env {
            res.push("--env".to_string());
            res.push(format!("{key}={value}"));
        }

        if let Some(entrypoint) = &self.entrypoint {
            res.push("--entrypoint".to_string());
            res.push(entrypoint.clone());
        }

        res.push(self.image.clone());
        res.extend(self.args.iter().cloned());

        res
    }
}

/**
   Isolated process lifecycle, keyed by container name.
*/
pub trait ContainerRuntime: Debug + Send + Sync {
    fn create_network(&self, name: &str) -> Result<(), Error>;

    fn remove_network(&self, name: &str) -> Result<(), Error>;

    /**
       Start a container. In [`RunMode::Foreground`] this returns once the
       container has exited successfully.
    */
    fn run(&self, spec: &ContainerSpec) -> Result<ExecOutput, Error>;

    /// Execute a command inside a running container.
    fn exec(&self, container: &str, command: &[&str]) -> Result<ExecOutput, Error>;

    fn is_running(&self, container: &str) -> Result<bool, Error>;

    fn logs(&self, container: &str) -> Result<String, Error>;

    /// Stop and remove a container.
    fn remove(&self, container: &str) -> Result<(), Error>;
}

/**
   [`ContainerRuntime`] backed by the `docker` command line.
*/
#[derive(Clone, Debug)]
pub struct DockerCli {
    pub command_path: String,
}

impl DockerCli {
    pub fn new(command_path: &str) -> Self {
        Self {
            command_path: command_path.to_string(),
        }
    }

    fn docker(&self, desc: &str, args: &[&str]) -> Result<ExecOutput, Error> {
        simple_exec(desc, &self.command_path, args)
    }
}

impl Default for DockerCli {
    fn default() -> Self {
        Self::new("docker")
    }
}

impl ContainerRuntime for DockerCli {
    fn create_network(&self, name: &str) -> Result<(), Error> {
        self.docker(name, &["network", "create", name])?;
        Ok(())
    }

    fn remove_network(&self, name: &str) -> Result<(), Error> {
        self.docker(name, &["network", "rm", name])?;
        Ok(())
    }

    fn run(&self, spec: &ContainerSpec) -> Result<ExecOutput, Error> {
        debug!("starting container {} from image {}", spec.name, spec.image);

        let args = spec.docker_run_args();
        let args = args.iter().map(String::as_str).collect::<Vec<_>>();

        self.docker(&spec.name, &args)
    }

    fn exec(&self, container: &str, command: &[&str]) -> Result<ExecOutput, Error> {
        let mut args = vec!["exec", container];
        args.extend_from_slice(command);

        self.docker(container, &args)
    }

    fn is_running(&self, container: &str) -> Result<bool, Error> {
        let output = self.docker(
            container,
            &["inspect", "--format", "{{.State.Running}}", container],
        )?;

        Ok(output.stdout.trim() == "true")
    }

    fn logs(&self, container: &str) -> Result<String, Error> {
        let output = self.docker(container, &["logs", container])?;

        Ok(format!("{}{}", output.stdout, output.stderr))
    }

    fn remove(&self, container: &str) -> Result<(), Error> {
        self.docker(container, &["rm", "--force", "--volumes", container])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn detached_run_arguments() {
        let spec = ContainerSpec::new("node-a-1", "babylonchain/babylond:latest", RunMode::Detached)
            .network("bbn-testnet-x")
            .user("root:root")
            .mount(Mount::new("/tmp/a", "/home/babylon/babylondata"))
            .mount(Mount::new("/tmp/bytecode", "/bytecode").read_only())
            .env("BABYLON_BLS_PASSWORD", "password")
            .entrypoint("sh")
            .args(["-c", "babylond start"]);

        assert_eq!(
            spec.docker_run_args(),
            vec![
                "run",
                "--detach",
                "--name",
                "node-a-1",
                "--network",
                "bbn-testnet-x",
                "--user",
                "root:root",
                "--volume",
                "/tmp/a:/home/babylon/babylondata",
                "--volume",
                "/tmp/bytecode:/bytecode:ro",
                "--env",
                "BABYLON_BLS_PASSWORD=password",
                "--entrypoint",
                "sh",
                "babylonchain/babylond:latest",
                "-c",
                "babylond start",
            ]
        );
    }

    #[test]
    fn foreground_runs_are_removed_on_exit() {
        let spec = ContainerSpec::new("init", "img", RunMode::Foreground).args(["--flag"]);

        assert_eq!(
            spec.docker_run_args(),
            vec!["run", "--rm", "--name", "init", "img", "--flag"]
        );
    }
}
