/*!
   Process isolation for scenarios: the container engine seam and the
   per-scenario manager built on top of it.
*/

pub mod manager;
pub mod runtime;

pub use manager::{ContainerManager, ContainerRole, TeardownFailure, TeardownReport};
pub use runtime::{ContainerRuntime, ContainerSpec, DockerCli, Mount, RunMode};
