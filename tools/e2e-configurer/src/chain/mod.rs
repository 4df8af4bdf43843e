/*!
   Chains of a scenario: their configuration, nodes, and the commands
   run against them.
*/

pub mod app_config;
pub mod cli;
pub mod config;
pub mod exec;
pub mod init;
pub mod node;
