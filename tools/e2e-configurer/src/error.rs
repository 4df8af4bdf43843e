use eyre::Report;
use flex_error::{define_error, TraceError};
use std::io::{Error as IoError, ErrorKind as IoErrorKind};

define_error! {
    Error {
        Generic
            [ TraceError<Report> ]
            | _ | { "generic error" },

        Io
            [ TraceError<IoError> ]
            | _ | { "io error"},

        CommandNotFound
            { command: String }
            [ TraceError<IoError> ]
            | e | { format_args!("failed to execute command: {}. make sure it is available in $PATH", e.command) },

        ExecFailed
            {
                command: String,
                status: Option<i32>,
                message: String,
            }
            | e | {
                format_args!("command `{}` exited with error status {:?} and message: {}",
                    e.command, e.status, e.message)
            },

        InvalidIdentifier
            { identifier: String }
            | e | {
                format_args!("invalid scenario identifier '{}': expected lowercase alphanumerics, '-', '_' or '.'",
                    e.identifier)
            },

        GoRelayerUnavailable
            { identifier: String }
            | e | {
                format_args!("scenario '{}' was not configured with a Go relayer image", e.identifier)
            },

        DuplicateNodeName
            { name: String }
            | e | {
                format_args!("node name '{}' is used more than once in the scenario", e.name)
            },

        ConflictingRelayers
            | _ | { "setup plan selects both the Hermes and the Go relayer" },

        IbcRequiresTwoChains
            { chain_count: usize }
            | e | {
                format_args!("setup plan wires IBC, which requires exactly 2 chains, but {} were given",
                    e.chain_count)
            },

        MissingIbcConfig
            { chain_id: String }
            | e | {
                format_args!("chain {} has no IBC channel config", e.chain_id)
            },

        ChainIndexOutOfRange
            {
                index: usize,
                chain_count: usize,
            }
            | e | {
                format_args!("chain index {} is out of range for a scenario with {} chain(s)",
                    e.index, e.chain_count)
            },

        ChainNotConfigured
            { chain_id: String }
            | e | {
                format_args!("chain {} has not been configured yet", e.chain_id)
            },

        ContainerNotRunning
            { container: String }
            | e | {
                format_args!("container {} did not reach a running state", e.container)
            },

        MissingRelayerNode
            { chain_id: String }
            | e | {
                format_args!("chain {} has no non-validator node to serve the relayer", e.chain_id)
            },

        RelayerNotSelected
            {
                requested: String,
                selected: String,
            }
            | e | {
                format_args!("cannot run the {} relayer: this scenario uses {}",
                    e.requested, e.selected)
            },

        ContractNotDeclared
            | _ | { "this scenario does not deploy a contract" },

        ContractNotInstantiated
            { chain_id: String }
            | e | {
                format_args!("the contract on chain {} must be instantiated before wiring phase 2 IBC",
                    e.chain_id)
            },

        ConnectionNotEstablished
            { chain_id: String }
            | e | {
                format_args!("no IBC connection has been established from chain {}", e.chain_id)
            },

        Retry
            {
                task_name: String,
                attempts: u16,
            }
            | e | {
                format_args!(
                    "Expected task to eventually succeed, but failed after {} attempts: {}",
                    e.attempts,
                    e.task_name
                )
            },
    }
}

pub fn handle_generic_error<E>(e: E) -> Error
where
    Report: From<E>,
{
    Error::generic(e.into())
}

pub fn handle_exec_error(command: &str) -> impl FnOnce(IoError) -> Error + '_ {
    |e| match e.kind() {
        IoErrorKind::NotFound => Error::command_not_found(command.to_string(), e),
        _ => Error::io(e),
    }
}

impl From<Report> for Error {
    fn from(e: Report) -> Self {
        Error::generic(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::io(e)
    }
}
