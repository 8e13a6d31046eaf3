//! Command line surface of the `rank_probe` binary.

use std::str::FromStr;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::mca::HostEntry;
use crate::probe_error::ProbeError;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None, args_conflicts_with_subcommands = true)]
pub struct ProbeArgs {
    #[command(subcommand)]
    pub command: Option<Command>,
    /// Options for the default `probe` command.
    #[command(flatten)]
    pub probe: ProbeCommand,
}

impl ProbeArgs {
    /// The command to run; `probe` when none was named.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Probe(self.probe))
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Report rank, group size and processor name (default).
    Probe(ProbeCommand),
    /// Print an openmpi-mca-params.conf for a cluster of the given size.
    McaParams {
        #[arg(long, short)]
        instances: usize,
    },
    /// Print an MPI hostfile.
    Hostfile(HostfileCommand),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ProbeCommand {
    #[arg(long, short, value_enum, default_value_t = BackendKind::Auto)]
    pub backend: BackendKind,
    /// Ranks to simulate with the local backend.
    #[arg(long, short = 'n', default_value_t = 1)]
    pub ranks: usize,
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
    /// Synchronise all ranks before leaving the group.
    #[arg(long)]
    pub barrier: bool,
}

impl Default for ProbeCommand {
    fn default() -> Self {
        Self {
            backend: BackendKind::Auto,
            ranks: 1,
            format: OutputFormat::Text,
            barrier: false,
        }
    }
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
#[group(required = true, multiple = false)]
pub struct HostfileCommand {
    /// Client side: compute node addresses only.
    #[arg(long, value_delimiter = ',')]
    pub client: Vec<String>,
    /// Compute side: `<ip>=<host name>`, repeatable.
    #[arg(long = "instance")]
    pub instances: Vec<HostEntry>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// MPI when compiled in, serial otherwise.
    #[default]
    Auto,
    Serial,
    Local,
    Mpi,
}

/// A backend this build can actually run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Serial,
    Local,
    Mpi,
}

impl BackendKind {
    /// Settle `Auto` and reject backends this build does not carry.
    pub fn resolve(self) -> Result<Backend, ProbeError> {
        match self {
            BackendKind::Auto if cfg!(feature = "mpi-support") => Ok(Backend::Mpi),
            BackendKind::Auto | BackendKind::Serial => Ok(Backend::Serial),
            BackendKind::Local => Ok(Backend::Local),
            BackendKind::Mpi if cfg!(feature = "mpi-support") => Ok(Backend::Mpi),
            BackendKind::Mpi => Err(ProbeError::BackendUnavailable("mpi")),
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for HostEntry {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((ip, host)) if !ip.trim().is_empty() && !host.trim().is_empty() => {
                Ok(HostEntry::new(ip.trim(), host.trim()))
            }
            _ => Err(ProbeError::InvalidConfig(format!(
                "expected <ip>=<host name>, got `{s}`"
            ))),
        }
    }
}
