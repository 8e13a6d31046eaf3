//! Rank reporter: join -> query size, rank, host -> print -> leave.

use std::fmt;
use std::io::Write;

use serde::Serialize;

use crate::config::OutputFormat;
use crate::group::ProcessGroup;
use crate::probe_error::ProbeError;

/// Whether a process coordinates the group or is one of its workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Rank 0.
    Master,
    /// Every other rank.
    Slave,
}

impl Role {
    pub fn for_rank(rank: usize) -> Self {
        if rank == 0 { Role::Master } else { Role::Slave }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Master => f.write_str("master"),
            Role::Slave => f.write_str("slave"),
        }
    }
}

/// What one process learned about itself from the runtime.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RankReport {
    pub rank: usize,
    pub size: usize,
    pub role: Role,
    pub processor_name: String,
}

impl RankReport {
    /// Build a report, rejecting an empty group or a rank outside `[0, size)`.
    pub fn new(
        rank: usize,
        size: usize,
        processor_name: impl Into<String>,
    ) -> Result<Self, ProbeError> {
        if size == 0 || rank >= size {
            return Err(ProbeError::InvalidRank { rank, size });
        }
        Ok(Self {
            rank,
            size,
            role: Role::for_rank(rank),
            processor_name: processor_name.into(),
        })
    }

    /// Query size, rank and processor name, in that order.
    pub fn gather<G: ProcessGroup>(group: &G) -> Result<Self, ProbeError> {
        let size = group.size();
        let rank = group.rank();
        let processor_name = group.processor_name()?;
        Self::new(rank, size, processor_name)
    }

    /// `Processor name: ..` (master only) followed by `master|slave (rank/size)`.
    pub fn write_text<W: Write + ?Sized>(&self, out: &mut W) -> std::io::Result<()> {
        if self.role == Role::Master {
            writeln!(out, "Processor name: {}", self.processor_name)?;
        }
        writeln!(out, "{}", self)
    }

    /// One JSON object on one line.
    pub fn write_json<W: Write + ?Sized>(&self, out: &mut W) -> Result<(), ProbeError> {
        let line = serde_json::to_string(self)?;
        writeln!(out, "{line}")?;
        Ok(())
    }

    pub fn write<W: Write + ?Sized>(
        &self,
        format: OutputFormat,
        out: &mut W,
    ) -> Result<(), ProbeError> {
        match format {
            OutputFormat::Text => self.write_text(out)?,
            OutputFormat::Json => self.write_json(out)?,
        }
        out.flush()?;
        Ok(())
    }
}

impl fmt::Display for RankReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}/{})", self.role, self.rank, self.size)
    }
}

/// Knobs for a single probe run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProbeOptions {
    pub format: OutputFormat,
    /// Synchronise all ranks after printing, before leaving.
    pub barrier: bool,
}

/// The whole probe for one process: query, print, leave.
///
/// `group` is consumed; leaving is the last runtime operation performed. On
/// error the group is dropped, which releases membership for backends that
/// hold runtime state. A requested barrier is entered even when printing
/// failed, so the other ranks are never left waiting on this one.
pub fn run_probe<G, W>(group: G, options: ProbeOptions, out: &mut W) -> Result<RankReport, ProbeError>
where
    G: ProcessGroup,
    W: Write + ?Sized,
{
    let report = RankReport::gather(&group)?;
    log::info!(
        "rank {}/{} on {} reporting as {}",
        report.rank,
        report.size,
        report.processor_name,
        report.role
    );
    let written = report.write(options.format, out);
    if options.barrier {
        group.barrier()?;
    }
    written?;
    group.leave()?;
    Ok(report)
}
