//! Dispatch a parsed [`Command`] to the backend it selects.

use std::io::Write;

use crate::config::{Backend, Command, HostfileCommand, ProbeCommand};
use crate::group::{LocalWorld, SerialGroup};
use crate::mca::{CONFIG_DIRECTORY, Hostfile, MCA_PARAMS_FILE, MpiPortConfig};
use crate::probe_error::ProbeError;
use crate::report::{ProbeOptions, RankReport, run_probe};

/// Run `command`, writing everything meant for stdout into `out`.
pub fn execute<W: Write>(command: Command, out: &mut W) -> Result<(), ProbeError> {
    match command {
        Command::Probe(probe) => probe_with(&probe, out).map(|_| ()),
        Command::McaParams { instances } => {
            let cfg = MpiPortConfig::generate(instances)?;
            log::info!("install as {CONFIG_DIRECTORY}{MCA_PARAMS_FILE}");
            out.write_all(cfg.render_mca_params().as_bytes())?;
            Ok(())
        }
        Command::Hostfile(cmd) => {
            let hostfile = hostfile_from(cmd)?;
            log::info!("hostfile with {} entries", hostfile.len());
            out.write_all(hostfile.render().as_bytes())?;
            Ok(())
        }
    }
}

/// Run the probe on the selected backend and return every report this
/// process produced (one, or one per simulated rank).
pub fn probe_with<W: Write>(probe: &ProbeCommand, out: &mut W) -> Result<Vec<RankReport>, ProbeError> {
    let options = ProbeOptions {
        format: probe.format,
        barrier: probe.barrier,
    };
    let backend = probe.backend.resolve()?;
    if backend != Backend::Local && probe.ranks != 1 {
        log::warn!("--ranks only applies to the local backend; ignoring {}", probe.ranks);
    }
    match backend {
        Backend::Serial => Ok(vec![run_probe(SerialGroup::join(), options, out)?]),
        Backend::Local => run_local(&LocalWorld::new(probe.ranks)?, options, out),
        Backend::Mpi => run_mpi(options, out),
    }
}

/// Launch every rank of `world`, then emit their output in rank order.
pub fn run_local<W: Write>(
    world: &LocalWorld,
    options: ProbeOptions,
    out: &mut W,
) -> Result<Vec<RankReport>, ProbeError> {
    let runs = world.launch(|group| {
        let mut buf = Vec::new();
        run_probe(group, options, &mut buf).map(|report| (report, buf))
    })?;
    let mut reports = Vec::with_capacity(runs.len());
    for run in runs {
        let (report, buf) = run?;
        out.write_all(&buf)?;
        reports.push(report);
    }
    out.flush()?;
    Ok(reports)
}

#[cfg(feature = "mpi-support")]
fn run_mpi<W: Write>(options: ProbeOptions, out: &mut W) -> Result<Vec<RankReport>, ProbeError> {
    let group = crate::group::MpiGroup::join()?;
    Ok(vec![run_probe(group, options, out)?])
}

#[cfg(not(feature = "mpi-support"))]
fn run_mpi<W: Write>(_options: ProbeOptions, _out: &mut W) -> Result<Vec<RankReport>, ProbeError> {
    Err(ProbeError::BackendUnavailable("mpi"))
}

fn hostfile_from(cmd: HostfileCommand) -> Result<Hostfile, ProbeError> {
    if cmd.instances.is_empty() {
        Hostfile::client(cmd.client)
    } else {
        Ok(Hostfile::Compute(cmd.instances))
    }
}
