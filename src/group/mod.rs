//! Thin façade over the parallel runtime a probe runs under.
//!
//! Joining a group is a backend constructor; leaving consumes the handle,
//! so no runtime call can follow it. Three backends are provided:
//! - [`SerialGroup`]: a one-process group, no runtime required.
//! - [`LocalWorld`]: N ranks simulated on N threads of this process.
//! - `MpiGroup` (feature `mpi-support`): `MPI_COMM_WORLD` through rsmpi.

use std::env;
use std::fs;
use std::path::Path;

use crate::probe_error::ProbeError;

pub mod local;
#[cfg(feature = "mpi-support")]
pub mod mpi_world;
pub mod serial;

pub use local::{LocalGroup, LocalWorld};
#[cfg(feature = "mpi-support")]
pub use mpi_world::MpiGroup;
pub use serial::SerialGroup;

/// Longest processor name a group reports, in bytes (Open MPI's `MPI_MAX_PROCESSOR_NAME`).
pub const MAX_PROCESSOR_NAME: usize = 256;

/// Files consulted, in order, when `HOSTNAME` is not set.
const HOST_NAME_FILES: [&str; 2] = ["/proc/sys/kernel/hostname", "/etc/hostname"];

/// Membership in a parallel execution group.
pub trait ProcessGroup {
    /// Zero-based position of this process, unique within the group.
    fn rank(&self) -> usize;

    /// Total number of member processes.
    fn size(&self) -> usize;

    /// Name of the host running this process, at most [`MAX_PROCESSOR_NAME`] bytes.
    fn processor_name(&self) -> Result<String, ProbeError>;

    /// Block until every member of the group has reached the barrier.
    fn barrier(&self) -> Result<(), ProbeError>;

    /// Release membership. Must be the last runtime operation.
    fn leave(self) -> Result<(), ProbeError>
    where
        Self: Sized;
}

/// Cut `name` to [`MAX_PROCESSOR_NAME`] bytes without splitting a UTF-8 character.
pub fn truncate_processor_name(name: &str) -> String {
    if name.len() <= MAX_PROCESSOR_NAME {
        return name.to_owned();
    }
    let mut end = MAX_PROCESSOR_NAME;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    log::warn!(
        "processor name truncated from {} to {} bytes",
        name.len(),
        end
    );
    name[..end].to_owned()
}

/// Host name of this machine as the OS reports it.
pub fn host_name() -> String {
    let files: Vec<&Path> = HOST_NAME_FILES.iter().map(Path::new).collect();
    resolve_host_name(env::var("HOSTNAME").ok(), &files)
}

/// First non-blank candidate among `from_env` and the contents of `files`,
/// falling back to `"localhost"`.
pub fn resolve_host_name(from_env: Option<String>, files: &[&Path]) -> String {
    let candidates = from_env
        .into_iter()
        .chain(files.iter().filter_map(|p| fs::read_to_string(p).ok()));
    for candidate in candidates {
        let trimmed = candidate.trim();
        if !trimmed.is_empty() {
            return truncate_processor_name(trimmed);
        }
    }
    "localhost".to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn short_names_pass_through() {
        assert_eq!(truncate_processor_name("node01"), "node01");
    }

    #[test]
    fn long_names_are_cut_to_the_limit() {
        let name = "n".repeat(MAX_PROCESSOR_NAME + 40);
        assert_eq!(truncate_processor_name(&name).len(), MAX_PROCESSOR_NAME);
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        // 'é' is two bytes; an odd prefix pushes one across the limit.
        let name = format!("x{}", "é".repeat(MAX_PROCESSOR_NAME));
        let cut = truncate_processor_name(&name);
        assert!(cut.len() <= MAX_PROCESSOR_NAME);
        assert_eq!(cut.len(), MAX_PROCESSOR_NAME - 1);
        assert!(cut.starts_with('x'));
    }

    #[test]
    fn env_value_wins_over_files() {
        let name = resolve_host_name(Some("  compute-7\n".into()), &[]);
        assert_eq!(name, "compute-7");
    }

    #[test]
    fn blank_env_falls_through_to_files() {
        let dir = std::env::temp_dir().join(format!("rank-probe-host-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let missing = dir.join("missing");
        let present = dir.join("hostname");
        let mut f = fs::File::create(&present).unwrap();
        writeln!(f, "openmpi3").unwrap();

        let name = resolve_host_name(Some("   ".into()), &[&missing, &present]);
        assert_eq!(name, "openmpi3");
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn nothing_found_means_localhost() {
        assert_eq!(resolve_host_name(None, &[]), "localhost");
    }
}
