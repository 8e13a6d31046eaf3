#![cfg_attr(docsrs, feature(doc_cfg))]
//! # rank-probe
//!
//! rank-probe is a smoke test for an MPI toolchain or container image. Every
//! launched process joins the world group, asks the runtime for the group size,
//! its own rank and the processor name, prints one identification line, and
//! leaves the group again:
//!
//! ```text
//! Processor name: openmpi0
//! master (0/4)
//! slave (1/4)
//! slave (2/4)
//! slave (3/4)
//! ```
//!
//! Only rank 0 prints the processor name. Line order across ranks is whatever
//! the launcher delivers.
//!
//! ## Backends
//! - [`group::SerialGroup`]: rank 0 of 1, no runtime needed.
//! - [`group::LocalWorld`]: N ranks on N threads of one process, for tests and
//!   machines without MPI.
//! - `group::MpiGroup` (feature `mpi-support`): the real `MPI_COMM_WORLD`.
//!
//! ## Usage
//!
//! ```toml
//! [dependencies]
//! rank-probe = "0.1"
//! # features = ["mpi-support"]
//! ```
//!
//! ```no_run
//! use rank_probe::prelude::*;
//!
//! fn main() -> Result<(), ProbeError> {
//!     let world = LocalWorld::new(4)?;
//!     let mut out = std::io::stdout();
//!     rank_probe::launch::run_local(&world, ProbeOptions::default(), &mut out)?;
//!     Ok(())
//! }
//! ```
//!
//! The `rank_probe` binary also renders the Open MPI port configuration and
//! hostfiles a cluster of probe containers needs; see [`mca`].

pub mod config;
pub mod group;
pub mod launch;
pub mod mca;
pub mod probe_error;
pub mod report;

/// A convenient prelude to import the most-used traits & types:
pub mod prelude {
    pub use crate::config::{BackendKind, OutputFormat};
    #[cfg(feature = "mpi-support")]
    pub use crate::group::MpiGroup;
    pub use crate::group::{LocalGroup, LocalWorld, ProcessGroup, SerialGroup};
    pub use crate::probe_error::ProbeError;
    pub use crate::report::{ProbeOptions, RankReport, Role, run_probe};
}
