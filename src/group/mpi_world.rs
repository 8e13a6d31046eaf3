//! `MPI_COMM_WORLD` membership through rsmpi (feature `mpi-support`).
//!
//! Run with e.g. `cargo mpirun -n 4 --features mpi-support --bin rank_probe`.

use mpi::environment::Universe;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use super::{ProcessGroup, truncate_processor_name};
use crate::probe_error::ProbeError;

/// This process's membership in the MPI world communicator.
///
/// Dropping the group finalises MPI, so an early `?` return still leaves the
/// runtime in a clean state.
pub struct MpiGroup {
    world: SimpleCommunicator,
    universe: Universe,
}

impl MpiGroup {
    /// `MPI_Init`. Fails if MPI was already initialised in this process.
    pub fn join() -> Result<Self, ProbeError> {
        let universe = mpi::initialize().ok_or_else(|| {
            ProbeError::RuntimeUnavailable("MPI has already been initialised".into())
        })?;
        let world = universe.world();
        let (major, minor) = mpi::environment::version();
        log::debug!(
            "joined MPI-{major}.{minor} world as rank {} of {}",
            world.rank(),
            world.size()
        );
        if let Ok(library) = mpi::environment::library_version() {
            log::debug!("MPI library: {}", library.trim());
        }
        Ok(Self { world, universe })
    }

    /// Borrow the world communicator.
    pub fn world(&self) -> &SimpleCommunicator {
        &self.world
    }
}

impl ProcessGroup for MpiGroup {
    fn rank(&self) -> usize {
        self.world.rank() as usize
    }

    fn size(&self) -> usize {
        self.world.size() as usize
    }

    fn processor_name(&self) -> Result<String, ProbeError> {
        mpi::environment::processor_name()
            .map(|name| truncate_processor_name(&name))
            .map_err(|e| ProbeError::ProcessorName(e.to_string()))
    }

    fn barrier(&self) -> Result<(), ProbeError> {
        self.world.barrier();
        Ok(())
    }

    fn leave(self) -> Result<(), ProbeError> {
        let rank = self.rank();
        let Self { world, universe } = self;
        drop(world);
        // MPI_Finalize
        drop(universe);
        log::debug!("rank {rank} left the MPI world");
        Ok(())
    }
}
