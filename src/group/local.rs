//! In-process launcher: N ranks on N scoped threads.
//!
//! `LocalWorld` plays the part of `mpirun` for tests and for machines without
//! an MPI installation. Every rank thread runs the same closure and is
//! sequential on its own; the only shared state is the barrier and the
//! membership counter. No rank starts its body until every rank thread has
//! been spawned, so a failed spawn can not strand the others on the barrier.

use std::io;
use std::sync::{Arc, Barrier};
use std::thread;

use parking_lot::{Condvar, Mutex};

use super::{ProcessGroup, host_name, truncate_processor_name};
use crate::probe_error::ProbeError;

#[derive(Debug)]
struct Shared {
    size: usize,
    processor_name: String,
    barrier: Barrier,
    members: Mutex<usize>,
}

/// Held closed until every rank thread exists; `Some(false)` aborts the launch.
#[derive(Debug, Default)]
struct StartGate {
    state: Mutex<Option<bool>>,
    opened: Condvar,
}

impl StartGate {
    fn open(&self, go: bool) {
        *self.state.lock() = Some(go);
        self.opened.notify_all();
    }

    fn wait(&self) -> bool {
        let mut state = self.state.lock();
        while state.is_none() {
            self.opened.wait(&mut state);
        }
        state.unwrap_or(false)
    }
}

/// Description of a local launch: how many ranks and which host they report.
#[derive(Clone, Debug)]
pub struct LocalWorld {
    size: usize,
    processor_name: String,
    #[cfg(test)]
    fail_spawn_at: Option<usize>,
}

impl LocalWorld {
    /// A world of `size` ranks on this host. `size` must be at least 1.
    pub fn new(size: usize) -> Result<Self, ProbeError> {
        if size == 0 {
            return Err(ProbeError::InvalidConfig(
                "a local world needs at least one rank".into(),
            ));
        }
        Ok(Self {
            size,
            processor_name: host_name(),
            #[cfg(test)]
            fail_spawn_at: None,
        })
    }

    /// Override the processor name every rank reports.
    pub fn with_processor_name(mut self, name: impl AsRef<str>) -> Self {
        self.processor_name = truncate_processor_name(name.as_ref());
        self
    }

    /// Number of ranks a launch starts.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Run `body` once per rank, each on its own thread, and collect the
    /// results ordered by rank.
    ///
    /// If a rank thread can not be spawned, no rank runs `body` and the spawn
    /// error is returned. A panicking rank is reported as
    /// [`ProbeError::LocalRankPanicked`]; ranks still waiting on a barrier the
    /// panicked rank never reaches will block, just as they would under a real
    /// runtime.
    pub fn launch<F, T>(&self, body: F) -> Result<Vec<T>, ProbeError>
    where
        F: Fn(LocalGroup) -> T + Sync,
        T: Send,
    {
        let shared = Arc::new(Shared {
            size: self.size,
            processor_name: self.processor_name.clone(),
            barrier: Barrier::new(self.size),
            members: Mutex::new(0),
        });
        log::debug!("launching {} local ranks", self.size);

        let body = &body;
        let gate = StartGate::default();
        let gate = &gate;
        let results = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.size);
            let mut spawn_error = None;
            for rank in 0..self.size {
                let group = LocalGroup::join(rank, Arc::clone(&shared));
                let spawned = self.spawn_check(rank).and_then(|()| {
                    thread::Builder::new()
                        .name(format!("rank-{rank}"))
                        .spawn_scoped(scope, move || gate.wait().then(|| body(group)))
                });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        spawn_error = Some(e);
                        break;
                    }
                }
            }
            gate.open(spawn_error.is_none());
            if let Some(e) = spawn_error {
                // the spawned ranks see a closed gate and return without running
                return Err(ProbeError::Io(e));
            }
            handles
                .into_iter()
                .enumerate()
                .map(|(rank, handle)| {
                    handle
                        .join()
                        .ok()
                        .flatten()
                        .ok_or(ProbeError::LocalRankPanicked(rank))
                })
                .collect::<Result<Vec<T>, ProbeError>>()
        })?;

        let remaining = *shared.members.lock();
        if remaining != 0 {
            log::warn!("{remaining} local ranks finished without leaving the group");
        }
        Ok(results)
    }
}

impl LocalWorld {
    #[cfg(not(test))]
    fn spawn_check(&self, _rank: usize) -> io::Result<()> {
        Ok(())
    }

    #[cfg(test)]
    fn spawn_check(&self, rank: usize) -> io::Result<()> {
        if self.fail_spawn_at == Some(rank) {
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "thread limit"));
        }
        Ok(())
    }
}

/// One rank's membership in a [`LocalWorld`] launch.
#[derive(Debug)]
pub struct LocalGroup {
    rank: usize,
    shared: Arc<Shared>,
    left: bool,
}

impl LocalGroup {
    fn join(rank: usize, shared: Arc<Shared>) -> Self {
        *shared.members.lock() += 1;
        Self {
            rank,
            shared,
            left: false,
        }
    }
}

impl ProcessGroup for LocalGroup {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.shared.size
    }

    fn processor_name(&self) -> Result<String, ProbeError> {
        Ok(self.shared.processor_name.clone())
    }

    fn barrier(&self) -> Result<(), ProbeError> {
        self.shared.barrier.wait();
        Ok(())
    }

    fn leave(mut self) -> Result<(), ProbeError> {
        *self.shared.members.lock() -= 1;
        self.left = true;
        log::debug!("rank {} left local group", self.rank);
        Ok(())
    }
}

impl Drop for LocalGroup {
    fn drop(&mut self) {
        if !self.left {
            log::debug!("rank {} dropped without leaving", self.rank);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ranks_is_rejected() {
        assert!(matches!(
            LocalWorld::new(0),
            Err(ProbeError::InvalidConfig(_))
        ));
    }

    #[test]
    fn results_come_back_in_rank_order() {
        let world = LocalWorld::new(5).unwrap();
        let ranks = world
            .launch(|g| {
                let r = (g.rank(), g.size());
                g.leave().unwrap();
                r
            })
            .unwrap();
        assert_eq!(ranks, (0..5).map(|r| (r, 5)).collect::<Vec<_>>());
    }

    #[test]
    fn barrier_releases_all_ranks() {
        let world = LocalWorld::new(3).unwrap();
        let arrived = Mutex::new(0usize);
        let seen = world
            .launch(|g| {
                *arrived.lock() += 1;
                g.barrier().unwrap();
                let n = *arrived.lock();
                g.leave().unwrap();
                n
            })
            .unwrap();
        assert!(seen.iter().all(|&n| n == 3));
    }

    #[test]
    fn every_rank_reports_the_same_host() {
        let world = LocalWorld::new(2).unwrap().with_processor_name("openmpi0");
        let names = world
            .launch(|g| g.processor_name().unwrap())
            .unwrap();
        assert_eq!(names, vec!["openmpi0", "openmpi0"]);
    }

    #[test]
    fn failed_spawn_returns_error_without_running_any_rank() {
        let mut world = LocalWorld::new(4).unwrap();
        world.fail_spawn_at = Some(2);
        let ran = Mutex::new(0usize);
        let err = world
            .launch(|g| {
                *ran.lock() += 1;
                g.barrier().unwrap();
                g.leave().unwrap();
            })
            .unwrap_err();
        assert!(matches!(err, ProbeError::Io(_)));
        assert_eq!(*ran.lock(), 0);
    }

    #[test]
    fn closed_gate_releases_waiters_without_running() {
        let gate = StartGate::default();
        let outcomes = thread::scope(|scope| {
            let waiters: Vec<_> = (0..3).map(|_| scope.spawn(|| gate.wait())).collect();
            gate.open(false);
            waiters
                .into_iter()
                .map(|w| w.join().unwrap())
                .collect::<Vec<_>>()
        });
        assert_eq!(outcomes, vec![false, false, false]);
        assert!(!gate.wait());
    }

    #[test]
    fn panicking_rank_is_reported() {
        let world = LocalWorld::new(2).unwrap();
        let err = world
            .launch(|g| {
                if g.rank() == 1 {
                    panic!("boom");
                }
            })
            .unwrap_err();
        assert!(matches!(err, ProbeError::LocalRankPanicked(1)));
    }
}
