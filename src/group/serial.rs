//! One-process group for builds without an MPI runtime.

use super::{ProcessGroup, host_name, truncate_processor_name};
use crate::probe_error::ProbeError;

/// Compile-time trivial group: rank 0 of 1.
#[derive(Clone, Debug)]
pub struct SerialGroup {
    processor_name: String,
}

impl SerialGroup {
    /// Join a group containing only this process, named after the local host.
    pub fn join() -> Self {
        Self::with_processor_name(host_name())
    }

    /// Join with an explicit processor name.
    pub fn with_processor_name(name: impl AsRef<str>) -> Self {
        log::debug!("joined serial group");
        Self {
            processor_name: truncate_processor_name(name.as_ref()),
        }
    }
}

impl Default for SerialGroup {
    fn default() -> Self {
        Self::join()
    }
}

impl ProcessGroup for SerialGroup {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn processor_name(&self) -> Result<String, ProbeError> {
        Ok(self.processor_name.clone())
    }

    fn barrier(&self) -> Result<(), ProbeError> {
        Ok(())
    }

    fn leave(self) -> Result<(), ProbeError> {
        log::debug!("left serial group");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn serial_group_is_rank_zero_of_one() {
        let g = SerialGroup::with_processor_name("login01");
        assert_eq!(g.rank(), 0);
        assert_eq!(g.size(), 1);
        assert_eq!(g.processor_name().unwrap(), "login01");
        g.barrier().unwrap();
        g.leave().unwrap();
    }

    #[test]
    #[serial]
    fn join_uses_hostname_from_environment() {
        let previous = std::env::var("HOSTNAME").ok();
        // SAFETY: every test touching the environment runs under #[serial].
        unsafe { std::env::set_var("HOSTNAME", "probe-node-3") };
        let g = SerialGroup::join();
        match previous {
            Some(v) => unsafe { std::env::set_var("HOSTNAME", v) },
            None => unsafe { std::env::remove_var("HOSTNAME") },
        }
        assert_eq!(g.processor_name().unwrap(), "probe-node-3");
    }
}
