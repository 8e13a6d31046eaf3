//! Open MPI runtime configuration for a cluster of probe containers.
//!
//! Each instance gets a fixed window of TCP ports for the byte transfer layer
//! (BTL) and the out-of-band channel (OOB) so container port mappings can be
//! declared up front. The hostfile lists the compute instances either with
//! host names (compute side) or as bare addresses (client side).

use std::fmt::Write as _;

use crate::probe_error::ProbeError;

pub const BTL_PORT_MIN: u16 = 2000;
pub const OOB_PORT_MIN: u16 = 6000;
/// Ports reserved per instance, for each of BTL and OOB.
pub const PORT_RANGE: u32 = 4;

/// Where Open MPI looks for `openmpi-mca-params.conf`.
pub const CONFIG_DIRECTORY: &str = "/usr/local/etc/";
pub const MCA_PARAMS_FILE: &str = "openmpi-mca-params.conf";

/// Host name given to the `instance_id`-th MPI container.
pub fn new_host_name(instance_id: usize) -> String {
    format!("openmpi{instance_id}")
}

/// Host name given to the `instance_id`-th client container, the one `mpirun` is started from.
pub fn new_client_host_name(instance_id: usize) -> String {
    format!("openmpi_client{instance_id}")
}

/// Port windows for a cluster of `num_instances` MPI containers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MpiPortConfig {
    pub num_instances: usize,
    pub btl_port_min: u16,
    pub btl_port_range: u32,
    pub oob_port_min: u16,
    pub oob_port_range: u32,
}

impl MpiPortConfig {
    pub fn generate(num_instances: usize) -> Result<Self, ProbeError> {
        if num_instances == 0 {
            return Err(ProbeError::InvalidConfig(
                "an MPI cluster needs at least one instance".into(),
            ));
        }
        let range = u32::try_from(num_instances)
            .ok()
            .and_then(|n| n.checked_mul(PORT_RANGE))
            .filter(|r| u32::from(OOB_PORT_MIN) + r <= u32::from(u16::MAX))
            .ok_or_else(|| {
                ProbeError::InvalidConfig(format!(
                    "{num_instances} instances exceed the available port space"
                ))
            })?;
        Ok(Self {
            num_instances,
            btl_port_min: BTL_PORT_MIN,
            btl_port_range: range,
            oob_port_min: OOB_PORT_MIN,
            oob_port_range: range,
        })
    }

    /// `["<btl min>-<btl end>", "<oob min>-<oob end>"]`, ready for a container port list.
    pub fn exposed_ports(&self) -> [String; 2] {
        [
            port_span(self.btl_port_min, self.btl_port_range),
            port_span(self.oob_port_min, self.oob_port_range),
        ]
    }

    /// Contents of `openmpi-mca-params.conf`.
    pub fn render_mca_params(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# Generated by rank-probe for {} instances", self.num_instances);
        let _ = writeln!(out, "btl_tcp_port_min_v4 = {}", self.btl_port_min);
        let _ = writeln!(out, "btl_tcp_port_range_v4 = {}", self.btl_port_range);
        let _ = writeln!(out, "oob_tcp_port_min_v4 = {}", self.oob_port_min);
        let _ = writeln!(out, "oob_tcp_port_range_v4 = {}", self.oob_port_range);
        out
    }
}

fn port_span(min: u16, range: u32) -> String {
    format!("{}-{}", min, u32::from(min) + range)
}

/// One compute instance: data-network address and host name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostEntry {
    pub ip: String,
    pub host_name: String,
}

impl HostEntry {
    pub fn new(ip: impl Into<String>, host_name: impl Into<String>) -> Self {
        Self {
            ip: ip.into(),
            host_name: host_name.into(),
        }
    }
}

/// MPI hostfile, in either of its two shapes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hostfile {
    /// Written on compute instances: `<ip> <host name>` per line.
    Compute(Vec<HostEntry>),
    /// Written on the client: addresses only, which is all `mpirun` needs there.
    Client(Vec<String>),
}

impl Hostfile {
    /// Client hostfile from compute node addresses; blank addresses are rejected.
    pub fn client<I, S>(ips: I) -> Result<Self, ProbeError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        ips.into_iter()
            .map(|ip| match ip.as_ref().trim() {
                "" => Err(ProbeError::InvalidConfig(
                    "client hostfile entries need an address".into(),
                )),
                ip => Ok(ip.to_owned()),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Hostfile::Client)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        match self {
            Hostfile::Compute(entries) => {
                for e in entries {
                    let _ = writeln!(out, "{} {}", e.ip, e.host_name);
                }
            }
            Hostfile::Client(ips) => {
                for ip in ips {
                    let _ = writeln!(out, "{ip}");
                }
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        match self {
            Hostfile::Compute(entries) => entries.len(),
            Hostfile::Client(ips) => ips.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
