//! cargo mpirun -n 4 --features mpi-support --bin rank_probe
//!
//! Without MPI: `cargo run --bin rank_probe -- --backend local -n 4`

use std::io;
use std::process;

use clap::Parser;
use env_logger::Env;
use rank_probe::config::ProbeArgs;
use rank_probe::launch;

fn main() {
    // Logs go to stderr; stdout carries only the report.
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let command = ProbeArgs::parse().into_command();
    log::debug!("running {command:?}");

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = launch::execute(command, &mut out) {
        eprintln!("rank_probe: {err}");
        process::exit(1);
    }
}
