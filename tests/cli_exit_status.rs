use std::process::{Command, Output};

fn rank_probe(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rank_probe"))
        .args(args)
        .env("HOSTNAME", "node0")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to start rank_probe")
}

#[test]
fn local_run_exits_zero_with_only_report_lines() {
    let out = rank_probe(&["--backend", "local", "-n", "4"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "Processor name: node0\nmaster (0/4)\nslave (1/4)\nslave (2/4)\nslave (3/4)\n"
    );
}

#[test]
fn serial_run_exits_zero() {
    let out = rank_probe(&["--backend", "serial"]);
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "Processor name: node0\nmaster (0/1)\n"
    );
}

#[test]
fn logging_stays_off_stdout() {
    let out = Command::new(env!("CARGO_BIN_EXE_rank_probe"))
        .args(["--backend", "local", "-n", "2"])
        .env("HOSTNAME", "node0")
        .env("RUST_LOG", "debug")
        .output()
        .expect("failed to start rank_probe");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(
        String::from_utf8(out.stdout).unwrap(),
        "Processor name: node0\nmaster (0/2)\nslave (1/2)\n"
    );
    assert!(!out.stderr.is_empty());
}

#[cfg(not(feature = "mpi-support"))]
#[test]
fn mpi_backend_without_mpi_exits_one() {
    let out = rank_probe(&["--backend", "mpi"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
    assert!(String::from_utf8_lossy(&out.stderr).contains("mpi"));
}

#[test]
fn zero_instance_mca_params_exits_one() {
    let out = rank_probe(&["mca-params", "--instances", "0"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

#[test]
fn zero_local_ranks_exits_one() {
    let out = rank_probe(&["--backend", "local", "-n", "0"]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}

#[test]
fn blank_client_hostfile_exits_one() {
    let out = rank_probe(&["hostfile", "--client", ""]);
    assert_eq!(out.status.code(), Some(1));
    assert!(out.stdout.is_empty());
}
