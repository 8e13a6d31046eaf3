#![cfg(feature = "mpi-support")]
//! cargo mpirun -n 4 --features mpi-support --test mpi_rank_probe

use rank_probe::prelude::*;

#[test]
fn mpi_world_reports_consistent_rank() {
    let group = MpiGroup::join().expect("MPI init");
    let rank = group.rank();
    let size = group.size();
    assert!(size >= 1);
    assert!(rank < size);

    let mut out = Vec::new();
    let options = ProbeOptions {
        barrier: true,
        ..ProbeOptions::default()
    };
    let report = run_probe(group, options, &mut out).expect("probe");
    let text = String::from_utf8(out).unwrap();

    assert_eq!(report.rank, rank);
    assert_eq!(report.size, size);
    if rank == 0 {
        assert!(text.starts_with("Processor name: "));
        assert!(text.ends_with(&format!("master (0/{size})\n")));
    } else {
        assert_eq!(text, format!("slave ({rank}/{size})\n"));
    }
}
