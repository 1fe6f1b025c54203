use powerflow_algo::{voltage_profile, AcPowerFlowSolver};
use powerflow_core::{BusId, LinearSolverKind};
use powerflow_io::{load_solved_network, save_network, BuiltinCase};
use tempfile::tempdir;

#[test]
fn solved_network_survives_persistence() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("case14.json");

    let mut network = BuiltinCase::Case14.build().unwrap();
    let results = AcPowerFlowSolver::new()
        .solve_in_place(&mut network)
        .unwrap();
    save_network(&path, &network).unwrap();

    let loaded = load_solved_network(&path, "case14").unwrap();
    let stored = loaded.results.as_ref().unwrap();
    assert_eq!(stored.iterations, results.iterations);
    assert_eq!(stored.bus.len(), 14);

    let before = voltage_profile(&network).unwrap();
    let after = voltage_profile(&loaded).unwrap();
    assert_eq!(after.slack, BusId::new(1));
    for (a, b) in before.points.iter().zip(&after.points) {
        assert_eq!((a.bus, a.distance), (b.bus, b.distance));
        assert!((a.vm_pu - b.vm_pu).abs() < 1e-12);
    }
}

#[test]
fn backends_agree_on_every_builtin_case() {
    for case in BuiltinCase::ALL {
        let network = case.build().unwrap();
        let faer = AcPowerFlowSolver::new().solve(&network).unwrap();
        let gauss = AcPowerFlowSolver::new()
            .with_linear_solver(LinearSolverKind::Gauss)
            .solve(&network)
            .unwrap();
        for (a, b) in faer.voltage_magnitude.iter().zip(&gauss.voltage_magnitude) {
            assert!((a - b).abs() < 1e-9, "{}", case.name());
        }
    }
}
