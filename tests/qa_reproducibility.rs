//! Reproducibility checks: identical inputs must give bit-identical output.

use double_pendulum::prelude::*;

fn chaotic_config() -> SimConfig {
    SimConfig::builder()
        .initial_angles_deg(170.0, 175.0)
        .initial_velocities(0.3, -0.2)
        .step(0.01)
        .horizon(10.0)
        .build()
}

fn bits(traj: &Trajectory) -> Vec<[u64; 7]> {
    traj.rows()
        .iter()
        .map(|row| row.map(f64::to_bits))
        .collect()
}

// H0: Two runs with the same configuration differ
// Falsification: run twice, compare every field bitwise
#[test]
fn h0_1_same_config_identical_bits() {
    let config = chaotic_config();
    let a = double_pendulum::simulate(&config).unwrap();
    let b = double_pendulum::simulate(&config).unwrap();
    assert_eq!(bits(&a), bits(&b));
}

// H0: Serialized trajectories differ across repeated runs
// Falsification: 20 runs, compare JSON output with the first
#[test]
fn h0_2_repeated_runs_identical_json() {
    let config = chaotic_config();
    let first = serde_json::to_string(&double_pendulum::simulate(&config).unwrap()).unwrap();
    for i in 1..20 {
        let output = serde_json::to_string(&double_pendulum::simulate(&config).unwrap()).unwrap();
        assert_eq!(first, output, "run {i} diverged");
    }
}

// H0: Results depend on which thread runs the simulation
// Falsification: run on several threads sharing one model
#[test]
fn h0_3_thread_invariance() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DoublePendulum>();

    let config = chaotic_config();
    let model = DoublePendulum::new(config.params()).unwrap();
    let grid = config.time_grid().unwrap();
    let reference = bits(&double_pendulum::simulate(&config).unwrap());

    let (model, config) = (&model, &config);
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(move || {
                    let mut sim = Simulator::from_parts(
                        model.clone(),
                        config.initial_state(),
                        grid,
                        config.jidoka.clone(),
                    );
                    bits(&sim.simulate().unwrap())
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), reference);
        }
    });
}

// H0: A YAML round trip of the configuration changes the result
// Falsification: serialize, parse back, rerun
#[test]
fn h0_4_yaml_round_trip_preserves_result() {
    let config = chaotic_config();
    let reparsed = SimConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
    let a = double_pendulum::simulate(&config).unwrap();
    let b = double_pendulum::simulate(&reparsed).unwrap();
    assert_eq!(bits(&a), bits(&b));
}

// H0: A tiny change in initial angle leaves the chaotic run unchanged
// Falsification: perturb q0 by 1e-9 and look for divergence
#[test]
fn h0_5_sensitive_to_initial_conditions() {
    let config = chaotic_config();
    let mut perturbed = config.clone();
    perturbed.q0 += 1e-9;
    let a = double_pendulum::simulate(&config).unwrap();
    let b = double_pendulum::simulate(&perturbed).unwrap();
    let last_a = a.last().unwrap();
    let last_b = b.last().unwrap();
    assert_ne!(last_a.q.to_bits(), last_b.q.to_bits());
}
