//! End-to-end propagation runs.

use proptest::prelude::*;
use spread_core::{DsaaModel, MicModel, MultilayerNetwork, Protocol, RandomSelector, SeedingBudget};
use spread_sim::topology::small_world;
use spread_sim::{
    dsaa_compartments, dsaa_network, Logger, ScenarioId, ScenarioRunner, SimContext, SimError,
    SimState, Simulator, StopReason,
};
use std::collections::HashMap;

fn dsaa_run(seed: u64, n_epochs: usize) -> Logger {
    let model = DsaaModel::new(dsaa_compartments().unwrap()).unwrap();
    let mut sim = Simulator::new(model, dsaa_network(), SimContext::new(seed));
    sim.perform_propagation(n_epochs, None).unwrap()
}

fn cascade_sim(seed: u64) -> Simulator<MicModel> {
    let ctx = SimContext::new(seed);
    let a = small_world(80, 4, 0.2, &mut ctx.derive_rng(1));
    let b = small_world(80, 4, 0.2, &mut ctx.derive_rng(2));
    let net = MultilayerNetwork::from_layers(vec![a, b], Some(vec!["a".into(), "b".into()])).unwrap();
    let model = MicModel::new(
        SeedingBudget::Percent(vec![90.0, 10.0, 0.0]),
        RandomSelector,
        Protocol::Or,
        0.4,
    )
    .unwrap();
    Simulator::new(model, net, ctx)
}

#[test]
fn test_epoch_zero_matches_budget() {
    let logger = dsaa_run(42, 10);
    let tables = logger.converted();
    assert_eq!(tables["ill"].states, vec!["S", "I", "R"]);
    assert_eq!(tables["ill"].rows[0], vec![64, 10, 3]);
    assert_eq!(tables["aware"].rows[0], vec![59, 18]);
    assert_eq!(tables["vacc"].rows[0], vec![69, 8]);
}

#[test]
fn test_ill_process_is_monotone() {
    let logger = dsaa_run(42, 10);
    let ill = &logger.converted()["ill"];
    assert_eq!(ill.epochs(), 11);
    for epoch in 1..ill.epochs() {
        let prev = |s| ill.get(epoch - 1, s).unwrap();
        let curr = |s| ill.get(epoch, s).unwrap();
        assert!(curr("S") <= prev("S"), "S grew at epoch {epoch}");
        assert!(curr("R") >= prev("R"), "R shrank at epoch {epoch}");
        assert!(curr("I") + curr("R") >= prev("I") + prev("R"));
    }
    assert!(ill.get(10, "S").unwrap() <= 64);
    assert!(ill.get(10, "R").unwrap() >= 3);
}

#[test]
fn test_population_is_conserved() {
    let logger = dsaa_run(7, 20);
    for table in logger.converted().values() {
        for row in &table.rows {
            assert_eq!(row.iter().sum::<usize>(), 77);
        }
    }
}

#[test]
fn test_same_seed_same_logs() {
    let a = dsaa_run(1234, 15);
    let b = dsaa_run(1234, 15);
    assert_eq!(a.converted(), b.converted());
    assert_eq!(a.get_detailed_logs(), b.get_detailed_logs());
}

#[test]
fn test_activated_actors_never_change() {
    let logger = cascade_sim(5).perform_propagation(30, None).unwrap();
    let mut activated_at: HashMap<(String, String), usize> = HashMap::new();
    for (epoch, buffers) in logger.get_detailed_logs() {
        for buffer in buffers {
            let key = (buffer.actor.to_string(), buffer.layer.clone());
            assert!(
                !activated_at.contains_key(&key),
                "{buffer} changed after being activated"
            );
            if buffer.new_state == MicModel::ACTIVATED {
                activated_at.insert(key, *epoch);
            }
        }
    }
}

#[test]
fn test_patience_stops_cascade_early() {
    let mut sim = cascade_sim(11);
    let logger = sim.perform_propagation(500, Some(1)).unwrap();
    assert!(logger.epochs() < 500);
    match sim.state() {
        SimState::Stopped(StopReason::Patience { epoch }) => assert_eq!(epoch, logger.epochs()),
        other => panic!("unexpected state {other}"),
    }

    // the last two snapshots are identical
    let table = &logger.converted()["a"];
    let n = table.rows.len();
    assert_eq!(table.rows[n - 1], table.rows[n - 2]);
    assert_eq!(table.get(n - 1, MicModel::ACTIVE), Some(0));
}

#[test]
fn test_zero_patience_is_rejected() {
    let mut sim = cascade_sim(11);
    assert!(matches!(
        sim.perform_propagation(10, Some(0)),
        Err(SimError::InvalidPatience)
    ));
}

#[test]
fn test_runner_reports_all_scenarios() {
    let runner = ScenarioRunner::new(99).with_epochs(200).with_patience(Some(3));
    for scenario in ScenarioId::all() {
        let result = runner.run(scenario).unwrap();
        assert!(result.passed, "{scenario}: {:?}", result.failure_reason);
        assert!(result.epochs_run <= 200);
        assert_eq!(result.final_counts, *result.logger.get_aggregated_logs().last().unwrap());
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(8))]

    #[test]
    fn prop_runs_conserve_and_repeat(seed in any::<u64>()) {
        let a = dsaa_run(seed, 5);
        let b = dsaa_run(seed, 5);
        prop_assert_eq!(a.converted(), b.converted());
        for table in a.converted().values() {
            prop_assert_eq!(table.rows.len(), 6);
            for row in &table.rows {
                prop_assert_eq!(row.iter().sum::<usize>(), 77);
            }
        }
    }

    #[test]
    fn prop_cascade_seeds_follow_budget(seed in any::<u64>()) {
        let logger = cascade_sim(seed).perform_propagation(3, None).unwrap();
        for table in logger.converted().values() {
            prop_assert_eq!(table.get(0, MicModel::ACTIVE), Some(8));
            prop_assert_eq!(table.get(0, MicModel::INACTIVE), Some(72));
        }
    }
}
