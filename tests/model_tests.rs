use backpressure_engine::*;
use proptest::prelude::*;

fn arb_mode() -> impl Strategy<Value = DatabaseMode> {
    prop_oneof![Just(DatabaseMode::Postgres), Just(DatabaseMode::MongoDb)]
}

fn arb_input() -> impl Strategy<Value = SimulationInput> {
    (0u64..=200_000, arb_mode(), 1u32..=8, 1u32..=8)
        .prop_map(|(rate, db, brokers, executors)| SimulationInput::new(rate, db, brokers, executors))
}

/// Valid parameter sets away from the defaults: any thresholds and unit
/// capacities, batch timings anywhere inside the one-minute window.
fn arb_params() -> impl Strategy<Value = ModelParams> {
    (
        (1u64..=100_000, 1u64..=100_000),
        (0u64..=100_000, 0u64..=100_000),
        0.0f64..=1.0,
        0.0f64..=0.01,
        (1.0f64..=60.0, 1.0f64..=60.0, 1.0f64..=60.0, 1.0f64..=60.0),
    )
        .prop_map(|((broker, executor), (t1, t2), factor, growth, (b, s, sc, pc))| {
            let base = b.min(s).min(sc).min(pc);
            ModelParams {
                broker_unit_capacity: broker,
                executor_unit_capacity: executor,
                postgres_degrade_threshold: t1.min(t2),
                postgres_stall_threshold: t1.max(t2),
                degraded_write_factor: factor,
                batch_growth_per_message: growth,
                base_batch_secs: base,
                stall_batch_secs: s,
                sink_batch_cap_secs: sc,
                processing_batch_cap_secs: pc,
            }
        })
}

// ── Rate bounds ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn actual_sent_never_exceeds_target(input in arb_input()) {
        let e = evaluate(&input);
        prop_assert!(e.state.actual_sent <= input.target_rate);
    }

    #[test]
    fn processed_rate_within_processing_capacity(input in arb_input()) {
        let e = evaluate(&input);
        prop_assert!(e.state.processed_rate <= e.capacity.processing_capacity);
    }

    #[test]
    fn utilizations_are_percentages(input in arb_input()) {
        let m = evaluate(&input).metrics;
        prop_assert!(m.broker_utilization <= 100);
        prop_assert!(m.processing_utilization <= 100);
    }

    #[test]
    fn batch_duration_bounded(input in arb_input()) {
        let d = evaluate(&input).metrics.batch_duration;
        prop_assert!((1.0..=60.0).contains(&d), "batch duration {} out of range", d);
    }

    #[test]
    fn batch_duration_bounded_for_any_valid_params(input in arb_input(), params in arb_params()) {
        prop_assert!(params.validate().is_ok());
        let d = evaluate_with(&input, &params).metrics.batch_duration;
        prop_assert!((1.0..=60.0).contains(&d), "batch duration {} out of range for {:?}", d, params);
    }
}

// ── Sink policy ──────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn mongodb_never_overflows_or_stalls(rate in 0u64..=1_000_000, brokers in 1u32..=4, executors in 1u32..=4) {
        let e = evaluate(&SimulationInput::new(rate, DatabaseMode::MongoDb, brokers, executors));
        prop_assert_eq!(e.overflow.sink_overflow, 0);
        prop_assert!(!e.state.full_db_stall);
        prop_assert_eq!(e.tiers.sink, SinkState::Nominal);
    }

    #[test]
    fn postgres_stalls_exactly_above_fifty_thousand(rate in 0u64..=100_000) {
        let e = evaluate(&SimulationInput::new(rate, DatabaseMode::Postgres, 1, 1));
        prop_assert_eq!(e.state.full_db_stall, rate > 50_000);
        if e.state.full_db_stall {
            prop_assert_eq!(e.state.processed_rate, 0);
            prop_assert_eq!(e.metrics.batch_duration, 30.0);
        }
    }
}

// ── Precedence ───────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn processing_overflow_always_becomes_the_lag(input in arb_input()) {
        let e = evaluate(&input);
        if e.overflow.processing_overflow > 0 {
            prop_assert_eq!(e.state.unified_lag, e.overflow.processing_overflow);
        } else {
            prop_assert_eq!(
                e.state.unified_lag,
                e.overflow.broker_overflow.max(e.overflow.sink_overflow)
            );
        }
    }

    #[test]
    fn broker_utilization_non_increasing_in_broker_count(
        rate in 0u64..=400_000,
        mode in arb_mode(),
        brokers in 1u32..=10,
        executors in 1u32..=4,
    ) {
        let fewer = evaluate(&SimulationInput::new(rate, mode, brokers, executors));
        let more = evaluate(&SimulationInput::new(rate, mode, brokers + 1, executors));
        prop_assert!(more.metrics.broker_utilization <= fewer.metrics.broker_utilization);
    }

    #[test]
    fn capacity_model_is_idempotent(input in arb_input()) {
        prop_assert_eq!(evaluate(&input), evaluate(&input));
    }
}

// ── Worked examples ──────────────────────────────────────────────────────

#[test]
fn postgres_sixty_thousand_full_stall() {
    let e = evaluate(&SimulationInput::new(60_000, DatabaseMode::Postgres, 1, 1));
    assert_eq!(e.overflow.write_speed, 0);
    assert!(e.state.full_db_stall);
    assert_eq!(e.state.processed_rate, 0);
    assert_eq!(e.metrics.batch_duration, 30.0);
}

#[test]
fn postgres_thirty_thousand_half_speed() {
    let e = evaluate(&SimulationInput::new(30_000, DatabaseMode::Postgres, 1, 1));
    assert_eq!(e.overflow.write_speed, 15_000);
    assert_eq!(e.overflow.sink_overflow, 15_000);
    assert_eq!(e.overflow.processing_overflow, 0);
    assert_eq!(e.state.unified_lag, 15_000);
    assert_eq!(e.state.processed_rate, 15_000);
}

#[test]
fn mongodb_ninety_thousand_processing_dominates() {
    let e = evaluate(&SimulationInput::new(90_000, DatabaseMode::MongoDb, 1, 1));
    assert_eq!(e.overflow.broker_overflow, 40_000);
    assert_eq!(e.overflow.processing_overflow, 50_000);
    assert_eq!(e.state.unified_lag, 50_000);
    assert_eq!(e.state.processed_rate, 40_000);
}

#[test]
fn evaluation_serializes_for_the_renderer() {
    let e = evaluate(&SimulationInput::default());
    let json = serde_json::to_value(e).expect("test: evaluation serializes");
    assert_eq!(json["state"]["lag_source"], "none");
    assert_eq!(json["tiers"]["sink"], "nominal");
    assert_eq!(json["metrics"]["processed_rate"], 20);
}
