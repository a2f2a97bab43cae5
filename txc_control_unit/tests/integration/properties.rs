//! Property-based tests for the engine and guards.

use std::time::{Duration, Instant};

use proptest::prelude::*;
use txc_common::snapshot::SensorSnapshot;
use txc_common::state::State;
use txc_control_unit::state::context::ControlContext;
use txc_control_unit::state::engine::{Engine, latch_fault};
use txc_control_unit::state::guards::{GuardConfig, select_target};
use txc_hal::FakeDevice;

prop_compose! {
    fn arbitrary_state()(raw in 0..5u8) -> State {
        State::from_u8(raw).unwrap_or_default()
    }
}

prop_compose! {
    /// Snapshot over the first 8 sensor and switch channels.
    fn arbitrary_levels()(sensors in any::<u8>(), switches in any::<u8>()) -> (u8, u8) {
        (sensors, switches)
    }
}

fn snapshot(base: Instant, offset_ms: u64, (sensors, switches): (u8, u8)) -> SensorSnapshot {
    let mut snap = SensorSnapshot::at(base + Duration::from_millis(offset_ms));
    for ch in 0..8u8 {
        snap = snap
            .with_sensor(ch, sensors & (1 << ch) != 0)
            .with_switch(ch, switches & (1 << ch) != 0);
    }
    snap
}

proptest! {
    #[test]
    fn fault_is_absorbing(
        script in prop::collection::vec((arbitrary_levels(), 0..5_000u64), 1..20),
    ) {
        let engine = Engine::default();
        let mut ctx = ControlContext::default();
        let mut dev = FakeDevice::new();
        let t0 = Instant::now();
        latch_fault(&mut ctx, &mut dev, "property", t0);
        dev.clear_calls();

        for (levels, offset) in script {
            engine.evaluate(&snapshot(t0, offset, levels), &mut ctx, &mut dev).unwrap();
            prop_assert_eq!(ctx.current(), State::Fault);
            prop_assert_eq!(ctx.target(), State::Fault);
        }
        prop_assert!(dev.calls().is_empty());
    }

    #[test]
    fn guards_are_pure(
        state in arbitrary_state(),
        levels in arbitrary_levels(),
        in_state_ms in 0..3_000u64,
    ) {
        let guards = GuardConfig::default();
        let snap = snapshot(Instant::now(), 0, levels);
        let dwell = Duration::from_millis(in_state_ms);
        let first = select_target(state, &snap, dwell, &guards);
        let second = select_target(state, &snap, dwell, &guards);
        prop_assert_eq!(first, second);
        prop_assert_ne!(first, Some(State::Fault));
    }

    #[test]
    fn one_evaluate_commits_any_requested_state(
        target in arbitrary_state(),
        levels in arbitrary_levels(),
    ) {
        prop_assume!(target != State::Idle && target != State::Fault);
        let engine = Engine::default();
        let mut ctx = ControlContext::default();
        let mut dev = FakeDevice::new();
        ctx.request_transition(target);

        engine.evaluate(&snapshot(Instant::now(), 0, levels), &mut ctx, &mut dev).unwrap();
        prop_assert_eq!(ctx.current(), target);
        prop_assert_eq!(ctx.transitions(), 1);
        prop_assert_eq!(dev.calls().len(), 1);
    }
}
