//! Snapshot save/restore against running engines.

#![allow(clippy::pedantic, clippy::nursery)]

use log as _;
use proptest::prelude::*;
use rstest as _;
use serde as _;
use serde_json::json;
use thiserror as _;

use vm_core::{
    BufferedHost, Engine, MemoryImage, Register, RunState, Snapshot, SnapshotError, StepOutcome,
    SuspendReason,
};

const R0: u16 = 32768;

fn echo_engine() -> Engine {
    Engine::new(MemoryImage::from_words(vec![20, R0, 19, R0, 6, 0]))
}

#[test]
fn suspended_engine_resumes_identically_after_restore() {
    let mut original = echo_engine();
    let mut host = BufferedHost::default();
    host.input.push_line("hi");
    original.run(&mut host);

    let bytes = original.save().to_bytes().expect("encode");
    let mut restored = echo_engine();
    restored.restore(Snapshot::from_bytes(&bytes).expect("decode"));
    assert_eq!(restored.state(), original.state());

    let mut a = BufferedHost::default();
    let mut b = BufferedHost::default();
    a.input.push_line("x");
    b.input.push_line("x");
    original.run(&mut a);
    restored.run(&mut b);
    assert_eq!(a.output, b.output);
    assert_eq!(restored.state(), original.state());
}

#[test]
fn halted_snapshot_restores_halted() {
    let mut engine = Engine::new(MemoryImage::from_words(vec![0]));
    engine.run(&mut BufferedHost::default());
    let snapshot = engine.save();

    let mut fresh = Engine::default();
    fresh.restore(snapshot);
    assert_eq!(fresh.run_state(), RunState::Halted { code: 1 });
    assert_eq!(fresh.halt_reason(), Some(vm_core::HaltReason::Restored));
    assert!(matches!(
        fresh.step(1, &mut BufferedHost::default()),
        StepOutcome::Halted { code: 1, .. }
    ));
}

#[test]
fn restore_clears_suspension() {
    let mut engine = echo_engine();
    let snapshot = engine.save();
    engine.run(&mut BufferedHost::default());
    assert_eq!(
        engine.run_state(),
        RunState::Suspended(SuspendReason::NeedsInput)
    );
    engine.restore(snapshot);
    assert_eq!(engine.run_state(), RunState::Running);
}

#[test]
fn wire_format_carries_integer_version() {
    let bytes = echo_engine().save().to_bytes().expect("encode");
    let value: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(value["version"], json!(1));
    assert_eq!(value["pc"], json!(0));
    assert_eq!(value["registers"], json!([0, 0, 0, 0, 0, 0, 0, 0]));
}

#[test]
fn future_version_is_rejected_before_parsing_fields() {
    let bytes = serde_json::to_vec(&json!({ "version": 2, "layout": "unknown" })).expect("json");
    assert!(matches!(
        Snapshot::from_bytes(&bytes),
        Err(SnapshotError::UnsupportedVersion(2))
    ));
}

proptest! {
    #[test]
    fn arbitrary_state_round_trips(
        memory in proptest::collection::vec(any::<u16>(), 0..64),
        registers in proptest::array::uniform8(0u16..32768),
        stack in proptest::collection::vec(any::<u16>(), 0..16),
        pc in proptest::option::of(0usize..64),
    ) {
        let mut engine = Engine::new(MemoryImage::from_words(memory));
        for (reg, value) in Register::ALL.into_iter().zip(registers) {
            engine.set_register(reg, value);
        }
        for value in &stack {
            engine.push(*value);
        }
        match pc {
            Some(addr) => engine.jump(addr),
            None => {
                engine.halt();
            }
        }

        let bytes = engine.save().to_bytes().expect("encode");
        let mut restored = Engine::default();
        restored.restore(Snapshot::from_bytes(&bytes).expect("decode"));
        prop_assert_eq!(restored.state(), engine.state());
    }
}
