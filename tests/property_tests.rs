//! Property-based tests for guarded calls.
//!
//! These tests use proptest to drive an instance through random call
//! sequences and check that the field and notifications stay consistent.

use fsmguard::builder::{RegistryBuilder, TransitionBuilder};
use fsmguard::core::{Condition, FieldSchema, StateField, Stateful};
use fsmguard::engine::{TransitionError, TransitionEvent, TransitionExecutor};
use fsmguard::state_enum;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

state_enum! {
    enum Light {
        Red,
        Green,
        Yellow,
        Off,
        Blinking,
    }
}

const OPERATIONS: [&str; 6] = ["switch", "pick", "off", "guarded", "boom", "missing"];

struct Lamp {
    light: StateField<Light>,
}

impl Stateful for Lamp {
    type State = Light;
    /// Label the logic hands back, if any.
    type Args = Option<Light>;
    type Error = String;

    fn state_field(&self, name: &str) -> Option<&StateField<Light>> {
        (name == "light").then_some(&self.light)
    }

    fn state_field_mut(&mut self, name: &str) -> Option<&mut StateField<Light>> {
        (name == "light").then_some(&mut self.light)
    }
}

fn echo(_: &mut Lamp, target: &Option<Light>) -> Result<Option<Light>, String> {
    Ok(target.clone())
}

/// Executor plus a counter of emitted notifications.
fn lamp_executor() -> (TransitionExecutor<Lamp>, Arc<AtomicUsize>) {
    let registry = RegistryBuilder::<Lamp>::new()
        .field(FieldSchema::new(
            "light",
            [Light::Red, Light::Green, Light::Yellow, Light::Off],
            Light::Red,
        ))
        .unwrap()
        .transition(
            TransitionBuilder::<Lamp>::new("switch")
                .field("light")
                .from_any_but_same()
                .to_dynamic()
                .logic(echo),
        )
        .unwrap()
        .transition(
            TransitionBuilder::<Lamp>::new("pick")
                .field("light")
                .from_any()
                .to_one_of([Light::Red, Light::Green])
                .logic(echo),
        )
        .unwrap()
        .transition(
            TransitionBuilder::<Lamp>::new("off")
                .field("light")
                .from_any()
                .to(Light::Off)
                .succeeds(),
        )
        .unwrap()
        .transition(
            TransitionBuilder::<Lamp>::new("guarded")
                .field("light")
                .from_any()
                .to(Light::Green)
                .condition(Condition::named("has_target", |_: &Lamp, target: &Option<Light>| {
                    target.is_some()
                }))
                .succeeds(),
        )
        .unwrap()
        .transition(
            TransitionBuilder::<Lamp>::new("boom")
                .field("light")
                .from_states([Light::Red, Light::Yellow])
                .to(Light::Green)
                .on_error(Light::Off)
                .logic(|_: &mut Lamp, _: &Option<Light>| Err("fuse blown".to_string())),
        )
        .unwrap()
        .build()
        .unwrap();

    let counter = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&counter);
    let executor = TransitionExecutor::new(Arc::new(registry)).on_transition(
        move |_: &TransitionEvent<'_, Lamp>| {
            sink.fetch_add(1, Ordering::SeqCst);
        },
    );
    (executor, counter)
}

fn lamp_in(executor: &TransitionExecutor<Lamp>, state: Light) -> Lamp {
    let registry = executor.registry();
    let mut snapshot = registry.new_field("light").unwrap().snapshot();
    snapshot.value = state;
    Lamp {
        light: registry.load_field(&snapshot).unwrap(),
    }
}

prop_compose! {
    fn field_state()(variant in 0..4u8) -> Light {
        match variant {
            0 => Light::Red,
            1 => Light::Green,
            2 => Light::Yellow,
            _ => Light::Off,
        }
    }
}

prop_compose! {
    fn any_label()(variant in 0..5u8) -> Light {
        Light::all()[variant as usize].clone()
    }
}

fn call() -> impl Strategy<Value = (&'static str, Option<Light>)> {
    (
        prop::sample::select(OPERATIONS.to_vec()),
        prop::option::of(any_label()),
    )
}

proptest! {
    #[test]
    fn value_stays_within_allowed_set(
        start in field_state(),
        calls in prop::collection::vec(call(), 0..20)
    ) {
        let (executor, _) = lamp_executor();
        let mut lamp = lamp_in(&executor, start);

        for (operation, target) in calls {
            let _ = executor.execute(&mut lamp, operation, &target);
            prop_assert!(lamp.light.allows(lamp.light.value()));
            prop_assert_ne!(lamp.light.value(), &Light::Blinking);
        }
    }

    #[test]
    fn notifications_match_commits(
        start in field_state(),
        calls in prop::collection::vec(call(), 0..20)
    ) {
        let (executor, counter) = lamp_executor();
        let mut lamp = lamp_in(&executor, start);
        let mut commits = 0;

        for (operation, target) in calls {
            let before = lamp.light.value().clone();
            match executor.execute(&mut lamp, operation, &target) {
                Ok(_) => commits += 1,
                Err(TransitionError::Logic { .. }) => {
                    prop_assert_eq!(lamp.light.value(), &Light::Off);
                    commits += 1;
                }
                Err(_) => {
                    prop_assert_eq!(lamp.light.value(), &before);
                }
            }
        }

        prop_assert_eq!(counter.load(Ordering::SeqCst), commits);
    }

    #[test]
    fn any_source_accepts_every_state(start in field_state()) {
        let (executor, _) = lamp_executor();
        let mut lamp = lamp_in(&executor, start);

        prop_assert!(executor.execute(&mut lamp, "off", &None).is_ok());
        prop_assert_eq!(lamp.light.value(), &Light::Off);
    }

    #[test]
    fn any_but_same_never_commits_the_source(
        start in field_state(),
        target in prop::option::of(any_label())
    ) {
        let (executor, _) = lamp_executor();
        let mut lamp = lamp_in(&executor, start.clone());

        match executor.execute(&mut lamp, "switch", &target) {
            Ok(returned) => {
                prop_assert_ne!(lamp.light.value(), &start);
                prop_assert_eq!(Some(lamp.light.value().clone()), returned);
            }
            Err(error) => {
                let is_invalid_destination = matches!(error, TransitionError::InvalidDestination { .. });
                prop_assert!(is_invalid_destination);
                prop_assert_eq!(lamp.light.value(), &start);
            }
        }
    }

    #[test]
    fn one_of_rejects_labels_outside_the_set(
        start in field_state(),
        target in any_label()
    ) {
        let (executor, _) = lamp_executor();
        let mut lamp = lamp_in(&executor, start.clone());
        let in_set = matches!(target, Light::Red | Light::Green);

        let result = executor.execute(&mut lamp, "pick", &Some(target.clone()));

        prop_assert_eq!(result.is_ok(), in_set);
        if in_set {
            prop_assert_eq!(lamp.light.value(), &target);
        } else {
            prop_assert_eq!(lamp.light.value(), &start);
        }
    }

    #[test]
    fn can_call_agrees_with_rejections(
        start in field_state(),
        (operation, target) in call()
    ) {
        let (executor, _) = lamp_executor();
        let mut lamp = lamp_in(&executor, start);

        let predicted = executor.can_call(&lamp, operation, &target);
        let result = executor.execute(&mut lamp, operation, &target);

        match result {
            Err(ref error) if error.is_rejection() => {
                prop_assert!(!predicted);
            }
            _ => {
                prop_assert!(predicted);
            }
        }
    }

    #[test]
    fn snapshot_loads_into_a_fresh_instance(start in field_state()) {
        let (executor, _) = lamp_executor();
        let lamp = lamp_in(&executor, start.clone());

        let bytes = lamp.light.snapshot().to_bytes().unwrap();
        let stored = fsmguard::FieldSnapshot::from_bytes(&bytes).unwrap();

        let fresh = Lamp {
            light: executor.registry().load_field(&stored).unwrap(),
        };
        prop_assert_eq!(fresh.light.value(), &start);
        prop_assert!(fresh.light.is_readonly());
    }
}
