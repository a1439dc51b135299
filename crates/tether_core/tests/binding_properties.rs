//! Behavioral guarantees of properties and bindings, exercised through the
//! public API only.

use proptest::prelude::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tether_core::{BindingError, BindingRegistry, ChangeSignal, SynchronizedValue};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn property<T: Clone + PartialEq + 'static>(
    registry: &BindingRegistry,
    initial: T,
) -> SynchronizedValue<T> {
    SynchronizedValue::builder(initial).registry(registry).build()
}

fn counter<T: Clone + 'static>(p: &SynchronizedValue<T>) -> Rc<Cell<usize>> {
    let calls = Rc::new(Cell::new(0));
    let c = Rc::clone(&calls);
    p.subscribe(move |_, _| c.set(c.get() + 1));
    calls
}

#[test]
fn self_binding_fails_and_leaves_no_entry() {
    init_tracing();
    let registry = BindingRegistry::new();
    let p = property(&registry, "x".to_string());

    assert!(matches!(p.bind(&p), Err(BindingError::InvalidArgument(_))));
    assert!(matches!(
        p.bind_bidirectional(&p),
        Err(BindingError::InvalidArgument(_))
    ));
    assert!(registry.records().is_empty());
    assert!(!p.is_bound());
}

#[test]
fn unidirectional_binding_tracks_until_unbound() {
    init_tracing();
    let registry = BindingRegistry::new();
    let a = property(&registry, 0);
    let b = property(&registry, 1);

    a.bind(&b).unwrap();
    assert!(a.is_bound());
    b.set(2).unwrap();
    assert_eq!(a.get(), 2);

    a.unbind();
    assert!(!a.is_bound());
    b.set(3).unwrap();
    assert_eq!(a.get(), 2);
}

#[test]
fn bidirectional_change_updates_other_side_once() {
    init_tracing();
    let registry = BindingRegistry::new();
    let a = property(&registry, 0);
    let b = property(&registry, 0);
    a.bind_bidirectional(&b).unwrap();
    let a_calls = counter(&a);
    let b_calls = counter(&b);

    b.set(1).unwrap();
    assert_eq!(a.get(), 1);
    assert_eq!((a_calls.get(), b_calls.get()), (1, 1));

    a.set(2).unwrap();
    assert_eq!(b.get(), 2);
    assert_eq!((a_calls.get(), b_calls.get()), (2, 2));
}

#[test]
fn bidirectional_partners_do_not_chain() {
    init_tracing();
    let registry = BindingRegistry::new();
    let a = property(&registry, 0);
    let b = property(&registry, 0);
    let c = property(&registry, 0);
    a.bind_bidirectional(&b).unwrap();
    a.bind_bidirectional(&c).unwrap();
    let c_calls = counter(&c);

    b.set(4).unwrap();
    assert_eq!(a.get(), 4);
    assert_eq!(c.get(), 0);
    assert_eq!(c_calls.get(), 0);

    a.unbind_bidirectional(&c);
    assert_eq!(registry.bidirectional_sources(&a).len(), 1);
    a.set(5).unwrap();
    assert_eq!((b.get(), c.get()), (5, 0));
}

#[test]
fn set_and_wait_defers_single_notification() {
    init_tracing();
    let registry = BindingRegistry::new();
    let p = property(&registry, "a".to_string());
    let trigger = ChangeSignal::new(0.5_f32);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    p.subscribe(move |_, new: &String| sink.borrow_mut().push(new.clone()));

    p.set_and_wait("b".to_string(), &trigger).unwrap();
    assert_eq!(p.get(), "b");
    assert!(p.is_waiting());
    assert!(seen.borrow().is_empty());

    // The trigger's content is irrelevant, only that it changed
    trigger.set(-3.0);
    assert!(!p.is_waiting());
    assert_eq!(*seen.borrow(), vec!["b".to_string()]);
}

#[test]
fn rebinding_detaches_previous_source() {
    init_tracing();
    let registry = BindingRegistry::new();
    let a = property(&registry, 0);
    let b = property(&registry, 1);
    let c = property(&registry, 2);

    a.bind(&b).unwrap();
    a.bind(&c).unwrap();
    assert_eq!(b.listener_count(), 0);
    assert_eq!(a.get(), 2);

    b.set(10).unwrap();
    assert_eq!(a.get(), 2);
    c.set(20).unwrap();
    assert_eq!(a.get(), 20);
    assert_eq!(registry.stats().unidirectional, 1);
}

#[test]
fn default_registry_is_shared_by_plain_constructors() {
    let a = SynchronizedValue::new(1u8);
    let b = SynchronizedValue::new(2u8);
    assert!(a.registry().ptr_eq(&BindingRegistry::current()));

    a.bind(&b).unwrap();
    assert!(BindingRegistry::current().is_bound(&a));
    a.dispose();
    b.dispose();
    assert!(BindingRegistry::current().stats().is_empty());
}

#[test]
fn dropped_properties_release_their_bindings() {
    init_tracing();
    let registry = BindingRegistry::current();
    let before = registry.stats().records;
    {
        let a = SynchronizedValue::new(0);
        let b = SynchronizedValue::new(1);
        let c = SynchronizedValue::new(2);
        a.bind(&b).unwrap();
        a.bind_bidirectional(&c).unwrap();
        assert_eq!(registry.stats().records, before + 1);
    }
    assert_eq!(registry.stats().records, before);
}

proptest! {
    #[test]
    fn bidirectional_pair_stays_in_sync(
        writes in proptest::collection::vec((any::<bool>(), -4i32..4), 0..40)
    ) {
        let registry = BindingRegistry::new();
        let a = property(&registry, 0);
        let b = property(&registry, 0);
        a.bind_bidirectional(&b).unwrap();
        let a_calls = counter(&a);
        let b_calls = counter(&b);

        let mut current = 0;
        let mut changes = 0usize;
        for (on_a, value) in writes {
            if on_a {
                a.set(value).unwrap();
            } else {
                b.set(value).unwrap();
            }
            if value != current {
                current = value;
                changes += 1;
            }
            prop_assert_eq!(a.get(), value);
            prop_assert_eq!(b.get(), value);
            prop_assert_eq!(a_calls.get(), changes);
            prop_assert_eq!(b_calls.get(), changes);
        }
    }
}
