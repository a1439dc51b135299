//! Synchronized properties
//!
//! A [`SynchronizedValue`] is a writable property that can hold back its
//! change notification until some other observable moves. This is how a
//! control updates one of its properties and lets the rest of the UI see the
//! new value only once a related property (say, a selection index) has
//! caught up:
//!
//! ```ignore
//! use tether_core::{ChangeSignal, SynchronizedValue};
//!
//! let text = SynchronizedValue::new(String::from("a"));
//! let selection = ChangeSignal::new(0usize);
//!
//! text.set_and_wait("b".into(), &selection)?;
//! assert_eq!(text.get(), "b");      // stored immediately
//! assert!(text.is_waiting());       // listeners not told yet
//!
//! selection.set(1);                 // trigger moves
//! assert!(!text.is_waiting());      // one notification fired: "a" -> "b"
//! ```
//!
//! Bindings go through the property's [`BindingRegistry`]. A property may be
//! unidirectionally bound to one source and bidirectionally bound to any
//! number of partners. Dropping the last handle to a property removes every
//! binding that mentions it.

use crate::error::{BindingError, Result};
use crate::observable::{
    ChangeListener, Downgrade, Identified, ListenerId, Observable, ObservableId, Property,
};
use crate::registry::{BindingRegistry, Source};
use crate::signal::{ChangeSignal, ReadOnly, SignalBuilder};
use crate::when::When;
use std::borrow::Cow;
use std::fmt;
use std::rc::{Rc, Weak};

struct SyncInner<T> {
    signal: ChangeSignal<T>,
    waiting: ChangeSignal<bool>,
    registry: BindingRegistry,
}

impl<T> Drop for SyncInner<T> {
    fn drop(&mut self) {
        self.registry.dispose(&self.signal.observable_id());
    }
}

/// A property whose notifications can be deferred until a trigger fires
///
/// Cloning yields another handle to the same property.
pub struct SynchronizedValue<T> {
    inner: Rc<SyncInner<T>>,
}

impl<T> Clone for SynchronizedValue<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> SynchronizedValue<T> {
    /// Create a property attached to the thread's default registry
    pub fn new(initial: T) -> Self {
        Self::builder(initial).build()
    }

    pub fn builder(initial: T) -> SynchronizedBuilder<T> {
        SynchronizedBuilder {
            signal: SignalBuilder::new(initial),
            registry: None,
        }
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for SynchronizedValue<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + 'static> SynchronizedValue<T> {
    fn from_parts(signal: ChangeSignal<T>, registry: BindingRegistry) -> Self {
        let waiting = ChangeSignal::builder(false).name("waiting").build();

        // Leaving the waiting state releases the held-back notification
        let gate = signal.clone();
        When::on_changed(&waiting)
            .then(move |_, now_waiting: &bool| {
                if *now_waiting {
                    gate.suspend();
                } else {
                    gate.resume();
                }
            })
            .listen();

        Self {
            inner: Rc::new(SyncInner {
                signal,
                waiting,
                registry,
            }),
        }
    }

    pub fn id(&self) -> ObservableId {
        self.inner.signal.id()
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.signal.name()
    }

    /// The registry this property binds through
    pub fn registry(&self) -> &BindingRegistry {
        &self.inner.registry
    }

    pub fn get(&self) -> T {
        self.inner.signal.get()
    }

    /// Borrow the current value without cloning it
    ///
    /// `f` must not write to this property; that panics.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.inner.signal.with(f)
    }

    /// Write a value, notifying listeners now unless the property is waiting
    ///
    /// Fails with [`BindingError::IllegalState`] while the property is
    /// unidirectionally bound.
    pub fn set(&self, value: T) -> Result<()> {
        if self.is_bound() {
            return Err(BindingError::bound_value());
        }
        self.inner.signal.set(value);
        Ok(())
    }

    /// Store `value` now but hold back the change notification until
    /// `trigger` next changes
    ///
    /// Each call arms its own one-shot listener on its trigger; earlier arms
    /// are not cancelled. Whichever trigger fires first ends the wait.
    pub fn set_and_wait<U, O>(&self, value: T, trigger: &O) -> Result<()>
    where
        U: 'static,
        O: Observable<U>,
    {
        if trigger.observable_id() == self.id() {
            return Err(BindingError::InvalidArgument(
                "a property cannot wait on itself".into(),
            ));
        }
        if self.is_bound() {
            return Err(BindingError::bound_value());
        }

        self.inner.waiting.set(true);
        let property = self.downgrade();
        When::on_changed(trigger)
            .then(move |_, _| {
                if let Some(property) = SynchronizedValue::upgrade(&property) {
                    property.awake();
                }
            })
            .one_shot()
            .listen();
        self.inner.signal.set(value);

        tracing::debug!(
            property = %self.id(),
            trigger = %trigger.observable_id(),
            "value set, waiting for trigger"
        );
        Ok(())
    }

    /// Leave the waiting state, firing one notification with the current
    /// value even if it did not change
    pub fn awake(&self) {
        self.inner.waiting.set(false);
    }

    pub fn is_waiting(&self) -> bool {
        self.inner.waiting.get()
    }

    /// Observable view of the waiting flag
    pub fn waiting(&self) -> ReadOnly<bool> {
        self.inner.waiting.read_only()
    }

    // =========================================================================
    // BINDING
    // =========================================================================

    /// Track `source`, replacing any previous unidirectional binding
    pub fn bind<S: Observable<T>>(&self, source: &S) -> Result<()> {
        if source.observable_id() == self.id() {
            return Err(BindingError::self_binding());
        }
        if self.is_bound() {
            self.unbind();
        }
        self.inner.registry.bind(self).source(source)
    }

    /// Keep this property and `other` equal. Existing bidirectional partners
    /// are kept; a unidirectional binding is removed first.
    pub fn bind_bidirectional<S: Property<T>>(&self, other: &S) -> Result<()> {
        if other.observable_id() == self.id() {
            return Err(BindingError::self_binding());
        }
        if self.is_bound() {
            self.unbind();
        }
        self.inner
            .registry
            .bind_bidirectional(self)
            .add_source(Source::new(other).implicit())?;
        Ok(())
    }

    pub fn unbind(&self) {
        self.inner.registry.unbind(self);
    }

    pub fn unbind_bidirectional(&self, other: &impl Identified) {
        self.inner.registry.unbind_bidirectional(self, other);
    }

    /// Drop every bidirectional link of this property
    pub fn clear_bidirectional(&self) {
        self.inner.registry.dispose_bidirectional(self);
    }

    /// Whether a unidirectional binding controls this property
    ///
    /// Reports `false` while the binding is writing a value into it.
    pub fn is_bound(&self) -> bool {
        let registry = &self.inner.registry;
        registry.is_bound(self) && !registry.is_ignore_binding(self)
    }

    /// Remove every binding that mentions this property and drop its
    /// listeners. A pending wait ends and its held-back change is discarded.
    pub fn dispose(&self) {
        self.inner.registry.dispose(self);
        self.inner.signal.clear_listeners();
        self.awake();
        tracing::debug!(property = %self.id(), "property disposed");
    }

    // =========================================================================
    // LISTENERS
    // =========================================================================

    pub fn subscribe(&self, listener: impl Fn(&T, &T) + 'static) -> ListenerId {
        self.inner.signal.subscribe(listener)
    }

    pub fn subscribe_once(&self, listener: impl Fn(&T, &T) + 'static) -> ListenerId {
        self.inner.signal.subscribe_once(listener)
    }

    pub fn listener_count(&self) -> usize {
        self.inner.signal.listener_count()
    }
}

impl<T> Identified for SynchronizedValue<T> {
    fn observable_id(&self) -> ObservableId {
        self.inner.signal.observable_id()
    }
}

/// Weak handle to a [`SynchronizedValue`]
pub struct WeakSynchronized<T> {
    inner: Weak<SyncInner<T>>,
}

impl<T> Clone for WeakSynchronized<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: 'static> Downgrade for SynchronizedValue<T> {
    type Weak = WeakSynchronized<T>;

    fn downgrade(&self) -> WeakSynchronized<T> {
        WeakSynchronized {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn upgrade(weak: &WeakSynchronized<T>) -> Option<Self> {
        weak.inner.upgrade().map(|inner| Self { inner })
    }
}

impl<T: Clone + 'static> Observable<T> for SynchronizedValue<T> {
    fn get(&self) -> T {
        self.inner.signal.get()
    }

    fn add_listener(&self, listener: ChangeListener<T>) -> ListenerId {
        self.inner.signal.add_listener(listener)
    }

    fn add_one_shot_listener(&self, listener: ChangeListener<T>) -> ListenerId {
        self.inner.signal.add_one_shot_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.inner.signal.remove_listener(id)
    }
}

impl<T: Clone + 'static> Property<T> for SynchronizedValue<T> {
    fn set_value(&self, value: T) -> Result<()> {
        self.set(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for SynchronizedValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynchronizedValue")
            .field("signal", &self.inner.signal)
            .field("waiting", &self.inner.waiting.with(|w| *w))
            .finish()
    }
}

/// Builder for [`SynchronizedValue`]
pub struct SynchronizedBuilder<T> {
    signal: SignalBuilder<T>,
    registry: Option<BindingRegistry>,
}

impl<T: Clone + 'static> SynchronizedBuilder<T> {
    /// Start from a custom equality, for value types without `PartialEq`
    pub fn with_equality(initial: T, equality: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self {
            signal: SignalBuilder::with_equality(initial, Rc::new(equality)),
            registry: None,
        }
    }

    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.signal = self.signal.name(name);
        self
    }

    pub fn equality(mut self, equality: impl Fn(&T, &T) -> bool + 'static) -> Self {
        self.signal = self.signal.equality(equality);
        self
    }

    /// Bind through `registry` instead of the thread's default one
    pub fn registry(mut self, registry: &BindingRegistry) -> Self {
        self.registry = Some(registry.clone());
        self
    }

    pub fn build(self) -> SynchronizedValue<T> {
        let registry = self.registry.unwrap_or_else(BindingRegistry::current);
        SynchronizedValue::from_parts(self.signal.build(), registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    fn property<T: Clone + PartialEq + 'static>(
        registry: &BindingRegistry,
        initial: T,
    ) -> SynchronizedValue<T> {
        SynchronizedValue::builder(initial).registry(registry).build()
    }

    fn recorder<T: Clone + 'static>(p: &SynchronizedValue<T>) -> Rc<RefCell<Vec<(T, T)>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        p.subscribe(move |old: &T, new: &T| sink.borrow_mut().push((old.clone(), new.clone())));
        seen
    }

    #[test]
    fn test_set_fires_immediately() {
        let registry = BindingRegistry::new();
        let p = property(&registry, 1);
        let seen = recorder(&p);

        p.set(2).unwrap();
        assert_eq!(*seen.borrow(), vec![(1, 2)]);
    }

    #[test]
    fn test_set_and_wait_scenario() {
        let registry = BindingRegistry::new();
        let p = property(&registry, "a".to_string());
        let trigger = ChangeSignal::new(0u32);
        let seen = recorder(&p);

        p.set_and_wait("b".to_string(), &trigger).unwrap();
        assert_eq!(p.get(), "b");
        assert!(p.is_waiting());
        assert!(seen.borrow().is_empty());

        trigger.set(1);
        assert!(!p.is_waiting());
        assert_eq!(*seen.borrow(), vec![("a".to_string(), "b".to_string())]);
        assert_eq!(trigger.listener_count(), 0);

        trigger.set(2);
        assert_eq!(seen.borrow().len(), 1);
    }

    #[test]
    fn test_awake_fires_even_without_change() {
        let registry = BindingRegistry::new();
        let p = property(&registry, 5);
        let trigger = ChangeSignal::new(false);
        let seen = recorder(&p);

        p.set_and_wait(5, &trigger).unwrap();
        trigger.set(true);
        assert_eq!(*seen.borrow(), vec![(5, 5)]);
    }

    #[test]
    fn test_awake_when_not_waiting_is_silent() {
        let registry = BindingRegistry::new();
        let p = property(&registry, 0);
        let seen = recorder(&p);
        p.awake();
        assert!(seen.borrow().is_empty());
    }

    #[test]
    fn test_waiting_flag_is_observable() {
        let registry = BindingRegistry::new();
        let p = property(&registry, 0);
        let trigger = ChangeSignal::new(0);
        let transitions = Rc::new(RefCell::new(Vec::new()));
        let t = Rc::clone(&transitions);
        p.waiting().subscribe(move |_, now: &bool| t.borrow_mut().push(*now));

        p.set_and_wait(1, &trigger).unwrap();
        trigger.set(1);
        assert_eq!(*transitions.borrow(), vec![true, false]);
    }

    #[test]
    fn test_writes_while_waiting_collapse() {
        let registry = BindingRegistry::new();
        let p = property(&registry, 0);
        let trigger = ChangeSignal::new(0);
        let seen = recorder(&p);

        p.set_and_wait(1, &trigger).unwrap();
        p.set(2).unwrap();
        p.set(3).unwrap();
        assert!(seen.borrow().is_empty());

        trigger.set(1);
        assert_eq!(*seen.borrow(), vec![(0, 3)]);
    }

    // Known hazard: overlapping waits are not cancelled. The first trigger to
    // fire ends the wait even though the second arm is still pending, and the
    // second trigger later finds nothing to release.
    #[test]
    fn test_overlapping_waits_resolve_on_first_trigger() {
        let registry = BindingRegistry::new();
        let p = property(&registry, "a".to_string());
        let first = ChangeSignal::new(0);
        let second = ChangeSignal::new(0);
        let seen = recorder(&p);

        p.set_and_wait("b".to_string(), &first).unwrap();
        p.set_and_wait("c".to_string(), &second).unwrap();
        assert_eq!(first.listener_count(), 1);
        assert_eq!(second.listener_count(), 1);

        first.set(1);
        assert!(!p.is_waiting());
        assert_eq!(*seen.borrow(), vec![("a".to_string(), "c".to_string())]);
        assert_eq!(second.listener_count(), 1);

        second.set(1);
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(second.listener_count(), 0);
    }

    #[test]
    fn test_wait_on_itself_rejected() {
        let registry = BindingRegistry::new();
        let p = property(&registry, 0);
        let err = p.set_and_wait(1, &p).unwrap_err();
        assert!(matches!(err, BindingError::InvalidArgument(_)));
        assert!(!p.is_waiting());
        assert_eq!(p.get(), 0);
    }

    #[test]
    fn test_trigger_does_not_retain_property() {
        let registry = BindingRegistry::new();
        let trigger = ChangeSignal::new(0);
        let released = Rc::new(Cell::new(false));
        {
            let p = property(&registry, 0);
            let r = Rc::clone(&released);
            p.waiting().subscribe(move |_, now: &bool| r.set(!*now));
            p.set_and_wait(1, &trigger).unwrap();
        }
        // The property is gone; firing the trigger must be harmless
        trigger.set(1);
        assert!(!released.get());
        assert_eq!(trigger.listener_count(), 0);
    }

    #[test]
    fn test_bind_self_rejected() {
        let registry = BindingRegistry::new();
        let p = property(&registry, 0);

        assert!(matches!(p.bind(&p), Err(BindingError::InvalidArgument(_))));
        assert!(matches!(
            p.bind_bidirectional(&p),
            Err(BindingError::InvalidArgument(_))
        ));
        assert!(registry.stats().is_empty());
        assert!(!p.is_bound());
    }

    #[test]
    fn test_bound_property_refuses_direct_writes() {
        let registry = BindingRegistry::new();
        let a = property(&registry, 0);
        let b = property(&registry, 10);

        a.bind(&b).unwrap();
        assert_eq!(a.get(), 10);
        assert!(a.is_bound());
        assert!(matches!(a.set(3), Err(BindingError::IllegalState(_))));
        assert!(a.set_and_wait(3, &b).is_err());

        // Propagated writes still land
        b.set(11).unwrap();
        assert_eq!(a.get(), 11);

        a.unbind();
        a.set(3).unwrap();
        b.set(12).unwrap();
        assert_eq!(a.get(), 3);
    }

    #[test]
    fn test_is_bound_false_while_receiving() {
        let registry = BindingRegistry::new();
        let a = property(&registry, 0);
        let b = property(&registry, 0);
        a.bind(&b).unwrap();

        let during = Rc::new(Cell::new(true));
        let d = Rc::clone(&during);
        let handle = a.clone();
        a.subscribe(move |_, _| d.set(handle.is_bound()));

        b.set(1).unwrap();
        assert!(!during.get());
        assert!(a.is_bound());
    }

    #[test]
    fn test_bind_bidirectional_drops_unidirectional() {
        let registry = BindingRegistry::new();
        let a = property(&registry, 0);
        let b = property(&registry, 1);
        let c = property(&registry, 2);

        a.bind(&b).unwrap();
        a.bind_bidirectional(&c).unwrap();
        assert!(!a.is_bound());
        assert_eq!(a.get(), 2);

        b.set(7).unwrap();
        assert_eq!(a.get(), 2);
        a.set(4).unwrap();
        assert_eq!(c.get(), 4);
    }

    #[test]
    fn test_waiting_property_defers_partner_update() {
        let registry = BindingRegistry::new();
        let a = property(&registry, 0);
        let b = property(&registry, 0);
        let trigger = ChangeSignal::new(0);
        a.bind_bidirectional(&b).unwrap();

        a.set_and_wait(9, &trigger).unwrap();
        assert_eq!(b.get(), 0);
        trigger.set(1);
        assert_eq!(b.get(), 9);
    }

    #[test]
    fn test_clear_bidirectional_keeps_unidirectional() {
        let registry = BindingRegistry::new();
        let a = property(&registry, 0);
        let b = property(&registry, 0);
        let c = property(&registry, 0);
        let d = property(&registry, 0);
        a.bind_bidirectional(&b).unwrap();
        c.bind_bidirectional(&a).unwrap();
        d.bind(&a).unwrap();

        a.clear_bidirectional();
        assert!(!registry.is_bound_bidirectionally(&a));
        assert_eq!(registry.stats().bidirectional, 0);

        b.set(5).unwrap();
        c.set(6).unwrap();
        assert_eq!(a.get(), 0);

        a.set(7).unwrap();
        assert_eq!((b.get(), c.get(), d.get()), (5, 6, 7));
    }

    #[test]
    fn test_dispose_releases_everything() {
        let registry = BindingRegistry::new();
        let a = property(&registry, 0);
        let b = property(&registry, 0);
        let c = property(&registry, 0);
        let d = property(&registry, 0);
        a.bind(&b).unwrap();
        d.bind(&a).unwrap();
        b.bind_bidirectional(&c).unwrap();
        c.bind_bidirectional(&a).unwrap();
        a.subscribe(|_, _| {});

        a.dispose();
        assert_eq!(a.listener_count(), 0);
        assert!(!registry.is_bound(&a));
        assert!(!registry.is_bound(&d));
        assert!(!registry.is_bound_bidirectionally(&a));
        assert_eq!(registry.stats().bidirectional_links, 1);
        assert_eq!(registry.stats().records, 1);
    }

    #[test]
    fn test_dispose_while_waiting_resets() {
        let registry = BindingRegistry::new();
        let p = property(&registry, 0);
        let trigger = ChangeSignal::new(0);
        let early = recorder(&p);

        p.set_and_wait(1, &trigger).unwrap();
        p.dispose();
        assert!(!p.is_waiting());
        assert!(early.borrow().is_empty());

        // The handle keeps working after disposal
        let late = recorder(&p);
        p.set(2).unwrap();
        assert_eq!(*late.borrow(), vec![(1, 2)]);

        trigger.set(1);
        assert_eq!(late.borrow().len(), 1);
    }

    #[test]
    fn test_dropped_properties_leave_no_records() {
        let registry = BindingRegistry::new();
        let hub = property(&registry, 0);
        let source = ChangeSignal::new(0);
        {
            let a = property(&registry, 0);
            let b = property(&registry, 0);
            let c = property(&registry, 0);
            let d = property(&registry, 0);
            a.bind(&b).unwrap();
            c.bind_bidirectional(&d).unwrap();
            hub.bind_bidirectional(&c).unwrap();
            d.bind(&source).unwrap();
            assert_eq!(registry.stats().records, 4);
        }
        assert!(registry.stats().is_empty());
        assert_eq!(hub.listener_count(), 0);
        assert_eq!(source.listener_count(), 0);

        hub.set(3).unwrap();
        source.set(4);
        assert_eq!(hub.get(), 3);
    }

    #[test]
    fn test_bound_pair_is_freed_when_dropped() {
        let registry = BindingRegistry::new();
        let (a_weak, b_weak) = {
            let a = property(&registry, 0);
            let b = property(&registry, 0);
            a.bind_bidirectional(&b).unwrap();
            b.bind(&a).unwrap();
            (a.downgrade(), b.downgrade())
        };
        assert!(SynchronizedValue::upgrade(&a_weak).is_none());
        assert!(SynchronizedValue::upgrade(&b_weak).is_none());
        assert!(registry.stats().is_empty());
    }

    #[test]
    fn test_custom_equality_builder() {
        let registry = BindingRegistry::new();
        let p = SynchronizedBuilder::with_equality(vec![1, 2], |a: &Vec<i32>, b: &Vec<i32>| {
            a.len() == b.len()
        })
        .name("items")
        .registry(&registry)
        .build();
        let seen = recorder(&p);

        p.set(vec![3, 4]).unwrap();
        assert!(seen.borrow().is_empty());
        p.set(vec![1]).unwrap();
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(p.name(), Some("items"));
        assert!(p.registry().ptr_eq(&registry));
    }
}
