//! Change signals: a single observable slot with ordered listeners
//!
//! A [`ChangeSignal`] stores one value and notifies its listeners with
//! `(old, new)` whenever a write changes it. Whether a write counts as a
//! change is decided by the signal's [`Equality`], so floating-point
//! properties can use a tolerance instead of exact comparison.
//!
//! # Notification order
//!
//! Listeners fire in registration order. A pass iterates over a snapshot of
//! the listener ids:
//! - a listener removed during the pass does not fire later in that pass
//! - a listener added during the pass first fires on the next pass
//! - one-shot listeners are removed before they are invoked
//!
//! No internal borrow is held while a listener runs, so listeners may freely
//! write to this or any other signal.
//!
//! ```ignore
//! use tether_core::signal::ChangeSignal;
//!
//! let width = ChangeSignal::new(10.0_f64);
//! width.subscribe(|old, new| println!("width {old} -> {new}"));
//! width.set(12.5);
//! ```

use crate::error::Result;
use crate::observable::{
    ChangeListener, Downgrade, Identified, ListenerId, Observable, ObservableId, Property,
};
use slotmap::SlotMap;
use smallvec::SmallVec;
use std::borrow::Cow;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

/// Decides whether two values are the same for notification purposes
pub type Equality<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Equality for `f64` values that treats differences up to `tolerance` as equal
pub fn f64_tolerance(tolerance: f64) -> Equality<f64> {
    Rc::new(move |a: &f64, b: &f64| a == b || (a - b).abs() <= tolerance)
}

/// Equality for `f32` values that treats differences up to `tolerance` as equal
pub fn f32_tolerance(tolerance: f32) -> Equality<f32> {
    Rc::new(move |a: &f32, b: &f32| a == b || (a - b).abs() <= tolerance)
}

struct ListenerEntry<T> {
    callback: ChangeListener<T>,
    one_shot: bool,
}

struct SignalInner<T> {
    id: ObservableId,
    name: Option<Cow<'static, str>>,
    value: RefCell<T>,
    listeners: RefCell<SlotMap<ListenerId, ListenerEntry<T>>>,
    /// Registration order of the live listeners
    order: RefCell<SmallVec<[ListenerId; 4]>>,
    equality: Equality<T>,
    suspended: Cell<bool>,
    /// Value seen before the first write made while suspended
    pending_old: RefCell<Option<T>>,
}

/// A single observable value slot
///
/// Cloning a `ChangeSignal` yields another handle to the same slot.
pub struct ChangeSignal<T> {
    inner: Rc<SignalInner<T>>,
}

impl<T> Clone for ChangeSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + 'static> ChangeSignal<T> {
    /// Create a signal compared with `PartialEq`
    pub fn new(initial: T) -> Self {
        Self::builder(initial).build()
    }

    /// Start building a signal with a name or custom equality
    pub fn builder(initial: T) -> SignalBuilder<T> {
        SignalBuilder::new(initial)
    }
}

impl<T: Clone + PartialEq + Default + 'static> Default for ChangeSignal<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + 'static> ChangeSignal<T> {
    /// Create a signal for a value type without `PartialEq`, or with
    /// comparison semantics of its own
    pub fn with_equality(initial: T, equality: impl Fn(&T, &T) -> bool + 'static) -> Self {
        SignalBuilder::with_equality(initial, Rc::new(equality)).build()
    }

    fn from_parts(initial: T, name: Option<Cow<'static, str>>, equality: Equality<T>) -> Self {
        Self {
            inner: Rc::new(SignalInner {
                id: ObservableId::next(),
                name,
                value: RefCell::new(initial),
                listeners: RefCell::new(SlotMap::with_key()),
                order: RefCell::new(SmallVec::new()),
                equality,
                suspended: Cell::new(false),
                pending_old: RefCell::new(None),
            }),
        }
    }

    /// The signal's identity
    pub fn id(&self) -> ObservableId {
        self.inner.id
    }

    /// Debug name given at construction
    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    /// Current value
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Borrow the current value without cloning it
    ///
    /// The value stays borrowed while `f` runs, so `f` must not write to
    /// this signal; that panics. Use [`update`](Self::update) to derive a
    /// new value from the current one.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Store a value, notifying listeners if it differs from the old one
    ///
    /// While the signal is suspended the value is stored silently.
    pub fn set(&self, value: T) {
        let old = self.inner.value.replace(value);
        let changed = {
            let current = self.inner.value.borrow();
            !(self.inner.equality)(&old, &current)
        };
        if !changed {
            return;
        }

        if self.inner.suspended.get() {
            let mut pending = self.inner.pending_old.borrow_mut();
            if pending.is_none() {
                *pending = Some(old);
            }
            return;
        }

        let new = self.get();
        self.notify(&old, &new);
    }

    /// Update the value in place from its current value
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.with(f);
        self.set(next);
    }

    /// Notify listeners with `(current, current)` even though nothing changed
    ///
    /// Does nothing while the signal is suspended.
    pub fn fire_value_changed(&self) {
        if self.inner.suspended.get() {
            return;
        }
        let current = self.get();
        self.notify(&current, &current);
    }

    /// Register a closure listener. Shorthand for [`Observable::add_listener`].
    pub fn subscribe(&self, listener: impl Fn(&T, &T) + 'static) -> ListenerId {
        self.register(Rc::new(listener), false)
    }

    /// Register a closure listener that fires at most once
    pub fn subscribe_once(&self, listener: impl Fn(&T, &T) + 'static) -> ListenerId {
        self.register(Rc::new(listener), true)
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Drop every listener
    pub fn clear_listeners(&self) {
        self.inner.listeners.borrow_mut().clear();
        self.inner.order.borrow_mut().clear();
    }

    /// A view of this signal that can be observed but not written
    pub fn read_only(&self) -> ReadOnly<T> {
        ReadOnly {
            signal: self.clone(),
        }
    }

    /// Whether writes are currently stored without notification
    pub fn is_suspended(&self) -> bool {
        self.inner.suspended.get()
    }

    /// Stop notifying listeners until [`resume`](Self::resume)
    pub(crate) fn suspend(&self) {
        self.inner.suspended.set(true);
    }

    /// End a suspension and fire once with `(value before suspension, current)`
    ///
    /// Fires even when the value ended up unchanged.
    pub(crate) fn resume(&self) {
        if !self.inner.suspended.replace(false) {
            return;
        }
        let current = self.get();
        let old = self
            .inner
            .pending_old
            .borrow_mut()
            .take()
            .unwrap_or_else(|| current.clone());
        self.notify(&old, &current);
    }

    fn register(&self, callback: ChangeListener<T>, one_shot: bool) -> ListenerId {
        let id = self
            .inner
            .listeners
            .borrow_mut()
            .insert(ListenerEntry { callback, one_shot });
        self.inner.order.borrow_mut().push(id);
        id
    }

    fn unregister(&self, id: ListenerId) -> bool {
        let removed = self.inner.listeners.borrow_mut().remove(id).is_some();
        if removed {
            self.inner.order.borrow_mut().retain(|l| *l != id);
        }
        removed
    }

    fn notify(&self, old: &T, new: &T) {
        let snapshot: SmallVec<[ListenerId; 4]> = self.inner.order.borrow().clone();
        for id in snapshot {
            let (callback, one_shot) = {
                let listeners = self.inner.listeners.borrow();
                match listeners.get(id) {
                    Some(entry) => (Rc::clone(&entry.callback), entry.one_shot),
                    // Removed earlier in this pass
                    None => continue,
                }
            };
            if one_shot {
                self.unregister(id);
            }
            callback(old, new);
        }
    }
}

impl<T> Identified for ChangeSignal<T> {
    fn observable_id(&self) -> ObservableId {
        self.inner.id
    }
}

/// Weak handle to a [`ChangeSignal`]
pub struct WeakSignal<T> {
    inner: Weak<SignalInner<T>>,
}

impl<T> Clone for WeakSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<T: 'static> Downgrade for ChangeSignal<T> {
    type Weak = WeakSignal<T>;

    fn downgrade(&self) -> WeakSignal<T> {
        WeakSignal {
            inner: Rc::downgrade(&self.inner),
        }
    }

    fn upgrade(weak: &WeakSignal<T>) -> Option<Self> {
        weak.inner.upgrade().map(|inner| Self { inner })
    }
}

impl<T: Clone + 'static> Observable<T> for ChangeSignal<T> {
    fn get(&self) -> T {
        ChangeSignal::get(self)
    }

    fn add_listener(&self, listener: ChangeListener<T>) -> ListenerId {
        self.register(listener, false)
    }

    fn add_one_shot_listener(&self, listener: ChangeListener<T>) -> ListenerId {
        self.register(listener, true)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.unregister(id)
    }
}

impl<T: Clone + 'static> Property<T> for ChangeSignal<T> {
    fn set_value(&self, value: T) -> Result<()> {
        self.set(value);
        Ok(())
    }
}

impl<T: fmt::Debug> fmt::Debug for ChangeSignal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeSignal")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("value", &*self.inner.value.borrow())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

/// Builder for [`ChangeSignal`]
pub struct SignalBuilder<T> {
    initial: T,
    name: Option<Cow<'static, str>>,
    equality: Equality<T>,
}

impl<T: Clone + PartialEq + 'static> SignalBuilder<T> {
    pub fn new(initial: T) -> Self {
        Self::with_equality(initial, Rc::new(|a: &T, b: &T| a == b))
    }
}

impl<T: Clone + 'static> SignalBuilder<T> {
    pub fn with_equality(initial: T, equality: Equality<T>) -> Self {
        Self {
            initial,
            name: None,
            equality,
        }
    }

    /// Name shown in `Debug` output and log lines
    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Replace the comparison used to decide whether a write is a change
    pub fn equality(mut self, equality: impl Fn(&T, &T) -> bool + 'static) -> Self {
        self.equality = Rc::new(equality);
        self
    }

    pub fn build(self) -> ChangeSignal<T> {
        ChangeSignal::from_parts(self.initial, self.name, self.equality)
    }
}

// =============================================================================
// READ-ONLY VIEW
// =============================================================================

/// An observable view over a [`ChangeSignal`] without write access
pub struct ReadOnly<T> {
    signal: ChangeSignal<T>,
}

impl<T> Clone for ReadOnly<T> {
    fn clone(&self) -> Self {
        Self {
            signal: self.signal.clone(),
        }
    }
}

impl<T: Clone + 'static> ReadOnly<T> {
    pub fn get(&self) -> T {
        self.signal.get()
    }

    pub fn subscribe(&self, listener: impl Fn(&T, &T) + 'static) -> ListenerId {
        self.signal.subscribe(listener)
    }

    pub fn subscribe_once(&self, listener: impl Fn(&T, &T) + 'static) -> ListenerId {
        self.signal.subscribe_once(listener)
    }
}

impl<T> Identified for ReadOnly<T> {
    fn observable_id(&self) -> ObservableId {
        self.signal.observable_id()
    }
}

impl<T: 'static> Downgrade for ReadOnly<T> {
    type Weak = WeakSignal<T>;

    fn downgrade(&self) -> WeakSignal<T> {
        self.signal.downgrade()
    }

    fn upgrade(weak: &WeakSignal<T>) -> Option<Self> {
        ChangeSignal::upgrade(weak).map(|signal| Self { signal })
    }
}

impl<T: Clone + 'static> Observable<T> for ReadOnly<T> {
    fn get(&self) -> T {
        self.signal.get()
    }

    fn add_listener(&self, listener: ChangeListener<T>) -> ListenerId {
        self.signal.add_listener(listener)
    }

    fn add_one_shot_listener(&self, listener: ChangeListener<T>) -> ListenerId {
        self.signal.add_one_shot_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) -> bool {
        self.signal.remove_listener(id)
    }
}

impl<T: fmt::Debug> fmt::Debug for ReadOnly<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ReadOnly").field(&self.signal).finish()
    }
}
