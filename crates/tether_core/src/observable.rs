//! The observable-value capability
//!
//! Anything that exposes a current value plus change subscription can take
//! part in a binding. Widget properties (colors, widths, text) implement
//! [`Observable`] and, when writable, [`Property`]; the binding machinery
//! never sees more of them than that.

use crate::error::Result;
use slotmap::new_key_type;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

new_key_type! {
    /// Handle returned when registering a listener, used to remove it again
    pub struct ListenerId;
}

/// A change listener, called with `(old, new)`
pub type ChangeListener<T> = Rc<dyn Fn(&T, &T)>;

/// Process-unique identity of an observable
///
/// Identity is assigned once at creation and never reused, so registry
/// entries can never be confused with an observable that happens to live at
/// a recycled address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObservableId(u64);

static NEXT_OBSERVABLE_ID: AtomicU64 = AtomicU64::new(1);

impl ObservableId {
    /// Allocate a fresh identity
    pub fn next() -> Self {
        ObservableId(NEXT_OBSERVABLE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value
    pub fn to_raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObservableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Anything that carries an [`ObservableId`]
///
/// Registry queries only need identity, so they accept any `Identified`
/// value instead of requiring the value type.
pub trait Identified {
    fn observable_id(&self) -> ObservableId;
}

impl Identified for ObservableId {
    fn observable_id(&self) -> ObservableId {
        *self
    }
}

/// Non-owning counterpart of a shared handle
///
/// Bindings reach their endpoints through weak handles, so a binding never
/// keeps a property alive.
pub trait Downgrade: Sized {
    type Weak: 'static;

    fn downgrade(&self) -> Self::Weak;

    /// The strong handle again, or `None` once the value has been dropped
    fn upgrade(weak: &Self::Weak) -> Option<Self>;
}

/// A readable value whose changes can be subscribed to
///
/// Implementors are cheap shared handles: cloning yields another handle to
/// the same underlying value.
pub trait Observable<T>: Identified + Downgrade + Clone + 'static {
    /// Current value
    fn get(&self) -> T;

    /// Register a listener that fires on every change, in registration order
    fn add_listener(&self, listener: ChangeListener<T>) -> ListenerId;

    /// Register a listener that removes itself before its first invocation
    fn add_one_shot_listener(&self, listener: ChangeListener<T>) -> ListenerId;

    /// Remove a listener, returning whether it was registered
    fn remove_listener(&self, id: ListenerId) -> bool;
}

/// A writable [`Observable`]
pub trait Property<T>: Observable<T> {
    /// Write a value. Implementations may refuse, e.g. when bound.
    fn set_value(&self, value: T) -> Result<()>;
}
