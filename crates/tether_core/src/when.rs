//! Fluent listener registration
//!
//! ```ignore
//! use tether_core::when::When;
//!
//! let handle = When::on_changed(&trigger)
//!     .then(|_, _| println!("trigger moved"))
//!     .one_shot()
//!     .listen();
//!
//! // Later, if it never fired:
//! handle.dispose();
//! ```

use crate::observable::{ChangeListener, ListenerId, Observable, ObservableId};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

/// Entry point of the builder
pub struct When;

impl When {
    /// Start describing a reaction to changes of `observable`
    pub fn on_changed<T, O>(observable: &O) -> OnChanged<T, O>
    where
        T: 'static,
        O: Observable<T>,
    {
        OnChanged {
            observable: observable.clone(),
            _marker: PhantomData,
        }
    }
}

/// A reaction without an action yet
pub struct OnChanged<T, O> {
    observable: O,
    _marker: PhantomData<fn(&T)>,
}

impl<T: 'static, O: Observable<T>> OnChanged<T, O> {
    /// The action to run with `(old, new)`
    pub fn then(self, action: impl Fn(&T, &T) + 'static) -> WhenChanged<T, O> {
        WhenChanged {
            observable: self.observable,
            action: Rc::new(action),
            one_shot: false,
        }
    }
}

/// A fully described reaction, ready to [`listen`](WhenChanged::listen)
pub struct WhenChanged<T, O> {
    observable: O,
    action: ChangeListener<T>,
    one_shot: bool,
}

impl<T: 'static, O: Observable<T>> WhenChanged<T, O> {
    /// Remove the listener after its first invocation
    pub fn one_shot(mut self) -> Self {
        self.one_shot = true;
        self
    }

    /// Register the listener
    pub fn listen(self) -> WhenHandle {
        let id = if self.one_shot {
            self.observable.add_one_shot_listener(self.action)
        } else {
            self.observable.add_listener(self.action)
        };
        let observable = self.observable;
        WhenHandle {
            observable: observable.observable_id(),
            listener: id,
            one_shot: self.one_shot,
            remove: Box::new(move |id| observable.remove_listener(id)),
        }
    }
}

/// A registered reaction
///
/// Dropping the handle leaves the listener in place; call
/// [`dispose`](WhenHandle::dispose) to remove it.
pub struct WhenHandle {
    observable: ObservableId,
    listener: ListenerId,
    one_shot: bool,
    remove: Box<dyn Fn(ListenerId) -> bool>,
}

impl WhenHandle {
    /// Identity of the observed value
    pub fn observable(&self) -> ObservableId {
        self.observable
    }

    pub fn is_one_shot(&self) -> bool {
        self.one_shot
    }

    /// Remove the listener. Returns false if it was already gone, e.g. a
    /// one-shot that has fired.
    pub fn dispose(self) -> bool {
        (self.remove)(self.listener)
    }
}

impl fmt::Debug for WhenHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WhenHandle")
            .field("observable", &self.observable)
            .field("listener", &self.listener)
            .field("one_shot", &self.one_shot)
            .finish()
    }
}
