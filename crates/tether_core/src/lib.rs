//! Tether Core
//!
//! This crate provides the property and binding primitives of the Tether
//! widget toolkit:
//!
//! - **Change Signals**: Observable value slots with ordered, re-entrancy safe
//!   change listeners
//! - **Synchronized Values**: Properties that can hold back their change
//!   notification until another observable moves
//! - **Binding Registry**: Unidirectional and bidirectional bindings that can
//!   be rebound and torn down from either end without leaking listeners
//!
//! Everything here is single-threaded: handles are `Rc`-based and `!Send`,
//! so all properties and bindings stay on the UI thread that created them.
//!
//! # Example
//!
//! ```rust
//! use tether_core::{BindingRegistry, ChangeSignal, SynchronizedValue};
//!
//! let registry = BindingRegistry::new();
//! let width = SynchronizedValue::builder(120.0_f64).registry(&registry).build();
//! let line_end = SynchronizedValue::builder(0.0_f64).registry(&registry).build();
//!
//! // The line follows the field's width
//! line_end.bind(&width).unwrap();
//! width.set(200.0).unwrap();
//! assert_eq!(line_end.get(), 200.0);
//!
//! // Hold back a text change until the selection catches up
//! let text = SynchronizedValue::builder(String::from("a")).registry(&registry).build();
//! let selection = ChangeSignal::new(0usize);
//! text.set_and_wait("b".to_string(), &selection).unwrap();
//! assert!(text.is_waiting());
//! selection.set(1);
//! assert!(!text.is_waiting());
//! ```

pub mod error;
pub mod observable;
pub mod registry;
pub mod runtime;
pub mod signal;
pub mod synced;
pub mod when;

pub use error::{BindingError, Result};
pub use observable::{
    ChangeListener, Downgrade, Identified, ListenerId, Observable, ObservableId, Property,
};
pub use registry::{
    BidirectionalBuilder, BindingId, BindingInfo, BindingRegistry, Direction, RegistryStats,
    Source, SourceRef, UnidirectionalBuilder,
};
pub use runtime::{RuntimeStats, TetherRuntime};
pub use signal::{
    f32_tolerance, f64_tolerance, ChangeSignal, Equality, ReadOnly, SignalBuilder, WeakSignal,
};
pub use synced::{SynchronizedBuilder, SynchronizedValue, WeakSynchronized};
pub use when::{OnChanged, When, WhenChanged, WhenHandle};
