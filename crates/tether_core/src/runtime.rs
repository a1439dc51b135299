//! Tether Runtime
//!
//! An explicit owner for the binding registry of one application context.

use crate::registry::{BindingRegistry, RegistryStats};
use crate::signal::ChangeSignal;
use crate::synced::SynchronizedValue;

/// Owns the binding registry of an application context and creates
/// properties attached to it
pub struct TetherRuntime {
    registry: BindingRegistry,
}

impl TetherRuntime {
    pub fn new() -> Self {
        Self {
            registry: BindingRegistry::new(),
        }
    }

    /// Use an existing registry, e.g. the thread's default one. The runtime
    /// clears it on shutdown and on drop.
    pub fn with_registry(registry: BindingRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &BindingRegistry {
        &self.registry
    }

    /// Create a plain change signal
    pub fn signal<T: Clone + PartialEq + 'static>(&self, initial: T) -> ChangeSignal<T> {
        ChangeSignal::new(initial)
    }

    /// Create a synchronized property bound through this runtime's registry
    pub fn property<T: Clone + PartialEq + 'static>(&self, initial: T) -> SynchronizedValue<T> {
        SynchronizedValue::builder(initial)
            .registry(&self.registry)
            .build()
    }

    /// Create a named synchronized property
    pub fn named_property<T: Clone + PartialEq + 'static>(
        &self,
        name: &'static str,
        initial: T,
    ) -> SynchronizedValue<T> {
        SynchronizedValue::builder(initial)
            .name(name)
            .registry(&self.registry)
            .build()
    }

    /// Get statistics about the runtime
    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            registry: self.registry.stats(),
        }
    }

    /// Tear down every binding created through this runtime
    pub fn shutdown(&self) {
        tracing::debug!("tether runtime shutting down");
        self.registry.clear();
    }
}

impl Default for TetherRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TetherRuntime {
    fn drop(&mut self) {
        self.registry.clear();
    }
}

/// Statistics about the runtime
#[derive(Debug, Clone)]
pub struct RuntimeStats {
    pub registry: RegistryStats,
}
