//! Binding registry
//!
//! The registry owns every binding record: which observable feeds which
//! property, in which direction, plus the listeners that were installed to
//! make it happen. Because the registry owns the listeners, a binding can be
//! torn down from either end without the properties holding references to
//! their own binding machinery.
//!
//! # Records
//!
//! - A target has at most one **unidirectional** record. Binding again
//!   replaces it, detaching the listener on the previous source first.
//! - A target owns at most one **bidirectional** record, holding any number
//!   of sources. Each source's changes are written into the target; the
//!   target's changes are written back into its *implicit* sources.
//!
//! Every record carries an `ignore` flag shared with its listeners. A
//! listener that finds the flag set does nothing; a listener that writes
//! sets the flag for the duration of the write. This stops echoes: with
//! `a <-> b`, a change on `b` writes `a`, and `a`'s own listener sees the
//! flag and does not write `b` again. It also keeps bidirectional partners
//! independent: with `a <-> b` and `a <-> c`, a change on `b` updates `a`
//! but does not travel on to `c`.
//!
//! # Ownership
//!
//! Records, listeners and sinks reach both endpoints through weak handles
//! (see [`Downgrade`]), so a binding never keeps a property alive. A dropped
//! [`SynchronizedValue`](crate::SynchronizedValue) removes its own records.
//! Records left behind by other dropped observables, such as plain
//! [`ChangeSignal`](crate::ChangeSignal)s, do nothing and are removed by
//! [`prune`](BindingRegistry::prune).
//!
//! # Threading
//!
//! The registry is `!Send`: all bindings live on the thread that created
//! them. [`BindingRegistry::current`] returns the calling thread's default
//! registry; an application that wants explicit ownership constructs its own
//! with [`BindingRegistry::new`] and hands it to its properties.

use crate::error::{BindingError, Result};
use crate::observable::{
    ChangeListener, Downgrade, Identified, ListenerId, Observable, ObservableId, Property,
};
use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use smallvec::{smallvec, SmallVec};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

new_key_type! {
    /// Key of a record inside the registry
    pub struct BindingId;
}

/// Direction of a binding record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Unidirectional,
    Bidirectional,
}

/// One source of a binding record
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SourceRef {
    pub id: ObservableId,
    /// Attached by the target's own bidirectional bind; receives the
    /// target's changes
    pub implicit: bool,
}

type Detach = Box<dyn FnOnce()>;

/// Whether an endpoint still exists
type Liveness = Box<dyn Fn() -> bool>;

struct SourceLink {
    source: SourceRef,
    alive: Liveness,
    detach: Option<Detach>,
}

/// A writer pushing the target's value into one implicit source
struct Sink<T> {
    source: ObservableId,
    write: Rc<dyn Fn(T)>,
}

type Sinks<T> = RefCell<SmallVec<[Sink<T>; 2]>>;

/// One link between a target and its source(s)
struct BindingRecord {
    target: ObservableId,
    target_alive: Liveness,
    direction: Direction,
    ignore: Rc<Cell<bool>>,
    links: SmallVec<[SourceLink; 2]>,
    /// Bidirectional records only: removes the target listener
    target_detach: Option<Detach>,
    /// Bidirectional records only: the typed `Sinks<T>` of the record
    sinks: Option<Rc<dyn Any>>,
}

impl BindingRecord {
    fn position(&self, source: ObservableId) -> Option<usize> {
        self.links.iter().position(|l| l.source.id == source)
    }

    fn dispose(mut self) {
        for link in self.links.drain(..) {
            if let Some(detach) = link.detach {
                detach();
            }
        }
        if let Some(detach) = self.target_detach.take() {
            detach();
        }
    }
}

impl fmt::Debug for BindingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingRecord")
            .field("target", &self.target)
            .field("direction", &self.direction)
            .field("ignore", &self.ignore.get())
            .field(
                "sources",
                &self.links.iter().map(|l| l.source).collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[derive(Default)]
struct RegistryState {
    records: SlotMap<BindingId, BindingRecord>,
    /// target -> its unidirectional record
    unidirectional: FxHashMap<ObservableId, BindingId>,
    /// source -> targets bound to it unidirectionally
    dependents: FxHashMap<ObservableId, SmallVec<[ObservableId; 4]>>,
    /// target -> its bidirectional record
    bidirectional: FxHashMap<ObservableId, BindingId>,
    /// source -> bidirectional records listing it
    participants: FxHashMap<ObservableId, SmallVec<[BindingId; 4]>>,
}

impl RegistryState {
    fn forget_dependent(&mut self, source: ObservableId, target: ObservableId) {
        if let Some(targets) = self.dependents.get_mut(&source) {
            targets.retain(|t| *t != target);
            if targets.is_empty() {
                self.dependents.remove(&source);
            }
        }
    }

    fn forget_participant(&mut self, source: ObservableId, key: BindingId) {
        if let Some(keys) = self.participants.get_mut(&source) {
            keys.retain(|k| *k != key);
            if keys.is_empty() {
                self.participants.remove(&source);
            }
        }
    }

    /// Remove a whole record and its index entries
    fn take_record(&mut self, key: BindingId) -> Option<BindingRecord> {
        let record = self.records.remove(key)?;
        match record.direction {
            Direction::Unidirectional => {
                self.unidirectional.remove(&record.target);
                for link in &record.links {
                    self.forget_dependent(link.source.id, record.target);
                }
            }
            Direction::Bidirectional => {
                self.bidirectional.remove(&record.target);
                for link in &record.links {
                    self.forget_participant(link.source.id, key);
                }
            }
        }
        Some(record)
    }
}

fn liveness<O: Downgrade>(observable: &O) -> Liveness {
    let weak = observable.downgrade();
    Box::new(move || O::upgrade(&weak).is_some())
}

/// Removes `listener` from `observable` if it still exists
fn detach_listener<T, O: Observable<T>>(observable: &O, listener: ListenerId) -> Detach {
    let weak = observable.downgrade();
    Box::new(move || {
        if let Some(observable) = O::upgrade(&weak) {
            observable.remove_listener(listener);
        }
    })
}

/// Listener writing a source's changes into `target`
fn propagate_into<T, P>(
    target: &P,
    source_id: ObservableId,
    ignore: &Rc<Cell<bool>>,
) -> ChangeListener<T>
where
    T: Clone + 'static,
    P: Property<T>,
{
    let target_id = target.observable_id();
    let target = target.downgrade();
    let ignore = Rc::clone(ignore);
    Rc::new(move |_: &T, new: &T| {
        if ignore.get() {
            return;
        }
        let Some(target) = P::upgrade(&target) else {
            return;
        };
        tracing::trace!(property = %target_id, source = %source_id, "propagating value");
        write_guarded(&ignore, &target, new.clone());
    })
}

thread_local! {
    static CURRENT: BindingRegistry = BindingRegistry::new();
}

/// Table of all active bindings
///
/// Cloning yields another handle to the same table.
#[derive(Clone, Default)]
pub struct BindingRegistry {
    state: Rc<RefCell<RegistryState>>,
}

impl BindingRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// The calling thread's default registry
    pub fn current() -> Self {
        CURRENT.with(BindingRegistry::clone)
    }

    /// Whether two handles refer to the same registry
    pub fn ptr_eq(&self, other: &BindingRegistry) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    // =========================================================================
    // UNIDIRECTIONAL
    // =========================================================================

    /// Start a unidirectional binding into `target`
    pub fn bind<T, P>(&self, target: &P) -> UnidirectionalBuilder<'_, T, P>
    where
        T: Clone + 'static,
        P: Property<T>,
    {
        UnidirectionalBuilder {
            registry: self,
            target: target.clone(),
            _marker: PhantomData,
        }
    }

    fn bind_unidirectional<T, P, S>(&self, target: &P, source: &S) -> Result<()>
    where
        T: Clone + 'static,
        P: Property<T>,
        S: Observable<T>,
    {
        let target_id = target.observable_id();
        let source_id = source.observable_id();
        if target_id == source_id {
            return Err(BindingError::self_binding());
        }

        self.unbind(&target_id);

        let ignore = Rc::new(Cell::new(false));
        let listener_id = source.add_listener(propagate_into(target, source_id, &ignore));

        let record = BindingRecord {
            target: target_id,
            target_alive: liveness(target),
            direction: Direction::Unidirectional,
            ignore: Rc::clone(&ignore),
            links: smallvec![SourceLink {
                source: SourceRef {
                    id: source_id,
                    implicit: false,
                },
                alive: liveness(source),
                detach: Some(detach_listener::<T, _>(source, listener_id)),
            }],
            target_detach: None,
            sinks: None,
        };
        {
            let mut state = self.state.borrow_mut();
            let key = state.records.insert(record);
            state.unidirectional.insert(target_id, key);
            state.dependents.entry(source_id).or_default().push(target_id);
        }
        tracing::debug!(property = %target_id, source = %source_id, "unidirectional binding registered");

        write_guarded(&ignore, target, source.get());
        Ok(())
    }

    /// Remove the unidirectional binding of `target`, if any
    pub fn unbind(&self, target: &impl Identified) {
        let target_id = target.observable_id();
        let record = {
            let mut state = self.state.borrow_mut();
            let Some(key) = state.unidirectional.get(&target_id).copied() else {
                return;
            };
            state.take_record(key)
        };
        if let Some(record) = record {
            tracing::debug!(property = %target_id, "unidirectional binding removed");
            record.dispose();
        }
    }

    /// Whether `target` has a unidirectional binding
    pub fn is_bound(&self, target: &impl Identified) -> bool {
        self.state
            .borrow()
            .unidirectional
            .contains_key(&target.observable_id())
    }

    /// Whether `target`'s unidirectional binding is currently writing into it
    pub fn is_ignore_binding(&self, target: &impl Identified) -> bool {
        let state = self.state.borrow();
        state
            .unidirectional
            .get(&target.observable_id())
            .and_then(|key| state.records.get(*key))
            .map(|record| record.ignore.get())
            .unwrap_or(false)
    }

    /// The source `target` is unidirectionally bound to
    pub fn unidirectional_source(&self, target: &impl Identified) -> Option<SourceRef> {
        let state = self.state.borrow();
        let key = state.unidirectional.get(&target.observable_id())?;
        state
            .records
            .get(*key)
            .and_then(|record| record.links.first())
            .map(|link| link.source)
    }

    // =========================================================================
    // BIDIRECTIONAL
    // =========================================================================

    /// Start adding bidirectional sources to `target`
    pub fn bind_bidirectional<T, P>(&self, target: &P) -> BidirectionalBuilder<'_, T, P>
    where
        T: Clone + 'static,
        P: Property<T>,
    {
        BidirectionalBuilder {
            registry: self,
            target: target.clone(),
            _marker: PhantomData,
        }
    }

    fn add_bidirectional_source<T, P, S>(&self, target: &P, source: &Source<T, S>) -> Result<()>
    where
        T: Clone + 'static,
        P: Property<T>,
        S: Property<T>,
    {
        let target_id = target.observable_id();
        let source_id = source.property.observable_id();
        if target_id == source_id {
            return Err(BindingError::self_binding());
        }

        let existing = {
            let state = self.state.borrow();
            match state.bidirectional.get(&target_id) {
                Some(key) => {
                    let record = &state.records[*key];
                    if record.position(source_id).is_some() {
                        return Ok(());
                    }
                    Some((*key, Rc::clone(&record.ignore), record.sinks.clone()))
                }
                None => None,
            }
        };

        let (key, ignore, sinks) = match existing {
            Some((key, ignore, sinks)) => {
                let sinks = sinks
                    .and_then(|any| any.downcast::<Sinks<T>>().ok())
                    .ok_or_else(|| {
                        BindingError::IllegalState(format!(
                            "bidirectional record of {target_id} holds another value type"
                        ))
                    })?;
                (key, ignore, sinks)
            }
            None => self.create_bidirectional_record(target),
        };

        let listener_id = source
            .property
            .add_listener(propagate_into(target, source_id, &ignore));

        if source.implicit {
            let property = source.property.downgrade();
            sinks.borrow_mut().push(Sink {
                source: source_id,
                write: Rc::new(move |value: T| {
                    let Some(property) = S::upgrade(&property) else {
                        return;
                    };
                    if let Err(err) = property.set_value(value) {
                        tracing::warn!(property = %source_id, %err, "propagated value refused");
                    }
                }),
            });
        }

        let detach: Detach = {
            let remove_listener = detach_listener::<T, _>(&source.property, listener_id);
            let sinks = Rc::clone(&sinks);
            Box::new(move || {
                remove_listener();
                sinks.borrow_mut().retain(|sink| sink.source != source_id);
            })
        };

        {
            let mut state = self.state.borrow_mut();
            if let Some(record) = state.records.get_mut(key) {
                record.links.push(SourceLink {
                    source: SourceRef {
                        id: source_id,
                        implicit: source.implicit,
                    },
                    alive: liveness(&source.property),
                    detach: Some(detach),
                });
            }
            state.participants.entry(source_id).or_default().push(key);
        }
        tracing::debug!(
            property = %target_id,
            source = %source_id,
            implicit = source.implicit,
            "bidirectional binding registered"
        );

        write_guarded(&ignore, target, source.property.get());
        Ok(())
    }

    fn create_bidirectional_record<T, P>(
        &self,
        target: &P,
    ) -> (BindingId, Rc<Cell<bool>>, Rc<Sinks<T>>)
    where
        T: Clone + 'static,
        P: Property<T>,
    {
        let target_id = target.observable_id();
        let ignore = Rc::new(Cell::new(false));
        let sinks: Rc<Sinks<T>> = Rc::new(RefCell::new(SmallVec::new()));

        let listener: ChangeListener<T> = {
            let ignore = Rc::clone(&ignore);
            let sinks = Rc::clone(&sinks);
            Rc::new(move |_: &T, new: &T| {
                if ignore.get() {
                    return;
                }
                let writers: SmallVec<[Rc<dyn Fn(T)>; 2]> = sinks
                    .borrow()
                    .iter()
                    .map(|sink| Rc::clone(&sink.write))
                    .collect();
                let previous = ignore.replace(true);
                for write in writers {
                    write(new.clone());
                }
                ignore.set(previous);
            })
        };
        let listener_id = target.add_listener(listener);

        let record = BindingRecord {
            target: target_id,
            target_alive: liveness(target),
            direction: Direction::Bidirectional,
            ignore: Rc::clone(&ignore),
            links: SmallVec::new(),
            target_detach: Some(detach_listener::<T, _>(target, listener_id)),
            sinks: Some(Rc::clone(&sinks) as Rc<dyn Any>),
        };
        let key = {
            let mut state = self.state.borrow_mut();
            let key = state.records.insert(record);
            state.bidirectional.insert(target_id, key);
            key
        };
        (key, ignore, sinks)
    }

    /// Remove the pairwise binding between `a` and `b`, in whichever record
    /// holds it. Other partners of either side stay bound.
    pub fn unbind_bidirectional(&self, a: &impl Identified, b: &impl Identified) {
        let a = a.observable_id();
        let b = b.observable_id();
        let removed = self.remove_link(a, b) | self.remove_link(b, a);
        if removed {
            tracing::debug!(property = %a, other = %b, "bidirectional binding removed");
        }
    }

    fn remove_link(&self, target: ObservableId, source: ObservableId) -> bool {
        let (link, emptied) = {
            let mut state = self.state.borrow_mut();
            let Some(key) = state.bidirectional.get(&target).copied() else {
                return false;
            };
            let Some(record) = state.records.get_mut(key) else {
                return false;
            };
            let Some(pos) = record.position(source) else {
                return false;
            };
            let link = record.links.remove(pos);
            let emptied = if record.links.is_empty() {
                state.take_record(key)
            } else {
                None
            };
            state.forget_participant(source, key);
            (link, emptied)
        };

        if let Some(detach) = link.detach {
            detach();
        }
        if let Some(record) = emptied {
            record.dispose();
        }
        true
    }

    /// Remove every bidirectional link `observable` takes part in, both its
    /// own record and its appearances as a source of other records
    pub fn dispose_bidirectional(&self, observable: &impl Identified) {
        let id = observable.observable_id();
        let mut detached: Vec<Detach> = Vec::new();
        let mut disposed: Vec<BindingRecord> = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            if let Some(key) = state.bidirectional.get(&id).copied() {
                if let Some(record) = state.take_record(key) {
                    disposed.push(record);
                }
            }

            let keys = state.participants.remove(&id).unwrap_or_default();
            for key in keys {
                let Some(record) = state.records.get_mut(key) else {
                    continue;
                };
                if let Some(pos) = record.position(id) {
                    if let Some(detach) = record.links.remove(pos).detach {
                        detached.push(detach);
                    }
                }
                if record.links.is_empty() {
                    if let Some(record) = state.take_record(key) {
                        disposed.push(record);
                    }
                }
            }
        }

        if detached.is_empty() && disposed.is_empty() {
            return;
        }
        tracing::debug!(
            property = %id,
            links = detached.len(),
            records = disposed.len(),
            "bidirectional bindings disposed"
        );
        for detach in detached {
            detach();
        }
        for record in disposed {
            record.dispose();
        }
    }

    /// Whether `observable` owns a bidirectional record or is a source of one
    pub fn is_bound_bidirectionally(&self, observable: &impl Identified) -> bool {
        let id = observable.observable_id();
        let state = self.state.borrow();
        state.bidirectional.contains_key(&id) || state.participants.contains_key(&id)
    }

    /// Sources of `target`'s bidirectional record, in registration order
    pub fn bidirectional_sources(&self, target: &impl Identified) -> Vec<SourceRef> {
        let state = self.state.borrow();
        state
            .bidirectional
            .get(&target.observable_id())
            .and_then(|key| state.records.get(*key))
            .map(|record| record.links.iter().map(|l| l.source).collect())
            .unwrap_or_default()
    }

    // =========================================================================
    // TEARDOWN
    // =========================================================================

    /// Remove every record mentioning `observable`: its unidirectional
    /// binding, the unidirectional bindings that use it as a source, and all
    /// its bidirectional links
    pub fn dispose(&self, observable: &impl Identified) {
        let id = observable.observable_id();
        self.unbind(&id);
        let dependents = self
            .state
            .borrow()
            .dependents
            .get(&id)
            .cloned()
            .unwrap_or_default();
        for target in dependents {
            self.unbind(&target);
        }
        self.dispose_bidirectional(&id);
    }

    /// Remove every record
    pub fn clear(&self) {
        let records: Vec<BindingRecord> = {
            let mut state = self.state.borrow_mut();
            let records = state.records.drain().map(|(_, record)| record).collect();
            state.unidirectional.clear();
            state.dependents.clear();
            state.bidirectional.clear();
            state.participants.clear();
            records
        };
        if !records.is_empty() {
            tracing::debug!(records = records.len(), "binding registry cleared");
        }
        for record in records {
            record.dispose();
        }
    }

    /// Remove records whose target was dropped and links whose source was
    /// dropped. Returns the number of records and links removed.
    pub fn prune(&self) -> usize {
        let mut detached: Vec<Detach> = Vec::new();
        let mut disposed: Vec<BindingRecord> = Vec::new();
        {
            let mut state = self.state.borrow_mut();
            let keys: Vec<BindingId> = state.records.keys().collect();
            for key in keys {
                let Some(record) = state.records.get_mut(key) else {
                    continue;
                };
                if (record.target_alive)() {
                    let mut dead: SmallVec<[ObservableId; 2]> = SmallVec::new();
                    let mut i = 0;
                    while i < record.links.len() {
                        if (record.links[i].alive)() {
                            i += 1;
                            continue;
                        }
                        let link = record.links.remove(i);
                        dead.push(link.source.id);
                        detached.extend(link.detach);
                    }
                    let (target, direction) = (record.target, record.direction);
                    let emptied = record.links.is_empty();
                    for source in dead {
                        match direction {
                            Direction::Unidirectional => state.forget_dependent(source, target),
                            Direction::Bidirectional => state.forget_participant(source, key),
                        }
                    }
                    if !emptied {
                        continue;
                    }
                }
                disposed.extend(state.take_record(key));
            }
        }

        let removed = detached.len() + disposed.len();
        if removed > 0 {
            tracing::debug!(removed, "pruned bindings of dropped observables");
        }
        for detach in detached {
            detach();
        }
        for record in disposed {
            record.dispose();
        }
        removed
    }

    /// Snapshot of every record, for inspection and debugging
    pub fn records(&self) -> Vec<BindingInfo> {
        let state = self.state.borrow();
        state
            .records
            .iter()
            .map(|(id, record)| BindingInfo {
                id,
                target: record.target,
                direction: record.direction,
                sources: record.links.iter().map(|l| l.source).collect(),
            })
            .collect()
    }

    /// Counts of the registry's records
    pub fn stats(&self) -> RegistryStats {
        let state = self.state.borrow();
        RegistryStats {
            records: state.records.len(),
            unidirectional: state.unidirectional.len(),
            bidirectional: state.bidirectional.len(),
            bidirectional_links: state
                .bidirectional
                .values()
                .filter_map(|key| state.records.get(*key))
                .map(|record| record.links.len())
                .sum(),
        }
    }
}

impl fmt::Debug for BindingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_list()
            .entries(state.records.values())
            .finish()
    }
}

/// Write `value` into `sink` with the record's ignore flag raised
fn write_guarded<T, P: Property<T>>(ignore: &Cell<bool>, sink: &P, value: T) {
    let previous = ignore.replace(true);
    let result = sink.set_value(value);
    ignore.set(previous);
    if let Err(err) = result {
        tracing::warn!(property = %sink.observable_id(), %err, "propagated value refused");
    }
}

/// Read-only description of one binding record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingInfo {
    pub id: BindingId,
    pub target: ObservableId,
    pub direction: Direction,
    pub sources: Vec<SourceRef>,
}

/// Statistics about a registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryStats {
    pub records: usize,
    pub unidirectional: usize,
    pub bidirectional: usize,
    pub bidirectional_links: usize,
}

impl RegistryStats {
    pub fn is_empty(&self) -> bool {
        self.records == 0
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

/// Pending unidirectional binding, completed by [`source`](Self::source)
pub struct UnidirectionalBuilder<'a, T, P> {
    registry: &'a BindingRegistry,
    target: P,
    _marker: PhantomData<fn() -> T>,
}

impl<T, P> UnidirectionalBuilder<'_, T, P>
where
    T: Clone + 'static,
    P: Property<T>,
{
    /// Bind the target to `source`, replacing any previous source, and push
    /// the source's current value into the target
    pub fn source<S: Observable<T>>(self, source: &S) -> Result<()> {
        self.registry.bind_unidirectional(&self.target, source)
    }
}

/// Adds sources to a target's bidirectional record
pub struct BidirectionalBuilder<'a, T, P> {
    registry: &'a BindingRegistry,
    target: P,
    _marker: PhantomData<fn() -> T>,
}

impl<T, P> BidirectionalBuilder<'_, T, P>
where
    T: Clone + 'static,
    P: Property<T>,
{
    /// Link `source` with the target. The target takes the source's value.
    pub fn add_source<S: Property<T>>(&self, source: Source<T, S>) -> Result<&Self> {
        self.registry.add_bidirectional_source(&self.target, &source)?;
        Ok(self)
    }
}

/// A property offered as a bidirectional source
pub struct Source<T, S> {
    property: S,
    implicit: bool,
    _marker: PhantomData<fn() -> T>,
}

impl<T, S> Source<T, S>
where
    T: Clone + 'static,
    S: Property<T>,
{
    /// A source whose changes flow into the target only
    pub fn new(property: &S) -> Self {
        Self {
            property: property.clone(),
            implicit: false,
            _marker: PhantomData,
        }
    }

    /// Also write the target's changes back into this source
    pub fn implicit(mut self) -> Self {
        self.implicit = true;
        self
    }

    pub fn is_implicit(&self) -> bool {
        self.implicit
    }
}
