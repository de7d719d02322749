//! Reactive composition of criteria producers and predicate consumers.
//!
//! Producers register an accessor that returns their current criterion (or
//! `None` while inactive) and call [`Registration::update`] whenever their
//! input changes. Consumers subscribe a listener that receives a fresh
//! [`CombinedPredicate`] after every change.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use sift_compose_rs::{Coordinator, Criterion};
//!
//! let coordinator: Coordinator<u32> = Coordinator::new();
//!
//! let latest = Arc::new(Mutex::new(None));
//! let sink = Arc::clone(&latest);
//! let _subscription = coordinator.subscribe(move |predicate| {
//!     *sink.lock().unwrap() = Some(predicate);
//! });
//!
//! let _even = coordinator.register_control(|| Some(Criterion::from_fn(|n: &u32| n % 2 == 0)));
//!
//! let predicate = latest.lock().unwrap().clone().unwrap();
//! assert_eq!(predicate.filter(&[1, 2, 3, 4]), vec![&2, &4]);
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::criterion::{CombinedPredicate, Criterion};

/// A producer's accessor: its current criterion, or `None` while inactive.
pub type Accessor<R> = Arc<dyn Fn() -> Option<Criterion<R>> + Send + Sync>;

/// A consumer's listener, called with every recomputed predicate.
pub type Listener<R> = Arc<dyn Fn(CombinedPredicate<R>) + Send + Sync>;

/// Identifies a registered producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ControlId(u64);

/// Identifies a subscribed consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for ControlId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "control#{}", self.0)
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "subscription#{}", self.0)
    }
}

/// Registry and subscriber list for one composition of criteria.
///
/// `Coordinator` is a handle: clones share the same registry. Every
/// operation runs synchronously. Registering, unregistering and updating a
/// producer recompute the combined predicate and deliver it to every
/// subscriber before returning; subscribing delivers the current predicate
/// to the new subscriber only.
///
/// # Ordering
///
/// Changes are processed one at a time from a single queue. A change raised
/// while a predicate is being delivered (by a listener, by an accessor, or
/// by another thread) is queued and processed after the delivery completes,
/// so no subscriber ever observes two recomputations interleaved. The thread
/// already dispatching delivers queued changes, so a call that queues may
/// return before its own notification goes out.
///
/// # Thread Safety
///
/// `Coordinator` is [`Send`] and [`Sync`]. The registry sits behind one
/// mutex, which is never held while accessors or listeners run.
pub struct Coordinator<R> {
    shared: Arc<Shared<R>>,
}

impl<R> Clone for Coordinator<R> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<R> Default for Coordinator<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> std::fmt::Debug for Coordinator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("Coordinator")
            .field("controls", &state.controls.len())
            .field("subscribers", &state.subscribers.len())
            .field("queued", &state.queue.len())
            .finish()
    }
}

impl<R> Coordinator<R> {
    /// Creates an empty coordinator.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Registers a producer's accessor.
    ///
    /// Every subscriber is notified with a predicate that includes the new
    /// producer's criterion (if it is active). Dropping the returned handle
    /// keeps the producer registered for the coordinator's lifetime.
    pub fn register_control<F>(&self, accessor: F) -> Registration<R>
    where
        F: Fn() -> Option<Criterion<R>> + Send + Sync + 'static,
    {
        self.register_accessor(Arc::new(accessor))
    }

    /// Registers an already shared accessor.
    pub fn register_accessor(&self, accessor: Accessor<R>) -> Registration<R> {
        let id = ControlId(self.shared.next_id());
        self.shared.submit(Event::Register { id, accessor });
        Registration {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Subscribes a listener.
    ///
    /// The listener is called right away with the predicate for the current
    /// registry, and again after every later change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription<R>
    where
        F: Fn(CombinedPredicate<R>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.shared.next_id());
        self.shared.submit(Event::Subscribe {
            id,
            listener: Arc::new(listener),
        });
        Subscription {
            id,
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Builds the predicate for the current registry without notifying anyone.
    pub fn predicate(&self) -> CombinedPredicate<R> {
        let accessors = self.shared.lock().snapshot_accessors();
        evaluate(&accessors)
    }

    /// Returns the number of registered producers.
    pub fn control_count(&self) -> usize {
        self.shared.lock().controls.len()
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.shared.lock().subscribers.len()
    }
}

/// A producer's handle on its registry entry.
///
/// Holds a weak reference, so a producer may keep its registration inside
/// state that its own accessor captures. Operations on a registration whose
/// coordinator has been dropped do nothing.
pub struct Registration<R> {
    id: ControlId,
    shared: Weak<Shared<R>>,
}

impl<R> std::fmt::Debug for Registration<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration").field("id", &self.id).finish()
    }
}

impl<R> Registration<R> {
    /// Returns the id of the registry entry.
    pub fn id(&self) -> ControlId {
        self.id
    }

    /// Signals that the accessor's result may have changed.
    ///
    /// Recomputes the combined predicate and notifies every subscriber. If
    /// another thread is already dispatching, the change is queued for that
    /// thread and this call may return before the notification goes out.
    pub fn update(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.submit(Event::Update(self.id));
        }
    }

    /// Removes the registry entry and notifies every subscriber.
    pub fn unregister(self) {
        self.remove();
    }

    pub(crate) fn remove(&self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.submit(Event::Unregister(self.id));
        }
    }
}

/// A consumer's handle on its subscription.
pub struct Subscription<R> {
    id: SubscriptionId,
    shared: Weak<Shared<R>>,
}

impl<R> std::fmt::Debug for Subscription<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl<R> Subscription<R> {
    /// Returns the id of the subscription.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Stops further notifications.
    pub fn unsubscribe(self) {
        if let Some(shared) = self.shared.upgrade() {
            shared.submit(Event::Unsubscribe(self.id));
        }
    }
}

enum Event<R> {
    Register { id: ControlId, accessor: Accessor<R> },
    Unregister(ControlId),
    Update(ControlId),
    Subscribe { id: SubscriptionId, listener: Listener<R> },
    Unsubscribe(SubscriptionId),
}

impl<R> Event<R> {
    fn name(&self) -> &'static str {
        match self {
            Event::Register { .. } => "register",
            Event::Unregister(_) => "unregister",
            Event::Update(_) => "update",
            Event::Subscribe { .. } => "subscribe",
            Event::Unsubscribe(_) => "unsubscribe",
        }
    }
}

struct State<R> {
    controls: Vec<(ControlId, Accessor<R>)>,
    subscribers: Vec<(SubscriptionId, Listener<R>)>,
    queue: VecDeque<Event<R>>,
    dispatching: bool,
    next_id: u64,
}

impl<R> Default for State<R> {
    fn default() -> Self {
        Self {
            controls: Vec::new(),
            subscribers: Vec::new(),
            queue: VecDeque::new(),
            dispatching: false,
            next_id: 0,
        }
    }
}

/// A recomputation to run once the lock is released.
struct Delivery<R> {
    accessors: Vec<Accessor<R>>,
    listeners: Vec<Listener<R>>,
}

impl<R> State<R> {
    fn snapshot_accessors(&self) -> Vec<Accessor<R>> {
        self.controls
            .iter()
            .map(|(_, accessor)| Arc::clone(accessor))
            .collect()
    }

    fn snapshot_listeners(&self) -> Vec<Listener<R>> {
        self.subscribers
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    fn broadcast(&self) -> Delivery<R> {
        Delivery {
            accessors: self.snapshot_accessors(),
            listeners: self.snapshot_listeners(),
        }
    }

    /// Applies one event to the registry.
    ///
    /// Entries the event removes are handed back in [`Applied::retired`] so
    /// the caller can drop them after releasing the lock.
    fn apply(&mut self, event: Event<R>) -> Applied<R> {
        let mut retired = Retired::default();
        let delivery = match event {
            Event::Register { id, accessor } => {
                self.controls.push((id, accessor));
                Some(self.broadcast())
            }
            Event::Unregister(id) => {
                let (removed, kept) = std::mem::take(&mut self.controls)
                    .into_iter()
                    .partition::<Vec<_>, _>(|(existing, _)| *existing == id);
                self.controls = kept;
                let changed = !removed.is_empty();
                retired.accessors = removed.into_iter().map(|(_, accessor)| accessor).collect();
                changed.then(|| self.broadcast())
            }
            Event::Update(id) => self
                .controls
                .iter()
                .any(|(existing, _)| *existing == id)
                .then(|| self.broadcast()),
            Event::Subscribe { id, listener } => {
                self.subscribers.push((id, Arc::clone(&listener)));
                Some(Delivery {
                    accessors: self.snapshot_accessors(),
                    listeners: vec![listener],
                })
            }
            Event::Unsubscribe(id) => {
                let (removed, kept) = std::mem::take(&mut self.subscribers)
                    .into_iter()
                    .partition::<Vec<_>, _>(|(existing, _)| *existing == id);
                self.subscribers = kept;
                retired.listeners = removed.into_iter().map(|(_, listener)| listener).collect();
                None
            }
        };
        Applied { delivery, retired }
    }
}

/// The outcome of applying one event.
struct Applied<R> {
    delivery: Option<Delivery<R>>,
    retired: Retired<R>,
}

/// Accessors and listeners removed from the registry.
///
/// Dropping one may run a producer's or consumer's `Drop`, which can submit
/// events of its own, so these must outlive the state lock.
struct Retired<R> {
    accessors: Vec<Accessor<R>>,
    listeners: Vec<Listener<R>>,
}

impl<R> Default for Retired<R> {
    fn default() -> Self {
        Self {
            accessors: Vec::new(),
            listeners: Vec::new(),
        }
    }
}

struct Shared<R> {
    state: Mutex<State<R>>,
}

impl<R> Shared<R> {
    fn lock(&self) -> MutexGuard<'_, State<R>> {
        // Every event leaves the state consistent before anything that can
        // panic runs, so a poisoned lock is still safe to use.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn next_id(&self) -> u64 {
        let mut state = self.lock();
        state.next_id += 1;
        state.next_id
    }

    /// Queues an event and, unless a dispatch is already running, drains the queue.
    fn submit(&self, event: Event<R>) {
        {
            let mut state = self.lock();
            tracing::trace!(event = event.name(), "queueing coordinator event");
            state.queue.push_back(event);
            if state.dispatching {
                return;
            }
            state.dispatching = true;
        }

        let mut guard = DispatchGuard {
            shared: self,
            armed: true,
        };

        loop {
            let Applied { delivery, retired } = {
                let mut state = self.lock();
                let Some(event) = state.queue.pop_front() else {
                    state.dispatching = false;
                    guard.armed = false;
                    break;
                };
                let name = event.name();
                let applied = state.apply(event);
                tracing::debug!(
                    event = name,
                    controls = state.controls.len(),
                    subscribers = state.subscribers.len(),
                    notify = applied.delivery.as_ref().map_or(0, |d| d.listeners.len()),
                    "applied coordinator event"
                );
                applied
            };
            // Any events raised by these drops are queued behind this one.
            drop(retired);

            if let Some(delivery) = delivery.filter(|d| !d.listeners.is_empty()) {
                let predicate = evaluate(&delivery.accessors);
                for listener in &delivery.listeners {
                    listener(predicate.clone());
                }
            }
        }
    }
}

/// Clears the dispatching flag if a listener or accessor panics mid-dispatch.
struct DispatchGuard<'a, R> {
    shared: &'a Shared<R>,
    armed: bool,
}

impl<R> Drop for DispatchGuard<'_, R> {
    fn drop(&mut self) {
        if self.armed {
            tracing::warn!("coordinator dispatch unwound; queued events will run on the next change");
            self.shared.lock().dispatching = false;
        }
    }
}

/// Calls every accessor and combines the active criteria.
fn evaluate<R>(accessors: &[Accessor<R>]) -> CombinedPredicate<R> {
    let criteria: Vec<Criterion<R>> = accessors.iter().filter_map(|accessor| accessor()).collect();
    tracing::trace!(
        registered = accessors.len(),
        active = criteria.len(),
        "recomputed combined predicate"
    );
    CombinedPredicate::from_criteria(criteria)
}
