//! A consumer that keeps a dataset filtered by the latest predicate.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::coordinator::{Coordinator, Subscription};
use crate::criterion::CombinedPredicate;

struct ViewState<R> {
    predicate: CombinedPredicate<R>,
    notifications: usize,
}

/// A dataset paired with the predicate most recently delivered to it.
///
/// Until it is notified, the view passes everything. Each notification
/// replaces the stored predicate; [`filtered`](Self::filtered) re-applies it
/// to the current data. Dropping the view unsubscribes it.
///
/// # Example
///
/// ```
/// use sift_compose_rs::{view::FilteredView, Coordinator, Criterion};
///
/// let coordinator: Coordinator<u32> = Coordinator::new();
/// let view = FilteredView::attach(&coordinator, vec![1, 2, 3, 4]);
/// assert_eq!(view.filtered(), vec![&1, &2, &3, &4]);
///
/// let _odd = coordinator.register_control(|| Some(Criterion::from_fn(|n: &u32| n % 2 == 1)));
/// assert_eq!(view.filtered(), vec![&1, &3]);
/// ```
pub struct FilteredView<R> {
    data: Vec<R>,
    state: Arc<Mutex<ViewState<R>>>,
    subscription: Option<Subscription<R>>,
}

impl<R: std::fmt::Debug> std::fmt::Debug for FilteredView<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("FilteredView")
            .field("data", &self.data)
            .field("predicate", &state.predicate)
            .field("notifications", &state.notifications)
            .field("subscribed", &self.subscription.is_some())
            .finish()
    }
}

impl<R> FilteredView<R> {
    /// Creates a view that is not subscribed to anything.
    pub fn new(data: Vec<R>) -> Self {
        Self {
            data,
            state: Arc::new(Mutex::new(ViewState {
                predicate: CombinedPredicate::always(),
                notifications: 0,
            })),
            subscription: None,
        }
    }

    fn lock(&self) -> MutexGuard<'_, ViewState<R>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the records that pass the latest predicate, in order.
    pub fn filtered(&self) -> Vec<&R> {
        let predicate = self.predicate();
        predicate.filter(&self.data)
    }

    /// Returns the number of records that pass the latest predicate.
    pub fn count(&self) -> usize {
        let predicate = self.predicate();
        self.data.iter().filter(|record| predicate.matches(record)).count()
    }

    /// Returns the latest predicate.
    pub fn predicate(&self) -> CombinedPredicate<R> {
        self.lock().predicate.clone()
    }

    /// Returns how many predicates the view has received.
    pub fn notifications(&self) -> usize {
        self.lock().notifications
    }

    /// Returns the unfiltered dataset.
    pub fn data(&self) -> &[R] {
        &self.data
    }

    /// Replaces the dataset; the stored predicate is kept.
    pub fn set_data(&mut self, data: Vec<R>) {
        self.data = data;
    }

    /// Returns true until the view is closed.
    pub fn is_subscribed(&self) -> bool {
        self.subscription.is_some()
    }

    /// Unsubscribes. The last predicate stays in effect.
    pub fn close(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            tracing::debug!(subscription = %subscription.id(), "closing filtered view");
            subscription.unsubscribe();
        }
    }
}

impl<R: 'static> FilteredView<R> {
    /// Creates a view over `data` and subscribes it to `coordinator`.
    ///
    /// The coordinator delivers its current predicate during the call, so
    /// the view is up to date when it is returned.
    pub fn attach(coordinator: &Coordinator<R>, data: Vec<R>) -> Self {
        let mut view = Self::new(data);
        view.subscribe(coordinator);
        view
    }

    /// Subscribes to `coordinator`, leaving any previous subscription.
    pub fn subscribe(&mut self, coordinator: &Coordinator<R>) {
        self.close();
        let state = Arc::clone(&self.state);
        let subscription = coordinator.subscribe(move |predicate| {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.predicate = predicate;
            state.notifications += 1;
        });
        self.subscription = Some(subscription);
    }
}

impl<R> Drop for FilteredView<R> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::criterion::Criterion;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_unattached_view_passes_everything() {
        let view = FilteredView::new(vec![1_u32, 2, 3]);
        assert_eq!(view.filtered().len(), 3);
        assert_eq!(view.notifications(), 0);
        assert!(!view.is_subscribed());
    }

    #[test]
    fn test_attach_receives_current_predicate() {
        let coordinator: Coordinator<u32> = Coordinator::new();
        let _small = coordinator.register_control(|| Some(Criterion::from_fn(|n: &u32| *n < 3)));

        let view = FilteredView::attach(&coordinator, vec![1, 2, 3, 4]);
        assert_eq!(view.notifications(), 1);
        assert_eq!(view.filtered(), vec![&1, &2]);
        assert_eq!(view.count(), 2);
    }

    #[test]
    fn test_view_refilters_on_each_notification() {
        let coordinator: Coordinator<u32> = Coordinator::new();
        let view = FilteredView::attach(&coordinator, (1..=10).collect());

        let limit = Arc::new(AtomicU32::new(5));
        let value = Arc::clone(&limit);
        let control = coordinator.register_control(move || {
            let max = value.load(Ordering::SeqCst);
            Some(Criterion::from_fn(move |n: &u32| *n <= max))
        });
        assert_eq!(view.count(), 5);

        limit.store(2, Ordering::SeqCst);
        control.update();
        assert_eq!(view.filtered(), vec![&1, &2]);
        assert_eq!(view.notifications(), 3);

        control.unregister();
        assert_eq!(view.count(), 10);
    }

    #[test]
    fn test_set_data_keeps_predicate() {
        let coordinator: Coordinator<u32> = Coordinator::new();
        let _even = coordinator.register_control(|| Some(Criterion::from_fn(|n: &u32| n % 2 == 0)));
        let mut view = FilteredView::attach(&coordinator, vec![1, 2]);

        view.set_data(vec![10, 11, 12]);
        assert_eq!(view.filtered(), vec![&10, &12]);
        assert_eq!(view.data().len(), 3);
    }

    #[test]
    fn test_close_unsubscribes() {
        let coordinator: Coordinator<u32> = Coordinator::new();
        let mut view = FilteredView::attach(&coordinator, vec![1, 2, 3]);
        assert_eq!(coordinator.subscriber_count(), 1);

        view.close();
        assert!(!view.is_subscribed());
        assert_eq!(coordinator.subscriber_count(), 0);

        let _none = coordinator.register_control(|| Some(Criterion::from_fn(|_: &u32| false)));
        assert_eq!(view.count(), 3);
        assert_eq!(view.notifications(), 1);
    }

    #[test]
    fn test_drop_unsubscribes() {
        let coordinator: Coordinator<u32> = Coordinator::new();
        drop(FilteredView::attach(&coordinator, vec![1]));
        assert_eq!(coordinator.subscriber_count(), 0);
    }
}
