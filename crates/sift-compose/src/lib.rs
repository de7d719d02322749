//! Reactive composition of independent filter criteria.
//!
//! Several producers (form controls, saved expressions, anything holding
//! user input) each contribute at most one [`Criterion`] at a time. A
//! [`Coordinator`] keeps them in a registry and hands every subscriber a
//! [`CombinedPredicate`], the conjunction of all active criteria, whenever a
//! producer is registered, updated or removed.
//!
//! The [`control`] module has stock producers and the [`view`] module a
//! stock consumer.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use sift_compose_rs::control::{RangeControl, TextControl};
//! use sift_compose_rs::view::FilteredView;
//! use sift_compose_rs::Coordinator;
//!
//! let coordinator = Coordinator::new();
//! let view = FilteredView::attach(
//!     &coordinator,
//!     vec![
//!         json!({"title": "Dune", "year": 1965}),
//!         json!({"title": "Neuromancer", "year": 1984}),
//!         json!({"title": "Snow Crash", "year": 1992}),
//!     ],
//! );
//!
//! let title = TextControl::fuzzy("title");
//! let year = RangeControl::new("year");
//! title.attach(&coordinator);
//! year.attach(&coordinator);
//!
//! year.set_range("1980", "2000");
//! assert_eq!(view.count(), 2);
//!
//! title.set_value("nro");
//! assert_eq!(view.filtered()[0]["title"], "Neuromancer");
//! ```

pub mod control;
mod coordinator;
mod criterion;
pub mod view;

pub use coordinator::{
    Accessor, ControlId, Coordinator, Listener, Registration, Subscription, SubscriptionId,
};
pub use criterion::{CombinedPredicate, Criterion};
