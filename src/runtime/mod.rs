//! Component runtime: state, props, methods, rendering and lifecycle.
//!
//! A [`Runtime`] owns every component instance in a slotmap arena. Each
//! instance keeps its state, props, method table and a [`Reconciler`] for
//! the element tree its template produces. State changes re-render
//! synchronously; child components embedded in a template render through
//! their own reconciler.
//!
//! [`Reconciler`]: crate::reconcile::Reconciler

mod component;
mod config;
mod ctx;
mod engine;
mod error;
mod instance;
mod lifecycle;

pub use component::{
    Component, ComponentId, ComponentRegistry, Computed, ComputedFn, Method, Methods,
    Registration,
};
pub use config::RuntimeConfig;
pub use ctx::ComponentCtx;
pub use engine::{Runtime, Shell};
pub use error::RuntimeError;
pub use lifecycle::{LifecycleEvent, LifecycleTracker};

/// Component state: a JSON object merged shallowly by `set_state`.
pub type State = serde_json::Map<String, serde_json::Value>;
