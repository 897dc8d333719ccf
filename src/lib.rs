//! # gilt-reconcile
//!
//! A component runtime and widget-tree reconciler for declarative,
//! markup-driven desktop UIs.
//!
//! Components hold state, expose methods and name a template. Each render
//! turns the template's markup into an element tree, and a per-component
//! reconciler diffs it against the widgets already on screen, issuing only
//! the create/update/move/destroy calls needed to converge. Widgets are
//! driven through a narrow [`adapter::WidgetAdapter`] trait, so any native
//! toolkit can sit underneath.
//!
//! ## Core Systems
//!
//! - **[`element`]**: Element nodes, element kinds and their attribute mappings, styles, layouts
//! - **[`markup`]**: Logos-based markup tokenizer and lenient tree parser
//! - **[`props`]**: Prop schemas and attribute-to-prop coercion
//! - **[`event`]**: Handler expressions, listener registry, widget events
//! - **[`reconcile`]**: Keyed tree diffing over a slotmap arena of element states
//! - **[`runtime`]**: Components, state, rendering, emitted events, lifecycle
//! - **[`template`]**: Template engine seam and a closure-based registry
//! - **[`adapter`]**: The widget backend contract
//! - **[`testing`]**: Headless adapter, Pilot, snapshot helpers

// Foundation
pub mod adapter;
pub mod element;
pub mod markup;

// Declarative surface
pub mod event;
pub mod props;
pub mod template;

// Diffing and components
pub mod reconcile;
pub mod runtime;

// Headless testing
pub mod testing;

// Proc macros (feature-gated)
#[cfg(feature = "macros")]
pub use gilt_reconcile_macros::view;
