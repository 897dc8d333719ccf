//! The environment a reconciliation pass runs in.

use crate::adapter::{WidgetAdapter, WidgetHandle};
use crate::element::ElementNode;
use crate::event::MethodLookup;
use crate::props::PropError;
use crate::runtime::{ComponentId, RuntimeConfig, RuntimeError};

/// Outcome of mounting a `<component>` node.
#[derive(Debug)]
pub enum Embed {
    /// The child component was built and rendered into `widget`.
    Mounted { id: ComponentId, widget: WidgetHandle },
    /// No component is registered under the name.
    NotFound(String),
    /// The node's attributes do not satisfy the component's props schema.
    Invalid { name: String, error: PropError },
}

/// Outcome of re-rendering an already mounted child component.
#[derive(Debug)]
pub enum EmbedUpdate {
    Updated,
    /// New props failed validation; the node is replaced by a marker.
    Invalid(PropError),
}

/// Services the reconciler needs from its owner.
///
/// The component runtime implements this for the component being rendered;
/// [`StandaloneContext`] drives an adapter with no components at all.
pub trait ReconcileContext {
    fn adapter(&mut self) -> &mut dyn WidgetAdapter;

    fn config(&self) -> &RuntimeConfig;

    /// Methods of the component whose template is being reconciled.
    fn methods(&self) -> &dyn MethodLookup;

    /// Build, bind and render the child component described by `node`.
    fn mount_component(&mut self, node: &ElementNode) -> Result<Embed, RuntimeError>;

    /// Give a mounted child its recomputed props and re-render it.
    fn update_component(
        &mut self,
        id: ComponentId,
        node: &ElementNode,
    ) -> Result<EmbedUpdate, RuntimeError>;

    /// Tear down a mounted child. Its main widget is left to the caller.
    fn unmount_component(&mut self, id: ComponentId) -> Result<(), RuntimeError>;
}

/// A context with an adapter and a fixed method list, without components.
///
/// Component nodes render as "not found" markers.
pub struct StandaloneContext<'a> {
    adapter: &'a mut dyn WidgetAdapter,
    config: RuntimeConfig,
    methods: Vec<String>,
}

impl<'a> StandaloneContext<'a> {
    pub fn new(adapter: &'a mut dyn WidgetAdapter) -> Self {
        Self {
            adapter,
            config: RuntimeConfig::default(),
            methods: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_methods<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.methods.extend(methods.into_iter().map(Into::into));
        self
    }
}

impl ReconcileContext for StandaloneContext<'_> {
    fn adapter(&mut self) -> &mut dyn WidgetAdapter {
        &mut *self.adapter
    }

    fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    fn methods(&self) -> &dyn MethodLookup {
        &self.methods
    }

    fn mount_component(&mut self, node: &ElementNode) -> Result<Embed, RuntimeError> {
        Ok(Embed::NotFound(node.attr("name").unwrap_or_default().to_owned()))
    }

    fn update_component(
        &mut self,
        _id: ComponentId,
        _node: &ElementNode,
    ) -> Result<EmbedUpdate, RuntimeError> {
        Ok(EmbedUpdate::Updated)
    }

    fn unmount_component(&mut self, _id: ComponentId) -> Result<(), RuntimeError> {
        Ok(())
    }
}
