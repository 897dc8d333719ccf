//! Proc macros for gilt-reconcile: `view!` element-tree composition.
//!
//! This crate is not meant to be used directly; enable the `macros` feature on `gilt-reconcile`.

use proc_macro::TokenStream;

mod view_macro;

/// RSX-style element-tree macro.
///
/// Transforms JSX-like syntax into `gilt_reconcile::element::ElementNode`
/// builder calls, as a compile-time alternative to a text template.
///
/// # Syntax
///
/// - `<tag />`: self-closing element
/// - `<tag attr="val"> ... </tag>`: element with children
/// - `"text"`: text content (adjacent literals are concatenated)
/// - `{expr}`: splice anything implementing `IntoChildren`
///
/// # Attributes
///
/// - `name="value"` becomes `.with_attr("name", "value")`
/// - `name={expr}` becomes `.with_attr("name", expr.to_string())`
/// - hyphenated names (`margin-left`) and keywords (`type`) are accepted
///
/// One root element yields an `ElementNode`; several yield a `Vec<ElementNode>`.
///
/// # Example
///
/// ```ignore
/// let node = view! {
///     <div class="horizontal">
///         <label id="greeting">"Hello"</label>
///         <button on_click="remove_todo(3)">"Remove"</button>
///     </div>
/// };
/// ```
#[proc_macro]
pub fn view(input: TokenStream) -> TokenStream {
    view_macro::view_impl(input.into())
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
