//! RSX view! macro: parse JSX-like syntax and generate ElementNode builder code.

use proc_macro2::{Span, TokenStream};
use quote::quote;
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::{braced, Error, Expr, Ident, LitStr, Result, Token};

// ---------------------------------------------------------------------------
// AST types
// ---------------------------------------------------------------------------

/// An attribute value: a string literal or a `{expr}` block.
#[derive(Clone)]
pub(crate) enum AttrValue {
    Literal(LitStr),
    Expr(Box<Expr>),
}

/// A parsed RSX attribute: `name="value"` or `name={expr}`.
///
/// Names may contain hyphens (`margin-left`) and may be Rust keywords.
#[derive(Clone)]
pub(crate) struct Attribute {
    pub name: String,
    pub span: Span,
    pub value: AttrValue,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let value = match &self.value {
            AttrValue::Literal(lit) => lit.value(),
            AttrValue::Expr(_) => "{..}".to_owned(),
        };
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("value", &value)
            .finish()
    }
}

/// Content between an element's open and close tags.
#[derive(Clone)]
pub(crate) enum Child {
    Element(Element),
    Text(LitStr),
    /// `{expr}`: anything implementing `IntoChildren`.
    Splice(Box<Expr>),
}

/// A parsed RSX element: `<tag attrs... />` or `<tag attrs...> children </tag>`.
#[derive(Clone)]
pub(crate) struct Element {
    pub tag: Ident,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Child>,
    pub self_closing: bool,
}

impl Element {
    fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Child::Element(e) => Some(e),
            _ => None,
        })
    }
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag.to_string())
            .field("attrs", &self.attrs)
            .field("children", &self.child_elements().collect::<Vec<_>>())
            .field("self_closing", &self.self_closing)
            .finish()
    }
}

/// The top-level view! input: a sequence of elements.
#[derive(Debug)]
struct ViewInput {
    elements: Vec<Element>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl Parse for ViewInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let mut elements = Vec::new();
        while !input.is_empty() {
            elements.push(parse_element(input)?);
        }
        Ok(ViewInput { elements })
    }
}

/// Parse `ident(-ident)*`, accepting keywords such as `type`.
fn parse_name(input: ParseStream) -> Result<(String, Span)> {
    let first = input.call(Ident::parse_any)?;
    let span = first.span();
    let mut name = first.to_string();
    while input.peek(Token![-]) {
        input.parse::<Token![-]>()?;
        let part = input.call(Ident::parse_any)?;
        name.push('-');
        name.push_str(&part.to_string());
    }
    Ok((name, span))
}

fn parse_block(input: ParseStream) -> Result<Expr> {
    let content;
    braced!(content in input);
    content.parse()
}

/// Parse a single RSX element from the token stream.
pub(crate) fn parse_element(input: ParseStream) -> Result<Element> {
    input.parse::<Token![<]>()?;
    let tag = input.call(Ident::parse_any)?;

    let mut attrs = Vec::new();
    loop {
        if input.peek(Token![/]) {
            input.parse::<Token![/]>()?;
            input.parse::<Token![>]>()?;
            return Ok(Element {
                tag,
                attrs,
                children: Vec::new(),
                self_closing: true,
            });
        }

        if input.peek(Token![>]) {
            input.parse::<Token![>]>()?;
            break;
        }

        let (name, span) = parse_name(input)?;
        input.parse::<Token![=]>()?;
        let value = if input.peek(syn::token::Brace) {
            AttrValue::Expr(Box::new(parse_block(input)?))
        } else {
            AttrValue::Literal(input.parse()?)
        };
        attrs.push(Attribute { name, span, value });
    }

    let mut children = Vec::new();
    loop {
        if input.peek(Token![<]) && input.peek2(Token![/]) {
            input.parse::<Token![<]>()?;
            input.parse::<Token![/]>()?;
            let closing_tag = input.call(Ident::parse_any)?;
            if closing_tag != tag {
                return Err(Error::new(
                    closing_tag.span(),
                    format!(
                        "mismatched closing tag: expected `</{}>`, found `</{}>`",
                        tag, closing_tag
                    ),
                ));
            }
            input.parse::<Token![>]>()?;
            break;
        }

        if input.peek(Token![<]) {
            children.push(Child::Element(parse_element(input)?));
        } else if input.peek(LitStr) {
            children.push(Child::Text(input.parse()?));
        } else if input.peek(syn::token::Brace) {
            children.push(Child::Splice(Box::new(parse_block(input)?)));
        } else {
            return Err(input.error(
                "expected a child element, a string literal, a `{..}` block or `</` to close the parent",
            ));
        }
    }

    Ok(Element {
        tag,
        attrs,
        children,
        self_closing: false,
    })
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

/// Generate code for a single element.
fn generate_element(elem: &Element) -> TokenStream {
    let tag = LitStr::new(&elem.tag.to_string(), elem.tag.span());
    let mut builder_calls = Vec::new();

    for attr in &elem.attrs {
        let name = LitStr::new(&attr.name, attr.span);
        let call = match &attr.value {
            AttrValue::Literal(val) => quote! { .with_attr(#name, #val) },
            AttrValue::Expr(expr) => quote! {
                .with_attr(#name, ::std::string::ToString::to_string(&(#expr)))
            },
        };
        builder_calls.push(call);
    }

    let text: String = elem
        .children
        .iter()
        .filter_map(|c| match c {
            Child::Text(lit) => Some(lit.value()),
            _ => None,
        })
        .collect();
    if !text.is_empty() {
        builder_calls.push(quote! { .with_text(#text) });
    }

    for child in &elem.children {
        match child {
            Child::Element(e) => {
                let child_code = generate_element(e);
                builder_calls.push(quote! { .with_child(#child_code) });
            }
            Child::Splice(expr) => builder_calls.push(quote! { .with_children(#expr) }),
            Child::Text(_) => {}
        }
    }

    quote! {
        ::gilt_reconcile::element::ElementNode::new(#tag) #(#builder_calls)*
    }
}

/// Entry point: generate code for the entire view! macro.
///
/// One root element yields an `ElementNode`; several yield a
/// `Vec<ElementNode>`.
pub(crate) fn view_impl(input: TokenStream) -> Result<TokenStream> {
    let parsed: ViewInput = syn::parse2(input)?;

    match parsed.elements.as_slice() {
        [] => Err(Error::new(
            Span::call_site(),
            "view! macro requires at least one element",
        )),
        [single] => Ok(generate_element(single)),
        many => {
            let exprs = many.iter().map(generate_element);
            Ok(quote! { ::std::vec![#(#exprs),*] })
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
