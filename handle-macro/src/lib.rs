use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Attribute, DeriveInput, Fields, Ident, Variant, Visibility, parse_macro_input};

/// Derives an actor handle from an event enum.
///
/// `FooEvent` produces a cloneable `FooHandle` around a
/// `tokio::sync::mpsc::Sender<FooEvent>` with one async method per variant
/// (`CamelCase` variant -> `snake_case` method, named fields become
/// parameters, tuple fields become `arg0..argN`). Doc comments on a variant
/// are carried over to its method. The handle shares the enum's visibility.
///
/// Methods return the `Result` alias in scope at the derive site, so that
/// crate's error type must implement `From<SendError<FooEvent>>`.
#[proc_macro_derive(Handle)]
pub fn handle(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand(&input).unwrap_or_else(syn::Error::into_compile_error).into()
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let syn::Data::Enum(data) = &input.data else {
        return Err(syn::Error::new_spanned(&input.ident, "Handle can only be derived for enums"));
    };
    let event = &input.ident;
    let vis = &input.vis;
    let handle = handle_ident(event);
    let methods = data.variants.iter().map(|variant| method(vis, event, variant));

    Ok(quote! {
        #[derive(Debug, Clone)]
        #vis struct #handle {
            tx: tokio::sync::mpsc::Sender<#event>,
        }

        impl #handle {
            #[allow(dead_code)]
            #vis fn new(tx: tokio::sync::mpsc::Sender<#event>) -> Self {
                Self { tx }
            }

            /// Handle plus the receiving end for the actor's run loop.
            #[allow(dead_code)]
            #vis fn channel(buffer: usize) -> (Self, tokio::sync::mpsc::Receiver<#event>) {
                let (tx, rx) = tokio::sync::mpsc::channel(buffer);
                (Self { tx }, rx)
            }

            /// false once the actor has dropped its receiver
            #[allow(dead_code)]
            #vis fn is_alive(&self) -> bool {
                !self.tx.is_closed()
            }

            #( #methods )*
        }
    })
}

/// `FooEvent` -> `FooHandle`, anything else gets `Handle` appended.
fn handle_ident(event: &Ident) -> Ident {
    let name = event.to_string();
    let stem = name.strip_suffix("Event").unwrap_or(&name);
    format_ident!("{}Handle", stem, span = event.span())
}

fn method(vis: &Visibility, event: &Ident, variant: &Variant) -> TokenStream2 {
    let name = &variant.ident;
    let method = Ident::new(&snake_case(&name.to_string()), name.span());
    let docs = doc_attrs(&variant.attrs);

    let (params, build) = match &variant.fields {
        Fields::Named(fields) => {
            let idents: Vec<_> = fields.named.iter().filter_map(|f| f.ident.as_ref()).collect();
            let types = fields.named.iter().map(|f| &f.ty);
            (quote! { #( #idents: #types ),* }, quote! { #event::#name { #( #idents ),* } })
        }
        Fields::Unnamed(fields) => {
            let idents: Vec<_> = (0..fields.unnamed.len()).map(|i| format_ident!("arg{}", i)).collect();
            let types = fields.unnamed.iter().map(|f| &f.ty);
            (quote! { #( #idents: #types ),* }, quote! { #event::#name( #( #idents ),* ) })
        }
        Fields::Unit => (TokenStream2::new(), quote! { #event::#name }),
    };

    quote! {
        #( #docs )*
        #vis async fn #method(&self, #params) -> Result<()> {
            self.tx.send(#build).await?;
            Ok(())
        }
    }
}

fn doc_attrs(attrs: &[Attribute]) -> impl Iterator<Item = &Attribute> {
    attrs.iter().filter(|attr| attr.path().is_ident("doc"))
}

/// `SetListener` -> `set_listener`, `HTTPProxy` -> `http_proxy`
fn snake_case(camel: &str) -> String {
    let chars: Vec<char> = camel.chars().collect();
    let mut out = String::with_capacity(camel.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() && i > 0 {
            let prev_lower = chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit();
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev_lower || (chars[i - 1].is_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.extend(c.to_lowercase());
    }
    out
}
