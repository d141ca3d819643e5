//! Procedural macros for lambda-bridge.
//!
//! This crate provides the `#[responder]` attribute macro, which turns an
//! async function into a type implementing `lambda_bridge::handler::Responder`.
//!
//! # Example
//!
//! ```ignore
//! use lambda_bridge::prelude::*;
//!
//! #[responder]
//! async fn hello(request: HttpRequest) -> Result<HttpResponse, BoxError> {
//!     Ok(HttpResponse::text("Hello, World!"))
//! }
//!
//! let app = Application::new(HelloResponder);
//! ```

use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{
    parse_macro_input, punctuated::Punctuated, Expr, ExprLit, FnArg, Ident, ItemFn, Lit, Meta,
    Token,
};

/// Attributes for the `#[responder]` macro.
#[derive(Default, Debug)]
struct ResponderAttrs {
    /// Name of the generated struct.
    name: Option<Ident>,
}

impl ResponderAttrs {
    fn parse_meta_list(metas: Punctuated<Meta, Token![,]>) -> syn::Result<Self> {
        let mut attrs = ResponderAttrs::default();

        for meta in metas {
            match meta {
                Meta::NameValue(nv) => {
                    let ident = nv
                        .path
                        .get_ident()
                        .ok_or_else(|| syn::Error::new_spanned(&nv.path, "expected identifier"))?
                        .to_string();

                    let lit_str = match &nv.value {
                        Expr::Lit(ExprLit {
                            lit: Lit::Str(lit_str),
                            ..
                        }) => lit_str.clone(),
                        _ => {
                            return Err(syn::Error::new_spanned(
                                &nv.value,
                                "expected string literal",
                            ))
                        }
                    };

                    match ident.as_str() {
                        "name" => attrs.name = Some(lit_str.parse()?),
                        _ => {
                            return Err(syn::Error::new_spanned(
                                nv.path,
                                format!("unknown attribute: {}", ident),
                            ));
                        }
                    }
                }
                _ => return Err(syn::Error::new_spanned(meta, "expected name = value")),
            }
        }

        Ok(attrs)
    }
}

/// Generate a `Responder` implementation from an async function.
///
/// The function must be `async`, take a single `HttpRequest` and return
/// `Result<HttpResponse, E>` where `E: Into<BoxError>`. The function is kept
/// as written; a unit struct named `{PascalCaseName}Responder` is generated
/// next to it.
///
/// # Attributes
///
/// - `name` (optional): name of the generated struct
///
/// # Example
///
/// ```ignore
/// #[responder(name = "Api")]
/// async fn handle(request: HttpRequest) -> Result<HttpResponse, BoxError> {
///     Ok(HttpResponse::ok())
/// }
///
/// let app = Application::new(Api);
/// ```
#[proc_macro_attribute]
pub fn responder(args: TokenStream, input: TokenStream) -> TokenStream {
    let args = parse_macro_input!(args with Punctuated::<Meta, Token![,]>::parse_terminated);
    let input_fn = parse_macro_input!(input as ItemFn);

    match generate_responder(args, input_fn) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_responder(
    args: Punctuated<Meta, Token![,]>,
    input_fn: ItemFn,
) -> syn::Result<proc_macro2::TokenStream> {
    let attrs = ResponderAttrs::parse_meta_list(args)?;

    if input_fn.sig.asyncness.is_none() {
        return Err(syn::Error::new_spanned(
            &input_fn.sig,
            "responder must be async",
        ));
    }
    if input_fn.sig.inputs.len() != 1
        || !matches!(input_fn.sig.inputs.first(), Some(FnArg::Typed(_)))
    {
        return Err(syn::Error::new_spanned(
            &input_fn.sig.inputs,
            "responder takes exactly one argument: the request",
        ));
    }

    let fn_name = &input_fn.sig.ident;
    let fn_vis = &input_fn.vis;
    let struct_name = attrs
        .name
        .unwrap_or_else(|| format_ident!("{}Responder", to_pascal_case(&fn_name.to_string())));

    let expanded = quote! {
        #input_fn

        /// Generated responder calling the function of the same name.
        #[derive(Debug, Clone, Copy, Default)]
        #fn_vis struct #struct_name;

        #[::lambda_bridge::prelude::async_trait]
        impl ::lambda_bridge::handler::Responder for #struct_name {
            async fn respond(
                &self,
                request: ::lambda_bridge::http::HttpRequest,
            ) -> ::core::result::Result<
                ::lambda_bridge::http::HttpResponse,
                ::lambda_bridge::error::BoxError,
            > {
                #fn_name(request).await.map_err(::core::convert::Into::into)
            }
        }
    };

    Ok(expanded)
}

/// Convert a snake_case string to PascalCase.
fn to_pascal_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("hello"), "Hello");
        assert_eq!(to_pascal_case("list_todos"), "ListTodos");
        assert_eq!(to_pascal_case("_private"), "Private");
    }

    #[test]
    fn test_name_attribute() {
        let metas: Punctuated<Meta, Token![,]> = syn::parse_quote!(name = "Api");
        let attrs = ResponderAttrs::parse_meta_list(metas).unwrap();
        assert_eq!(attrs.name.unwrap().to_string(), "Api");
    }

    #[test]
    fn test_rejects_sync_fn() {
        let input: ItemFn = syn::parse_quote! {
            fn hello(request: HttpRequest) -> Result<HttpResponse, BoxError> {
                Ok(HttpResponse::ok())
            }
        };
        assert!(generate_responder(Punctuated::new(), input).is_err());
    }

    #[test]
    fn test_generates_struct() {
        let input: ItemFn = syn::parse_quote! {
            async fn list_todos(request: HttpRequest) -> Result<HttpResponse, BoxError> {
                Ok(HttpResponse::ok())
            }
        };
        let tokens = generate_responder(Punctuated::new(), input).unwrap().to_string();
        assert!(tokens.contains("struct ListTodosResponder"));
        assert!(tokens.contains("async fn list_todos"));
    }
}
