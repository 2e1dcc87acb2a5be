//! Derive macros for composable action enums
//!
//! Feature actions mix user intent, effect responses and delegate notifications to
//! a parent. This crate generates the case helpers reducers and presentation
//! bindings use to tell them apart.
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates case helpers for action enums
//!
//! # Example
//!
//! ```ignore
//! use composable_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum AddContactAction {
//!     SaveButtonTapped,
//!     SetName(String),
//!
//!     #[delegate]
//!     Delegate(Delegate),
//! }
//!
//! // Generated methods:
//! assert!(AddContactAction::Delegate(Delegate::Cancel).is_delegate());
//! assert_eq!(AddContactAction::SetName("Blob".into()).try_into_set_name(), Some("Blob".into()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Ident, Variant};

/// Derive macro for Action enums
///
/// Generates helper methods for action enums:
/// - `is_delegate()` - Returns true if this variant is a delegate action
/// - `is_response()` - Returns true if this variant delivers an effect result
/// - `case_name()` - Returns the variant name, for logging
/// - `try_into_<case>(self)` / `as_<case>(&self)` - For every variant holding
///   exactly one unnamed field, extract that field
///
/// # Attributes
///
/// - `#[delegate]` - Mark a variant as a notification to the parent feature
/// - `#[response]` - Mark a variant as the result of an effect
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - A variant has both `#[delegate]` and `#[response]` attributes
///
/// # Example
///
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// enum CounterAction {
///     IncrementButtonTapped,
///     FactButtonTapped,
///
///     #[response]
///     FactResponse(Result<String, FactError>),
/// }
///
/// let action = CounterAction::FactResponse(Ok("42".into()));
/// assert!(action.is_response());
/// assert_eq!(action.case_name(), "FactResponse");
/// assert!(action.as_fact_response().is_some());
/// ```
#[proc_macro_derive(Action, attributes(delegate, response))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(&input, "#[derive(Action)] can only be used on enums")
            .to_compile_error()
            .into();
    };

    let mut delegate_arms = Vec::new();
    let mut response_arms = Vec::new();
    let mut case_name_arms = Vec::new();
    let mut accessors = Vec::new();

    for variant in &data_enum.variants {
        let is_delegate = has_attribute(&variant.attrs, "delegate");
        let is_response = has_attribute(&variant.attrs, "response");

        if is_delegate && is_response {
            return syn::Error::new_spanned(variant, "Variant cannot be both #[delegate] and #[response]")
                .to_compile_error()
                .into();
        }

        let pattern = wildcard_pattern(variant);
        if is_delegate {
            delegate_arms.push(quote! { #pattern => true, });
        }
        if is_response {
            response_arms.push(quote! { #pattern => true, });
        }

        let case_name = variant.ident.to_string();
        case_name_arms.push(quote! { #pattern => #case_name, });

        if let Some(accessor) = single_field_accessors(variant) {
            accessors.push(accessor);
        }
    }

    let expanded = quote! {
        impl #impl_generics #name #ty_generics #where_clause {
            /// Returns true if this action is a delegate action for the parent feature
            #[must_use]
            #[allow(clippy::match_like_matches_macro)]
            pub const fn is_delegate(&self) -> bool {
                match self {
                    #(#delegate_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action delivers the result of an effect
            #[must_use]
            #[allow(clippy::match_like_matches_macro)]
            pub const fn is_response(&self) -> bool {
                match self {
                    #(#response_arms)*
                    _ => false,
                }
            }

            /// Returns the name of this action's case
            #[must_use]
            pub const fn case_name(&self) -> &'static str {
                match self {
                    #(#case_name_arms)*
                }
            }

            #(#accessors)*
        }
    };

    TokenStream::from(expanded)
}

/// `Self::Variant`, `Self::Variant(..)` or `Self::Variant { .. }`
fn wildcard_pattern(variant: &Variant) -> proc_macro2::TokenStream {
    let ident = &variant.ident;
    match &variant.fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

/// `try_into_<case>` and `as_<case>` for a variant holding exactly one unnamed field
fn single_field_accessors(variant: &Variant) -> Option<proc_macro2::TokenStream> {
    let Fields::Unnamed(fields) = &variant.fields else {
        return None;
    };
    if fields.unnamed.len() != 1 {
        return None;
    }
    let field_ty = &fields.unnamed.first()?.ty;

    let ident = &variant.ident;
    let snake = to_snake_case(&ident.to_string());
    let try_into = Ident::new(&format!("try_into_{snake}"), Span::call_site());
    let as_ref = format_ident!("as_{}", snake);
    let try_into_doc = format!("The payload of `{ident}`, or `None` for any other case");
    let as_ref_doc = format!("Borrow the payload of `{ident}`, if this is that case");

    Some(quote! {
        #[doc = #try_into_doc]
        #[must_use]
        #[allow(clippy::missing_const_for_fn)]
        pub fn #try_into(self) -> ::std::option::Option<#field_ty> {
            match self {
                Self::#ident(value) => ::std::option::Option::Some(value),
                #[allow(unreachable_patterns)]
                _ => ::std::option::Option::None,
            }
        }

        #[doc = #as_ref_doc]
        #[must_use]
        pub const fn #as_ref(&self) -> ::std::option::Option<&#field_ty> {
            match self {
                Self::#ident(value) => ::std::option::Option::Some(value),
                #[allow(unreachable_patterns)]
                _ => ::std::option::Option::None,
            }
        }
    })
}

/// `FactResponse` -> `fact_response`
fn to_snake_case(name: &str) -> String {
    let mut snake = String::with_capacity(name.len() + 4);
    let mut previous_lower = false;
    for ch in name.chars() {
        if ch.is_uppercase() {
            if previous_lower {
                snake.push('_');
            }
            snake.extend(ch.to_lowercase());
            previous_lower = false;
        } else {
            snake.push(ch);
            previous_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    snake
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
