//! Mockable attribute macro for the attest framework
//!
//! Provides the `#[mockable]` attribute macro that generates, for a trait
//! `Foo`, a `MockFoo` struct implementing the trait. Every generated method
//! records its invocation into the shared scenario and dispatches it against
//! the mock's behavior table; the trait itself is re-emitted unchanged.
//!
//! This is the explicit-mock-per-trait replacement for runtime proxying:
//! the interception code is spelled out at compile time instead of being
//! synthesized at run time.

use proc_macro::TokenStream;
use quote::{format_ident, quote, ToTokens};
use syn::{FnArg, ItemTrait, Pat, TraitItem, TraitItemFn, Type};

use crate::utils::{snake_case, type_label};

/// Implements the `#[mockable]` attribute macro
///
/// # Example
///
/// ```rust,ignore
/// use attest::mockable;
///
/// #[mockable]
/// pub trait OrderRepository {
///     fn by_id(&self, id: u64) -> Option<Order>;
///     fn save(&self, order: &Order) -> Result<(), RepositoryError>;
/// }
///
/// // In a test:
/// let context = TestContext::new();
/// let repository = MockOrderRepository::new(&context);
/// repository.when("by_id").with([eq(7u64)]).returns(Some(order));
/// ```
///
/// For traits with `async fn` methods, place `#[mockable]` *above*
/// `#[async_trait]` so the mock sees the methods before they are desugared:
///
/// ```rust,ignore
/// #[mockable]
/// #[async_trait]
/// pub trait PaymentGateway {
///     async fn charge(&self, order_id: u64, amount_cents: i64) -> PaymentOutcome;
/// }
/// ```
///
/// Requirements: methods take `&self` or `&mut self`, parameters implement
/// `serde::Serialize`, return types implement `serde::Deserialize`.
pub fn mockable_impl(_attr: TokenStream, input: TokenStream) -> TokenStream {
    let item_trait = syn::parse_macro_input!(input as ItemTrait);

    if !item_trait.generics.params.is_empty() {
        return syn::Error::new_spanned(
            &item_trait.generics,
            "mockable does not support generic traits",
        )
        .to_compile_error()
        .into();
    }

    let trait_name = &item_trait.ident;
    let trait_name_str = trait_name.to_string();
    let vis = &item_trait.vis;
    let mock_name = format_ident!("Mock{}", trait_name);
    let default_mock_name = format!("{}_mock", snake_case(&trait_name_str));

    let mut descriptors = Vec::new();
    let mut methods = Vec::new();
    let mut has_async_methods = false;

    for item in &item_trait.items {
        let method = match item {
            TraitItem::Fn(method) => method,
            TraitItem::Const(item) => {
                return syn::Error::new_spanned(
                    item,
                    "mockable does not support associated consts",
                )
                .to_compile_error()
                .into();
            }
            TraitItem::Type(item) => {
                return syn::Error::new_spanned(
                    item,
                    "mockable does not support associated types",
                )
                .to_compile_error()
                .into();
            }
            _ => continue,
        };
        match generate_method(method) {
            Ok(generated) => {
                if method.sig.asyncness.is_some() {
                    has_async_methods = true;
                }
                descriptors.push(generated.descriptor);
                methods.push(generated.implementation);
            }
            Err(err) => return err.to_compile_error().into(),
        }
    }

    let async_trait_attr = has_async_methods.then(|| {
        quote! { #[::attest::async_trait::async_trait] }
    });

    let expanded = quote! {
        #item_trait

        #[derive(Debug, Clone)]
        #vis struct #mock_name {
            core: ::attest::mock::MockCore,
        }

        impl #mock_name {
            const METHODS: &'static [::attest::mock::MethodDescriptor] = &[
                #(#descriptors),*
            ];

            /// Create a mock with the default name, recording into the
            /// context's scenario
            pub fn new(context: &::attest::mock::TestContext) -> Self {
                Self::named(#default_mock_name, context)
            }

            /// Create a named mock, recording into the context's scenario
            pub fn named(
                name: impl ::std::convert::Into<::std::string::String>,
                context: &::attest::mock::TestContext,
            ) -> Self {
                Self {
                    core: ::attest::mock::MockCore::new(
                        name.into(),
                        #trait_name_str,
                        Self::METHODS,
                        context.scenario(),
                    ),
                }
            }

            /// Start defining behavior for a method
            #[track_caller]
            pub fn when(&self, method: &str) -> ::attest::mock::BehaviorBuilder<'_> {
                self.core.when(method)
            }

            /// Start verifying invocations of a method
            #[track_caller]
            pub fn verify(&self, method: &str) -> ::attest::mock::VerifyBuilder<'_> {
                self.core.verify(method)
            }

            /// All recorded invocations of a method on this mock
            pub fn invocations(
                &self,
                method: &str,
            ) -> ::std::vec::Vec<::attest::mock::Invocation> {
                self.core.invocations(method)
            }

            /// Remove all behavior defined for this mock, keeping observed
            /// invocations
            pub fn reset_behavior(&self) {
                self.core.reset_behavior()
            }

            /// The underlying dispatch core
            pub fn core(&self) -> &::attest::mock::MockCore {
                &self.core
            }
        }

        #async_trait_attr
        impl #trait_name for #mock_name {
            #(#methods)*
        }
    };

    TokenStream::from(expanded)
}

struct GeneratedMethod {
    descriptor: proc_macro2::TokenStream,
    implementation: proc_macro2::TokenStream,
}

fn generate_method(method: &TraitItemFn) -> syn::Result<GeneratedMethod> {
    let sig = &method.sig;
    let name_str = sig.ident.to_string();

    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "mockable does not support generic methods",
        ));
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver)) if receiver.reference.is_some() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                sig,
                "mockable methods must take &self or &mut self",
            ));
        }
    }

    let mut param_types = Vec::new();
    let mut argument_exprs = Vec::new();
    for input in inputs {
        let pat_type = match input {
            FnArg::Typed(pat_type) => pat_type,
            FnArg::Receiver(receiver) => {
                return Err(syn::Error::new_spanned(receiver, "unexpected receiver"));
            }
        };
        let ident = match pat_type.pat.as_ref() {
            Pat::Ident(pat_ident) => &pat_ident.ident,
            other => {
                return Err(syn::Error::new_spanned(
                    other,
                    "mockable method parameters must have simple names",
                ));
            }
        };
        let label = type_label(&pat_type.ty.to_token_stream().to_string());
        param_types.push(label);

        // Reference parameters keep their address so same() can match by
        // identity; by-value parameters are reflected only.
        let expr = match pat_type.ty.as_ref() {
            Type::Reference(_) => quote! { ::attest::mock::ArgValue::of_ref(#ident) },
            _ => quote! { ::attest::mock::ArgValue::of(&#ident) },
        };
        argument_exprs.push(expr);
    }

    let descriptor = quote! {
        ::attest::mock::MethodDescriptor {
            name: #name_str,
            param_types: &[#(#param_types),*],
        }
    };

    let implementation = quote! {
        #sig {
            let arguments = ::std::vec![#(#argument_exprs),*];
            let invocation = self.core.invocation(
                #name_str,
                arguments,
                ::attest::mock::CallSite::new(::std::file!(), ::std::line!()),
            );
            match self.core.dispatch(invocation) {
                ::attest::mock::DispatchOutcome::Value(value) => {
                    self.core.return_value(#name_str, value)
                }
                ::attest::mock::DispatchOutcome::Error(error) => {
                    self.core.error_value(#name_str, error)
                }
                ::attest::mock::DispatchOutcome::Default => {
                    self.core.default_return(#name_str)
                }
            }
        }
    };

    Ok(GeneratedMethod {
        descriptor,
        implementation,
    })
}
