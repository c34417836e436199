use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{parse_macro_input, spanned::Spanned, FnArg, Ident, ItemFn, Pat, Signature, Type};

/// Transform an asynchronous test into a synchronous one, start a mock voting
/// backend for it, and inject dependencies.
///
/// Injectable dependencies are [`crate::test_support::MockBackend`] and
/// [`crate::session::AuthManager`]. With `#[client_test(voter)]` the injected
/// `AuthManager` is already logged in as the example voter; otherwise it is
/// logged out.
#[proc_macro_attribute]
pub fn client_test(args: TokenStream, input: TokenStream) -> TokenStream {
    let mut item_fn = parse_macro_input!(input as ItemFn);

    // Extract the injected arguments and reject invalid function signatures.
    let test_args = match check_sig(item_fn.sig.clone()) {
        Ok(args) => args,
        Err(err) => {
            return err.into_compile_error().into();
        }
    };

    // Rename the future so the test can have its original name.
    let name = item_fn.sig.ident.clone();
    let new_name = format_ident!("{}_fut", name);
    item_fn.sig.ident = new_name.clone();

    // Log the voter in if needed.
    let auth_setup = match parse_macro_input!(args as Option<Ident>) {
        Some(arg) if arg == "voter" => quote! {
            let auth = backend.logged_in().await;
        },
        Some(arg) => {
            return syn::Error::new(arg.span(), "Expected `voter` or no argument")
                .into_compile_error()
                .into();
        }
        None => quote! {
            let auth = backend.auth_manager();
        },
    };

    // Rewrite the test function.
    quote! {
        #[test]
        fn #name() {
            /// The test itself.
            #item_fn

            log4rs_test_utils::test_logging::init_logging_once_for(
                ["voting_client"],
                None,
                None,
            );

            // Everything runs on one thread, including the backend, so tests
            // may pause the clock.
            let runtime = tokio::runtime::Builder::new_current_thread()
                .thread_name("client-test")
                .enable_all()
                .build()
                .unwrap();

            runtime.block_on(async {
                let backend = crate::test_support::MockBackend::start().await;
                #[allow(unused_variables)]
                #auth_setup

                #new_name(#(#test_args),*).await;
            });
        }
    }
    .into()
}

/// Ensure the wrapped test is async, work out which parameters to inject, and
/// reject unknown parameters.
fn check_sig(sig: Signature) -> Result<Vec<TokenStream2>, syn::Error> {
    if sig.asyncness.is_none() {
        return Err(syn::Error::new(sig.span(), "Test must be marked `async`"));
    }

    let mut has_backend = false;
    let mut has_auth = false;
    let mut args = vec![];

    for input in &sig.inputs {
        if let FnArg::Typed(pat_type) = input {
            if let Pat::Ident(_) = &*pat_type.pat {
                if let Type::Path(type_path) = &*pat_type.ty {
                    // Valid as the last path segment for any type is itself.
                    if let Some(segment) = type_path.path.segments.last() {
                        if segment.ident == "MockBackend" {
                            if has_backend {
                                return Err(syn::Error::new(
                                    input.span(),
                                    "Test cannot accept more than one `MockBackend`",
                                ));
                            }
                            has_backend = true;
                            args.push(quote! { backend });
                            continue;
                        } else if segment.ident == "AuthManager" {
                            if has_auth {
                                return Err(syn::Error::new(
                                    input.span(),
                                    "Test cannot accept more than one `AuthManager`",
                                ));
                            }
                            has_auth = true;
                            args.push(quote! { auth });
                            continue;
                        }
                    }
                }
            }
        }

        return Err(syn::Error::new(
            input.span(),
            "Expected one of `backend_ident: MockBackend` or `auth_ident: AuthManager`",
        ));
    }

    Ok(args)
}
