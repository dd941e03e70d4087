use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, ImplItem, ImplItemFn, ItemImpl, Stmt,
    Variant, Visibility,
};

/// Turns a plain error enum into a keyring-backup error type.
///
/// The macro:
/// 1. Adds `#[derive(Debug, thiserror::Error, uniffi::Error)]` and `#[uniffi(flat_error)]`
/// 2. Appends a `Generic { message: String }` variant unless one is declared
/// 3. Implements `From<anyhow::Error>`, flattening the cause chain into `message` with
///    `crate::error::AnyhowErrorExt`
/// 4. Adds `from_anyhow_result` / `from_anyhow_result_with_prefix` helpers
///
/// # Usage
///
/// ```rust,ignore
/// #[backup_error]
/// pub enum RestoreError {
///     #[error("saved state is corrupt: {reason}")]
///     Corrupt { reason: String },
/// }
/// ```
#[proc_macro_attribute]
pub fn backup_error(_args: TokenStream, input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(&input, "backup_error can only be applied to enums")
            .to_compile_error()
            .into();
    };

    let enum_name = &input.ident;
    let visibility = &input.vis;
    let generics = &input.generics;

    // derive and uniffi attributes are regenerated below
    let attrs: Vec<_> = input
        .attrs
        .iter()
        .filter(|attr| !attr.path().is_ident("derive") && !attr.path().is_ident("uniffi"))
        .collect();

    let mut variants = data_enum.variants.clone();
    if !variants.iter().any(|variant| variant.ident == "Generic") {
        let generic_variant: Variant = syn::parse_quote! {
            /// Any other failure, carrying the flattened error chain.
            #[error("Generic error: {message}")]
            Generic {
                /// The error message including its causes.
                message: String
            }
        };
        variants.push(generic_variant);
    }

    quote! {
        #[derive(Debug, thiserror::Error, uniffi::Error)]
        #[uniffi(flat_error)]
        #(#attrs)*
        #visibility enum #enum_name #generics {
            #variants
        }

        impl #generics From<anyhow::Error> for #enum_name #generics {
            fn from(err: anyhow::Error) -> Self {
                use crate::error::AnyhowErrorExt as _;
                Self::Generic {
                    message: err.to_generic_message(),
                }
            }
        }

        impl #generics #enum_name #generics {
            /// Convert an `anyhow::Result` to a Result with this error type
            pub fn from_anyhow_result<T>(result: anyhow::Result<T>) -> Result<T, Self> {
                result.map_err(Self::from)
            }

            /// Convert an `anyhow::Result` to a Result with this error type, adding a prefix
            pub fn from_anyhow_result_with_prefix<T>(
                result: anyhow::Result<T>,
                prefix: &str,
            ) -> Result<T, Self> {
                use crate::error::AnyhowErrorExt as _;
                result.map_err(|err| Self::Generic {
                    message: err.to_generic_message_with_prefix(prefix),
                })
            }
        }
    }
    .into()
}

/// Wraps `uniffi::export` and opens a logging context in every public method.
///
/// Each `pub fn` gets
/// `let _backup_logger_ctx = crate::primitives::logger::LogContext::new("TypeName");`
/// as its first statement, so the crate's logging macros prefix messages with
/// `[KeyringBackup][TypeName]`. When any public method is `async`,
/// `async_runtime = "tokio"` is added to the export arguments.
///
/// # Usage
///
/// ```rust,ignore
/// #[backup_export]
/// impl BackupCodeVerifier {
///     pub fn enter_code(&self) {
///         info!("entering code"); // logged as "[KeyringBackup][BackupCodeVerifier] entering code"
///     }
/// }
/// ```
#[proc_macro_attribute]
pub fn backup_export(args: TokenStream, input: TokenStream) -> TokenStream {
    let input_impl = parse_macro_input!(input as ItemImpl);

    let type_name = match &*input_impl.self_ty {
        syn::Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map_or_else(|| "Unknown".to_string(), |segment| segment.ident.to_string()),
        _ => "Unknown".to_string(),
    };

    let has_async_functions = has_async_functions_in_impl(&input_impl.items);

    let new_items = input_impl
        .items
        .iter()
        .map(|item| match item {
            ImplItem::Fn(method) if matches!(method.vis, Visibility::Public(_)) => {
                let mut new_method = method.clone();
                inject_logging_context(&mut new_method, &type_name);
                ImplItem::Fn(new_method)
            }
            other => other.clone(),
        })
        .collect();

    let new_impl = ItemImpl {
        items: new_items,
        ..input_impl
    };

    let args = export_args(proc_macro2::TokenStream::from(args), has_async_functions);

    quote! {
        #[uniffi::export(#args)]
        #new_impl
    }
    .into()
}

/// Appends the tokio runtime argument when the impl exposes async methods.
fn export_args(
    args: proc_macro2::TokenStream,
    has_async_functions: bool,
) -> proc_macro2::TokenStream {
    if !has_async_functions {
        return args;
    }
    if args.is_empty() {
        quote! { async_runtime = "tokio" }
    } else {
        quote! { #args, async_runtime = "tokio" }
    }
}

/// Check if any public functions in the impl items are async
fn has_async_functions_in_impl(impl_items: &[ImplItem]) -> bool {
    impl_items.iter().any(|item| {
        if let ImplItem::Fn(method) = item {
            matches!(method.vis, Visibility::Public(_)) && method.sig.asyncness.is_some()
        } else {
            false
        }
    })
}

fn inject_logging_context(method: &mut ImplItemFn, type_name: &str) {
    let context_stmt: Stmt = syn::parse_quote! {
        let _backup_logger_ctx = crate::primitives::logger::LogContext::new(#type_name);
    };
    method.block.stmts.insert(0, context_stmt);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_async_detection_with_async_functions() {
        let impl_block: ItemImpl = syn::parse_quote! {
            impl Verifier {
                pub fn enter_code(&self) {}

                pub async fn run_backup(&self) -> bool {
                    true
                }
            }
        };

        assert!(has_async_functions_in_impl(&impl_block.items));
    }

    #[test]
    fn test_async_detection_without_async_functions() {
        let impl_block: ItemImpl = syn::parse_quote! {
            impl Verifier {
                pub fn enter_code(&self) {}

                pub fn state(&self) -> u32 {
                    1
                }
            }
        };

        assert!(!has_async_functions_in_impl(&impl_block.items));
    }

    #[test]
    fn test_async_detection_ignores_private_async_functions() {
        let impl_block: ItemImpl = syn::parse_quote! {
            impl Verifier {
                pub fn enter_code(&self) {}

                async fn deliver(&self) {}
            }
        };

        assert!(!has_async_functions_in_impl(&impl_block.items));
    }

    #[test]
    fn test_export_args() {
        let args = export_args(proc_macro2::TokenStream::new(), false);
        assert!(args.is_empty());

        let args = export_args(proc_macro2::TokenStream::new(), true);
        assert_eq!(args.to_string(), "async_runtime = \"tokio\"");

        let args = export_args(quote! { with_foreign }, true);
        assert_eq!(args.to_string(), "with_foreign , async_runtime = \"tokio\"");
    }

    #[test]
    fn test_logging_context_is_first_statement() {
        let mut method: ImplItemFn = syn::parse_quote! {
            pub fn enter_code(&self) {
                self.run();
            }
        };

        inject_logging_context(&mut method, "Verifier");

        assert_eq!(method.block.stmts.len(), 2);
        let first = &method.block.stmts[0];
        let rendered = quote! { #first }.to_string();
        assert!(rendered.contains("LogContext :: new (\"Verifier\")"));
    }
}
