#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros shared by the vault infrastructure crates.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! svault-derive.workspace = true
//! thiserror.workspace = true
//! ```

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for layer error enums.
///
/// Turns a plain enum into an error type wired for the vault crates.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]` when missing.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to `Result<T, ErrorName>` and to `Result<T, SourceError>`.
/// * **Standard Conversions**: Implements `From<T>` for variants holding a `source` field,
///   so `?` lifts upstream errors.
/// * **Internal Fallback**: `From<&'static str>` and `From<String>` when an `Internal`
///   variant is present.
/// * **Kind Accessor**: `kind(&self) -> &'static str` returns the variant name. The bridge
///   reports it verbatim as the error kind.
///
/// # Requirements
///
/// 1. Must be applied to an **enum**.
/// 2. Context-carrying variants declare `context: Option<Cow<'static, str>>`.
/// 3. Variants with a `source` field (or `#[source]`/`#[from]`) must also carry `context`.
/// 4. Tuple and unit variants are rejected.
///
/// # Example
///
/// ```rust,ignore
/// use std::borrow::Cow;
///
/// #[svault_derive::svault_error]
/// pub enum StorageError {
///     #[error("I/O failure{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read() -> Result<Vec<u8>, StorageError> {
///     let bytes = std::fs::read("salt").context("Reading namespace salt")?;
///     if bytes.is_empty() {
///         return Err("salt file is empty".into());
///     }
///     Ok(bytes)
/// }
/// ```
#[proc_macro_attribute]
pub fn svault_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand_derive(input).into()
}
