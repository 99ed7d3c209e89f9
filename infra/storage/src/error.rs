use std::borrow::Cow;

#[svault_derive::svault_error]
pub enum StorageError {
    /// Nothing is stored under the requested name. Absence, not corruption.
    #[error("Record not found{}: {message}", format_context(.context))]
    RecordNotFound { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Path traversal security violation{}: {message}", format_context(.context))]
    PathTraversalAttempt { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}
