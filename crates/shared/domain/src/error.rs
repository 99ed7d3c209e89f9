use std::borrow::Cow;

#[svault_derive::svault_error]
pub enum DomainError {
    #[error("Invalid namespace{}: {message}", format_context(.context))]
    InvalidNamespace { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
