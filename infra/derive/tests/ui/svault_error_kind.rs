use std::borrow::Cow;
use svault_derive::svault_error;

#[svault_error]
pub enum LaneError {
    #[error("Cancelled{}", format_context(.context))]
    Cancelled { context: Option<Cow<'static, str>> },

    #[error("Platform failure: {message}")]
    Platform { message: Cow<'static, str> },

    #[error("Internal fault{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn main() {
    let cancelled: Result<(), LaneError> = Err(LaneError::Cancelled { context: None });
    let err = cancelled.context("prompt").unwrap_err();
    assert_eq!(err.kind(), "Cancelled");
    assert_eq!(err.to_string(), "Cancelled (prompt)");

    let platform = LaneError::Platform { message: "biometry locked".into() };
    assert_eq!(platform.kind(), "Platform");

    let internal: LaneError = String::from("boom").into();
    assert_eq!(internal.kind(), "Internal");
    assert_eq!(internal.to_string(), "Internal fault: boom");
}
