use std::borrow::Cow;
use svault_derive::svault_error;

#[svault_error]
pub enum DemoError {
    #[error("I/O failure{}: {source}", format_context(.context))]
    Io {
        #[source]
        source: std::io::Error,
        context: Option<Cow<'static, str>>,
    },

    #[error("Internal fault{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

fn read_salt() -> Result<Vec<u8>, DemoError> {
    let bytes = std::fs::read("/nonexistent/salt").context("Reading salt")?;
    if bytes.is_empty() {
        return Err("empty salt".into());
    }
    Ok(bytes)
}

fn main() {
    let err = read_salt().unwrap_err();
    assert_eq!(err.kind(), "Io");
    assert!(err.to_string().contains("(Reading salt)"));
}
