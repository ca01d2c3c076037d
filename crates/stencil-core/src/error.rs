use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiVersionError {
    #[error(
        "unsupported API version: service implements API version '{supported}', but asked for '{requested}'"
    )]
    Unsupported {
        supported: &'static str,
        requested: String,
    },
}
