use thiserror::Error;

/// Failure to even construct a transport link. Unlike a lost
/// connection this is not retried: the endpoint is static, so a bad
/// one stays bad.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("unsupported endpoint scheme '{0}'")]
    UnsupportedScheme(String),
    #[error("invalid endpoint '{0}'")]
    InvalidEndpoint(String),
}
