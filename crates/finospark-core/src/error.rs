//! Error types for FinoSpark

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message() {
        let err = reqwest::Client::new()
            .get("not a url")
            .build()
            .unwrap_err();

        let err = Error::from(err);
        assert!(matches!(err, Error::Http(_)));
        assert!(err.to_string().starts_with("HTTP client error:"));
    }
}
