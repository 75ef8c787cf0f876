use serde::Deserialize;

/// A request announced by a host, as published on the `Request` queue.
///
/// ```json
/// { "uuid": "5b1f0a52-6f8e-4d0c-9a8b-2b1a4f0e9c11", "hostname": "node-1" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Request {
    /// Unique across all stored requests.
    pub uuid: String,
    pub hostname: String,
}

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error("The message body is not a valid request")]
    Malformed(#[from] serde_json::Error),
    #[error("The `{0}` field of the request is empty")]
    EmptyField(&'static str),
}

impl Request {
    /// Decode a message body.
    ///
    /// Unknown fields are ignored, both `uuid` and `hostname` must be non-empty strings.
    pub fn from_json(body: &[u8]) -> Result<Self, DecodeError> {
        let request: Request = serde_json::from_slice(body)?;
        if request.uuid.trim().is_empty() {
            return Err(DecodeError::EmptyField("uuid"));
        }
        if request.hostname.trim().is_empty() {
            return Err(DecodeError::EmptyField("hostname"));
        }
        Ok(request)
    }
}
