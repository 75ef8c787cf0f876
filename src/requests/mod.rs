//! The `Request` record and the message handlers of the two processing modes.
mod handlers;
mod record;

pub use handlers::{LogBody, PersistRequest, PersistRequestError};
pub use record::{DecodeError, Request};
