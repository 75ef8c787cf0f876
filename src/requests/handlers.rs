use std::convert::Infallible;
use std::marker::PhantomData;

use tracing::info;

use crate::consumers::{BrokerAction, Handler, HandlerError, Incoming};
use crate::requests::{DecodeError, Request};
use crate::storage::{RequestRepository, StorageError};

/// Decode each message as a [`Request`] and insert it in a [`RequestRepository`].
///
/// The repository is the consumer context.
///
/// - a request identical to one already stored is acknowledged without inserting it again, the
///   broker redelivers messages whose acknowledgment got lost;
/// - malformed bodies and `uuid`s already stored with a different `hostname` are fatal errors;
/// - any other storage failure is transient.
pub struct PersistRequest<R>(PhantomData<fn() -> R>);

impl<R> PersistRequest<R> {
    pub fn new() -> Self {
        Self(PhantomData)
    }
}

impl<R> Default for PersistRequest<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PersistRequestError {
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<PersistRequestError> for HandlerError<PersistRequestError> {
    fn from(e: PersistRequestError) -> Self {
        match &e {
            PersistRequestError::Decode(_) => HandlerError::fatal(e),
            PersistRequestError::Storage(storage) if storage.is_permanent() => {
                HandlerError::fatal(e)
            }
            PersistRequestError::Storage(_) => HandlerError::transient(e),
        }
    }
}

#[async_trait::async_trait]
impl<R: RequestRepository> Handler for PersistRequest<R> {
    type Context = R;
    type Error = PersistRequestError;

    async fn handle(
        &self,
        incoming: &Incoming<R>,
    ) -> Result<BrokerAction, HandlerError<PersistRequestError>> {
        info!(body = %incoming.message.body_lossy(), "Received a message");
        let request = Request::from_json(&incoming.message.data).map_err(PersistRequestError::from)?;
        match incoming.context.insert(&request).await {
            Ok(stored) => {
                info!(id = stored.id, uuid = %stored.uuid, hostname = %stored.hostname, "Request stored");
                Ok(BrokerAction::Ack)
            }
            Err(StorageError::Duplicate(uuid)) => {
                let existing = incoming
                    .context
                    .find_by_uuid(&uuid)
                    .await
                    .map_err(PersistRequestError::from)?;
                match existing {
                    Some(stored) if stored.hostname == request.hostname => {
                        info!(
                            id = stored.id,
                            uuid = %stored.uuid,
                            redelivered = incoming.message.redelivered,
                            "Request already stored"
                        );
                        Ok(BrokerAction::Ack)
                    }
                    _ => Err(PersistRequestError::from(StorageError::Duplicate(uuid)).into()),
                }
            }
            Err(e) => Err(PersistRequestError::from(e).into()),
        }
    }
}

/// Log the body of each message and acknowledge it.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogBody;

#[async_trait::async_trait]
impl Handler for LogBody {
    type Context = ();
    type Error = Infallible;

    async fn handle(&self, incoming: &Incoming<()>) -> Result<BrokerAction, HandlerError<Infallible>> {
        info!(
            delivery_tag = incoming.message.delivery_tag,
            queue_name = %incoming.queue_name,
            "Received a message: {}",
            incoming.message.body_lossy()
        );
        Ok(BrokerAction::Ack)
    }
}
