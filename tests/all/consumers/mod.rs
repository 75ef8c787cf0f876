mod connector;
mod handlers;

use async_trait::async_trait;
use request_consumer::consumers::{BrokerAction, Handler, HandlerError, Incoming};
use std::convert::Infallible;
use tokio::sync::Mutex;

/// Records message bodies in the order they were handed to the handler.
pub struct RecordBodies;

#[async_trait]
impl Handler for RecordBodies {
    type Context = Mutex<Vec<String>>;
    type Error = Infallible;

    async fn handle(
        &self,
        incoming: &Incoming<Mutex<Vec<String>>>,
    ) -> Result<BrokerAction, HandlerError<Infallible>> {
        incoming
            .context
            .lock()
            .await
            .push(incoming.message.body_lossy().into_owned());
        Ok(BrokerAction::Ack)
    }
}
