//! The `Handler` trait is heavily inspired by `tide`'s approach to endpoint handlers.
use crate::consumers::{error::HandlerError, Incoming};

/// What the consumer should tell the broker about a message once processing is over.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum BrokerAction {
    /// The message was processed, the broker can forget about it.
    Ack,
    /// Put the message back in the queue.
    Nack,
    /// Drop the message, without requeueing it.
    Reject,
}

/// Implementers of the `Handler` trait can be plugged into a [`Consumer`]
/// to process messages retrieved from a queue.
///
/// # Scope
///
/// `handle` does not get access to the underlying RabbitMq channel.
/// The consumer takes care of acking/rejecting the message with the broker according to the
/// outcome of processing (check out [`HandlerError`] for more details).
/// No acknowledgment is sent before `handle` returns.
///
/// [`Consumer`]: crate::consumers::Consumer
#[async_trait::async_trait]
pub trait Handler: Send + Sync + 'static {
    type Context: Send + Sync + 'static;
    type Error: std::error::Error + Send + Sync + 'static;

    async fn handle(
        &self,
        incoming: &Incoming<Self::Context>,
    ) -> Result<BrokerAction, HandlerError<Self::Error>>;
}
