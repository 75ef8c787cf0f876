use serde::Deserialize;

use crate::consumers::{BrokerAction, ErrorType, HandlerError};

/// The queue every consumer reads from unless told otherwise.
pub const DEFAULT_QUEUE_NAME: &str = "Request";
/// Upper bound on unacknowledged deliveries held by a consumer.
pub const DEFAULT_PREFETCH_COUNT: u16 = 50;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
/// Consumer-level configuration values.
///
/// Use [`ConsumerSettings::default()`] to get the values the service runs with out of the box:
/// queue `Request`, a prefetch count of 50, halting on fatal errors, no message limit.
pub struct ConsumerSettings {
    /// The name of the durable queue messages are pulled from.
    #[serde(default = "default_queue_name")]
    pub queue_name: String,
    /// The maximum number of unacknowledged messages the broker pushes to us.
    #[serde(default = "default_prefetch_count")]
    pub prefetch_count: u16,
    /// What to do when a message cannot be processed because of a [`ErrorType::Fatal`] error.
    #[serde(default)]
    pub on_fatal_error: FatalErrorPolicy,
    /// Stop after this many messages have been processed.
    /// The consumer will process messages indefinitely if set to `None`.
    #[serde(default)]
    pub exit_after: Option<usize>,
}

fn default_queue_name() -> String {
    DEFAULT_QUEUE_NAME.to_owned()
}

fn default_prefetch_count() -> u16 {
    DEFAULT_PREFETCH_COUNT
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            queue_name: default_queue_name(),
            prefetch_count: DEFAULT_PREFETCH_COUNT,
            on_fatal_error: FatalErrorPolicy::default(),
            exit_after: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
/// How a consumer reacts to a message that can never be processed (a poison message).
pub enum FatalErrorPolicy {
    /// Stop consuming and leave the message unacknowledged.
    ///
    /// The broker hands the message out again once our channel is closed, so a poison
    /// message will halt every consumer that picks it up.
    #[default]
    Halt,
    /// Reject the message without requeueing it and carry on with the next one.
    Reject,
}

/// What the consumer does with a message once its handler has returned.
#[derive(Debug)]
pub(crate) enum Disposition<E> {
    /// Settle the message with the broker and keep consuming.
    Settle(BrokerAction),
    /// Stop consuming without settling the message.
    Halt(HandlerError<E>),
}

impl FatalErrorPolicy {
    /// Map the outcome of a handler to the action taken by the consumer.
    ///
    /// Transient errors always halt, whatever the policy.
    pub(crate) fn resolve<E>(
        self,
        outcome: Result<BrokerAction, HandlerError<E>>,
    ) -> Disposition<E> {
        match outcome {
            Ok(action) => Disposition::Settle(action),
            Err(e) => match (e.error_type, self) {
                (ErrorType::Fatal, FatalErrorPolicy::Reject) => {
                    Disposition::Settle(BrokerAction::Reject)
                }
                _ => Disposition::Halt(e),
            },
        }
    }
}
