use amq_protocol_types::DeliveryTag;
use std::fmt;

/// The error type returned by message handlers.
///
/// It pairs the handler's own error with an [`ErrorType`], which the consumer uses to decide
/// between halting and rejecting the message (see [`FatalErrorPolicy`]).
///
/// [`FatalErrorPolicy`]: crate::consumers::FatalErrorPolicy
#[derive(Debug)]
pub struct HandlerError<E> {
    /// The underlying error returned by the message handler.
    pub inner_error: E,
    /// `error_type` distinguishes two classes of errors:
    /// - transient errors; message processing might succeed if retried after a short delay
    /// - fatal errors; no matter how many times you retry, processing will never succeed
    ///
    /// Check out [`ErrorType`]'s documentation for more details.
    pub error_type: ErrorType,
}

impl<E> HandlerError<E> {
    pub fn transient(inner_error: E) -> Self {
        Self {
            inner_error,
            error_type: ErrorType::Transient,
        }
    }

    pub fn fatal(inner_error: E) -> Self {
        Self {
            inner_error,
            error_type: ErrorType::Fatal,
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for HandlerError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.inner_error)
    }
}

impl<E> fmt::Display for HandlerError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handling of a message failed due to a {} issue", self.error_type)
    }
}

/// Types of failure when handling a message.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorType {
    /// Message processing might succeed if retried after a short delay.
    ///
    /// E.g. the database went away while we were inserting a record.
    ///
    /// The consumer always halts on a transient error, leaving the message unacknowledged:
    /// the broker hands it out again once the channel is gone.
    Transient,
    /// Message processing will never succeed, no matter how many times you retry or how long
    /// you wait.
    ///
    /// E.g. the message payload is malformed and cannot be deserialized.
    Fatal,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transient => write!(f, "transient"),
            Self::Fatal => write!(f, "fatal"),
        }
    }
}

/// Everything that can stop a [`Consumer`](crate::consumers::Consumer), from start-up to the
/// last delivery.
///
/// Each variant names the stage that failed.
#[derive(thiserror::Error, Debug)]
pub enum ConsumerError {
    #[error("Failed to connect to RabbitMQ")]
    Connect(#[source] anyhow::Error),
    #[error("Failed to open a channel")]
    OpenChannel(#[source] lapin::Error),
    #[error("Failed to declare queue `{queue_name}`")]
    DeclareQueue {
        queue_name: String,
        #[source]
        source: lapin::Error,
    },
    #[error("Failed to set QoS (prefetch count {prefetch_count})")]
    Qos {
        prefetch_count: u16,
        #[source]
        source: lapin::Error,
    },
    #[error("Failed to register a consumer on queue `{queue_name}`")]
    Consume {
        queue_name: String,
        #[source]
        source: lapin::Error,
    },
    #[error("The delivery stream failed")]
    Delivery(#[source] lapin::Error),
    #[error("Failed to {action} message {delivery_tag}")]
    Settle {
        action: &'static str,
        delivery_tag: DeliveryTag,
        #[source]
        source: lapin::Error,
    },
    #[error("Processing of message {delivery_tag} failed, the consumer has been halted")]
    Halted {
        delivery_tag: DeliveryTag,
        #[source]
        source: anyhow::Error,
    },
}

impl ConsumerError {
    /// `true` for failures raised while setting up the consumer, before any message was pulled.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::Connect(_)
                | Self::OpenChannel(_)
                | Self::DeclareQueue { .. }
                | Self::Qos { .. }
                | Self::Consume { .. }
        )
    }
}
