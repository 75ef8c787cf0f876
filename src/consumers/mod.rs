//! Facilities to consume messages from a RabbitMq queue. Check out [`ConsumerBuilder`] as a
//! starting point.
pub use builder::ConsumerBuilder;
pub use configuration::{
    ConsumerSettings, FatalErrorPolicy, DEFAULT_PREFETCH_COUNT, DEFAULT_QUEUE_NAME,
};
pub use connector::{connect, durable_queue_options, BoundQueue};
pub use consumer::Consumer;
pub(crate) use configuration::Disposition;
pub use error::{ConsumerError, ErrorType, HandlerError};
pub use handler::{BrokerAction, Handler};
pub use incoming_message::{Delivery, Incoming};

mod builder;
mod configuration;
mod connector;
mod consumer;
mod error;
mod handler;
mod incoming_message;
