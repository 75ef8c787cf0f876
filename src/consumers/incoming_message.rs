use amq_protocol_types::{DeliveryTag, ShortString};
use lapin::{acker::Acker, BasicProperties};
use std::sync::Arc;

/// A dequeued message enriched with some auxiliary data, ready for processing.
///
/// `Incoming` is the input type of our message handlers (check out
/// [`Handler`](crate::consumers::Handler)'s docs for more details).
pub struct Incoming<C> {
    /// `context` is a set of resources that are required to process the message and are outside
    /// the lifecycle of the message itself - e.g. a database connection pool.
    ///
    /// It is created once, when the consumer is built, and shared by every message.
    pub context: Arc<C>,
    /// `message` is what we received from RabbitMq: it includes headers, payload, delivery tag, etc.
    pub message: Delivery,
    /// The name of the queue.
    pub queue_name: String,
}

/// A received AMQP message.
#[derive(Debug, PartialEq)]
pub struct Delivery {
    /// The delivery tag of the message.
    pub delivery_tag: DeliveryTag,

    /// The exchange of the message. May be an empty string
    /// if the default exchange is used.
    pub exchange: ShortString,

    /// The routing key of the message. May be an empty string
    /// if no routing key is specified.
    pub routing_key: ShortString,

    /// Whether this message was redelivered
    pub redelivered: bool,

    /// Contains the properties and the headers of the
    /// message.
    pub properties: BasicProperties,

    /// The payload of the message in binary format.
    pub data: Vec<u8>,

    // Hidden from public interface, to stop a message being acked / rejected inside a message handler.
    // AMQP protocol specifics that a message must not be acked /rejected multiple times:
    // https://www.rabbitmq.com/amqp-0-9-1-reference.html#basic.ack.delivery-tag
    pub(crate) acker: Acker,
}

impl Delivery {
    /// The payload, decoded as UTF-8. Invalid sequences are replaced.
    pub fn body_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.data)
    }
}

impl From<lapin::message::Delivery> for Delivery {
    fn from(value: lapin::message::Delivery) -> Self {
        Self {
            delivery_tag: value.delivery_tag,
            exchange: value.exchange,
            routing_key: value.routing_key,
            redelivered: value.redelivered,
            properties: value.properties,
            data: value.data,
            acker: value.acker,
        }
    }
}

#[cfg(test)]
impl Delivery {
    /// A delivery that never reached a broker, for handler tests.
    pub(crate) fn detached(delivery_tag: DeliveryTag, data: impl Into<Vec<u8>>) -> Self {
        Self {
            delivery_tag,
            exchange: "".into(),
            routing_key: "Request".into(),
            redelivered: false,
            properties: BasicProperties::default(),
            data: data.into(),
            acker: Default::default(),
        }
    }
}
