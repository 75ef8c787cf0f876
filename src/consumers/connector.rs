//! Set up the broker side of a consumer: connection, channel, queue and QoS.
use amq_protocol_types::FieldTable;
use lapin::options::{BasicQosOptions, QueueDeclareOptions};
use lapin::{Channel, Connection, Queue};
use tracing::info;

use crate::amqp::ConnectionFactory;
use crate::consumers::ConsumerError;

/// An open channel bound to a declared, durable queue, with QoS applied.
///
/// Produced by [`connect`]. Dropping it does not close anything: use [`BoundQueue::close`].
pub struct BoundQueue {
    pub(crate) connection: Connection,
    pub(crate) channel: Channel,
    pub(crate) queue: Queue,
}

impl BoundQueue {
    /// The name of the declared queue.
    pub fn queue_name(&self) -> &str {
        self.queue.name().as_str()
    }

    /// Messages ready in the queue when it was declared.
    pub fn message_count(&self) -> u32 {
        self.queue.message_count()
    }

    /// Close the channel and the connection.
    ///
    /// Messages delivered to us but never acknowledged go back to the queue.
    pub async fn close(&self) {
        if let Err(e) = self.channel.close(200, "consumer stopped").await {
            tracing::warn!(error = %e, "Failed to close the RabbitMQ channel");
        }
        if let Err(e) = self.connection.close(200, "consumer stopped").await {
            tracing::warn!(error = %e, "Failed to close the RabbitMQ connection");
        }
    }
}

/// The options used to declare the consumer queue.
///
/// Re-declaring a queue that already exists with the same options is a no-op on the broker.
pub fn durable_queue_options() -> QueueDeclareOptions {
    QueueDeclareOptions {
        passive: false,
        durable: true,
        exclusive: false,
        auto_delete: false,
        nowait: false,
    }
}

/// Connect to the broker, open a channel, declare `queue_name` as a durable queue and cap the
/// number of unacknowledged deliveries to `prefetch_count`.
///
/// Every failure is reported as the [`ConsumerError`] variant of the stage that failed.
/// Nothing is retried.
#[tracing::instrument(name = "consumer_connect", skip(connection_factory), fields(address = %connection_factory.address()))]
pub async fn connect(
    connection_factory: &ConnectionFactory,
    queue_name: &str,
    prefetch_count: u16,
) -> Result<BoundQueue, ConsumerError> {
    let connection = connection_factory
        .new_connection()
        .await
        .map_err(ConsumerError::Connect)?;
    let channel = connection
        .create_channel()
        .await
        .map_err(ConsumerError::OpenChannel)?;

    let queue = channel
        .queue_declare(queue_name, durable_queue_options(), FieldTable::default())
        .await
        .map_err(|source| ConsumerError::DeclareQueue {
            queue_name: queue_name.to_owned(),
            source,
        })?;

    // A prefetch size of 0 means "no limit on the size of in-flight messages".
    channel
        .basic_qos(prefetch_count, BasicQosOptions { global: false })
        .await
        .map_err(|source| ConsumerError::Qos {
            prefetch_count,
            source,
        })?;

    info!(
        queue_name = queue.name().as_str(),
        message_count = queue.message_count(),
        consumer_count = queue.consumer_count(),
        prefetch_count,
        "Queue declared"
    );

    Ok(BoundQueue {
        connection,
        channel,
        queue,
    })
}
