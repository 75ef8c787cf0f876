use crate::consumers::{
    connector::BoundQueue, BrokerAction, ConsumerError, Delivery, Disposition, FatalErrorPolicy,
    Handler, Incoming,
};
use amq_protocol_types::FieldTable;
use futures_util::{Future, StreamExt};
use lapin::options::{
    BasicAckOptions, BasicCancelOptions, BasicConsumeOptions, BasicNackOptions,
    BasicRejectOptions,
};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// A RabbitMq consumer: it pulls messages from a single queue, hands them to a [`Handler`] one at
/// a time and settles each of them with the broker once the handler is done.
///
/// Use [`ConsumerBuilder`](crate::consumers::ConsumerBuilder) to build one.
///
/// # Ordering
///
/// Messages are processed sequentially, in delivery order.
/// The next message is not pulled until the previous one has been acked, nacked or rejected,
/// hence acknowledgments never get ahead of processing.
pub struct Consumer<H: Handler> {
    /// The connection, channel and queue we consume from.
    pub(super) bound_queue: BoundQueue,
    /// The maximum number of messages `Consumer` is going to process before exiting the processing
    /// loop.
    /// The consumer will process messages indefinitely if set to `None`.
    pub(super) exit_after: Option<usize>,
    /// Resources shared by every invocation of `handler`.
    pub(super) context: Arc<H::Context>,
    /// `handler` determines what processing will be run on each incoming message.
    pub(super) handler: H,
    /// What to do with messages failing with a fatal error.
    pub(super) on_fatal_error: FatalErrorPolicy,
}

impl<H: Handler> Consumer<H> {
    /// The name of the queue this consumer reads from.
    pub fn queue_name(&self) -> &str {
        self.bound_queue.queue_name()
    }

    /// Run the consumer, which will notify RabbitMq to start pushing messages on the specified
    /// queue.
    ///
    /// `run_until_shutdown` returns when:
    /// - `shutdown` completes;
    /// - the delivery stream ends or fails (e.g. the connection with RabbitMq is lost);
    /// - a message handler fails and the [`FatalErrorPolicy`] says to halt;
    /// - `exit_after` messages have been processed, if set.
    ///
    /// The channel is closed on the way out: deliveries we did not acknowledge are requeued
    /// by the broker.
    #[tracing::instrument(skip_all, name = "consumer_run", fields(queue_name = %self.queue_name()))]
    pub async fn run_until_shutdown(
        self,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), ConsumerError> {
        let queue_name = self.queue_name().to_owned();
        let consumer_tag = format!("{queue_name}-{}", Uuid::new_v4());
        let mut deliveries = self
            .bound_queue
            .channel
            .basic_consume(
                &queue_name,
                &consumer_tag,
                // `no_ack: false` - every message must be acknowledged explicitly.
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(|source| ConsumerError::Consume {
                queue_name: queue_name.clone(),
                source,
            })?;

        info!(consumer_tag = %consumer_tag, "Waiting for messages");

        let mut counter = 0;
        tokio::pin!(shutdown);

        let result = 'event_loop: loop {
            // have we consumed all the events we want?
            if self.exit_after == Some(counter) {
                info!(processed = counter, "Message limit reached");
                break 'event_loop Ok(());
            }

            tokio::select! {
                // prefer handling shutdowns before going on with processing more events
                biased;

                _ = &mut shutdown => {
                    info!("Consumer received shutdown event");
                    if let Err(e) = self
                        .bound_queue
                        .channel
                        .basic_cancel(&consumer_tag, BasicCancelOptions::default())
                        .await
                    {
                        warn!(error = %e, "Failed to cancel the consumer");
                    }
                    break 'event_loop Ok(());
                }

                event = deliveries.next() => {
                    match event {
                        // consumer has shutdown
                        None => {
                            info!("The delivery stream has ended");
                            break 'event_loop Ok(());
                        }
                        Some(Err(e)) => {
                            error!("Consumer error: {}", e);
                            break 'event_loop Err(ConsumerError::Delivery(e));
                        }
                        Some(Ok(delivery)) => {
                            counter += 1;
                            // Processing happens inline: the next delivery is only pulled
                            // once this one has been settled.
                            if let Err(e) = self.process(delivery.into(), &queue_name).await {
                                break 'event_loop Err(e);
                            }
                        }
                    }
                }
            }
        };

        self.bound_queue.close().await;
        result
    }

    /// Process an incoming message - handler, then ack/nack/reject against the AMQP broker.
    #[tracing::instrument(
        name = "process_message",
        skip_all,
        fields(delivery_tag = delivery.delivery_tag, redelivered = delivery.redelivered),
        level = tracing::Level::DEBUG
    )]
    async fn process(&self, delivery: Delivery, queue_name: &str) -> Result<(), ConsumerError> {
        let incoming = Incoming {
            context: self.context.clone(),
            message: delivery,
            queue_name: queue_name.to_owned(),
        };
        let delivery_tag = incoming.message.delivery_tag;

        let outcome = self.handler.handle(&incoming).await;
        if let Err(e) = &outcome {
            error!(
                error.type = %e.error_type,
                error.message = %e.inner_error,
                error.policy = ?self.on_fatal_error,
                "Failed to process message {}", delivery_tag
            );
        }

        match self.on_fatal_error.resolve(outcome) {
            Disposition::Settle(action) => settle(&incoming.message, action).await,
            Disposition::Halt(e) => Err(ConsumerError::Halted {
                delivery_tag,
                source: e.into(),
            }),
        }
    }
}

/// Tell the broker what happened to `message`.
async fn settle(message: &Delivery, action: BrokerAction) -> Result<(), ConsumerError> {
    let (verb, result) = match action {
        BrokerAction::Ack => (
            "ack",
            message.acker.ack(BasicAckOptions::default()).await.map(drop),
        ),
        BrokerAction::Nack => (
            "nack",
            message
                .acker
                .nack(BasicNackOptions {
                    multiple: false,
                    requeue: true,
                })
                .await
                .map(drop),
        ),
        BrokerAction::Reject => (
            "reject",
            message
                .acker
                .reject(BasicRejectOptions { requeue: false })
                .await
                .map(drop),
        ),
    };
    result.map_err(|source| ConsumerError::Settle {
        action: verb,
        delivery_tag: message.delivery_tag,
        source,
    })?;
    tracing::debug!(delivery_tag = message.delivery_tag, "Message {}ed", verb);
    Ok(())
}
