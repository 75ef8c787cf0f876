use std::sync::Arc;

use crate::amqp::ConnectionFactory;
use crate::consumers::configuration::{ConsumerSettings, FatalErrorPolicy};
use crate::consumers::{connector, Consumer, ConsumerError, Handler};

/// A builder for a [`Consumer`].
///
/// Use [`ConsumerBuilder::new`] as entrypoint.
pub struct ConsumerBuilder<Context>
where
    Context: Send + Sync + 'static,
{
    connection_factory: ConnectionFactory,
    context: Arc<Context>,
    settings: ConsumerSettings,
}

impl<Context> ConsumerBuilder<Context>
where
    Context: Send + Sync + 'static,
{
    /// Start building a [`Consumer`].
    ///
    /// You will need a connection factory and a context.
    ///
    /// # Context
    ///
    /// In message handlers you will often need to use resources with a significant initialisation
    /// cost - e.g. a database connection pool.
    /// Instead of creating a new instance of these expensive resources every single time you handle
    /// a message, you can put those resources in the _context_.
    ///
    /// The context is created once, before the consumer is built, and the handler gets a
    /// shared reference to it together with each incoming message.
    ///
    /// ## Implementation Notes
    ///
    /// The context is wrapped in an `Arc` - if your context is already behind
    /// an `Arc` pointer, it won't be "double-wrapped".
    pub fn new(connection_factory: ConnectionFactory, context: impl Into<Arc<Context>>) -> Self {
        Self {
            connection_factory,
            context: context.into(),
            settings: ConsumerSettings::default(),
        }
    }

    /// Replace every consumer-level setting at once.
    #[must_use]
    pub fn settings(mut self, settings: ConsumerSettings) -> Self {
        self.settings = settings;
        self
    }

    /// The queue to consume from. Defaults to `Request`.
    #[must_use]
    pub fn queue_name<T: Into<String>>(mut self, queue_name: T) -> Self {
        self.settings.queue_name = queue_name.into();
        self
    }

    /// Configure the prefetch count of the consumer.
    /// If not configured, the prefetch count is set to a default value of 50.
    #[must_use]
    pub fn with_prefetch_count(mut self, prefetch_count: u16) -> Self {
        self.settings.prefetch_count = prefetch_count;
        self
    }

    /// Choose what happens to messages that fail with a fatal error.
    /// Defaults to [`FatalErrorPolicy::Halt`].
    #[must_use]
    pub fn on_fatal_error(mut self, policy: FatalErrorPolicy) -> Self {
        self.settings.on_fatal_error = policy;
        self
    }

    /// Stop the consumer after it has processed `n` messages.
    ///
    /// By default, the consumer will continue to consume messages indefinitely.
    #[must_use]
    pub fn exit_after(mut self, n: usize) -> Self {
        self.settings.exit_after = Some(n);
        self
    }

    /// Finalise the consumer with the handler that will process every message.
    ///
    /// When you `.await` `build`, a connection is established with the message broker,
    /// the queue is declared and QoS is applied.
    ///
    /// `build` does NOT trigger consumption of messages!
    /// Check out [`Consumer::run_until_shutdown`].
    pub async fn build<H>(self, handler: H) -> Result<Consumer<H>, ConsumerError>
    where
        H: Handler<Context = Context>,
    {
        let Self {
            connection_factory,
            context,
            settings,
        } = self;

        let bound_queue = connector::connect(
            &connection_factory,
            &settings.queue_name,
            settings.prefetch_count,
        )
        .await?;

        Ok(Consumer {
            bound_queue,
            exit_after: settings.exit_after,
            context,
            handler,
            on_fatal_error: settings.on_fatal_error,
        })
    }
}
