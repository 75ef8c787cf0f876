use clap::Parser;
use request_consumer::amqp::ConnectionFactory;
use request_consumer::cli::Cli;
use request_consumer::configuration::{Mode, Settings};
use request_consumer::consumers::{ConsumerBuilder, Handler};
use request_consumer::requests::{LogBody, PersistRequest};
use request_consumer::shutdown::cancel_on_signal;
use request_consumer::storage::MySqlRequestRepository;
use request_consumer::telemetry::init_subscriber;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_subscriber("info");

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), anyhow::Error> {
    let settings = cli.settings()?;
    let connection_factory = ConnectionFactory::new_from_config(&settings.rabbitmq)?;

    match &settings.mode {
        Mode::Persist(mysql) => {
            // Storage is prepared before connecting to the broker.
            let repository = Arc::new(MySqlRequestRepository::connect(mysql).await?);
            let outcome = persist(&settings, connection_factory, repository.clone()).await;
            repository.close().await;
            outcome
        }
        Mode::Log => consume(&settings, connection_factory, Arc::new(()), LogBody).await,
    }
}

/// Store every request in `repository`.
async fn persist(
    settings: &Settings,
    connection_factory: ConnectionFactory,
    repository: Arc<MySqlRequestRepository>,
) -> Result<(), anyhow::Error> {
    consume(
        settings,
        connection_factory,
        repository,
        PersistRequest::<MySqlRequestRepository>::new(),
    )
    .await
}

/// Build the consumer, then run it on its own task until a signal arrives or it stops.
async fn consume<H: Handler>(
    settings: &Settings,
    connection_factory: ConnectionFactory,
    context: Arc<H::Context>,
    handler: H,
) -> Result<(), anyhow::Error> {
    let consumer = ConsumerBuilder::<H::Context>::new(connection_factory, context)
        .settings(settings.consumer.clone())
        .build(handler)
        .await?;

    let shutdown = CancellationToken::new();
    let listener = cancel_on_signal(shutdown.clone())?;

    let worker = tokio::spawn({
        let shutdown = shutdown.clone();
        consumer.run_until_shutdown(async move { shutdown.cancelled().await })
    });
    tracing::info!(" [*] Waiting for messages. To exit press CTRL+C");

    let outcome = worker.await;
    listener.abort();
    outcome??;
    Ok(())
}
