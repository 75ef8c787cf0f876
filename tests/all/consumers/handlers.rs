use crate::consumers::RecordBodies;
use crate::helpers::{delete_queue, get_connection_factory, publish, wait_for_ready_messages};
use async_trait::async_trait;
use fake::{Fake, Faker};
use request_consumer::consumers::{BrokerAction, ConsumerBuilder, Handler, HandlerError, Incoming};
use request_consumer::requests::LogBody;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires a RabbitMQ broker on localhost:5672"]
async fn logged_message_is_acknowledged() {
    // Arrange
    let queue_name = Uuid::new_v4().to_string();
    let consumer = ConsumerBuilder::new(get_connection_factory(), ())
        .queue_name(&queue_name)
        .exit_after(1)
        .build(LogBody)
        .await
        .unwrap();
    let body: String = Faker.fake();
    publish(&queue_name, &[&body]).await;

    // Act
    consumer
        .run_until_shutdown(std::future::pending())
        .await
        .unwrap();

    // Assert: the channel is closed, anything left unacknowledged would be ready again.
    wait_for_ready_messages(&queue_name, 0).await;
    delete_queue(&queue_name).await;
}

#[tokio::test]
#[ignore = "requires a RabbitMQ broker on localhost:5672"]
async fn messages_are_processed_in_delivery_order() {
    // Arrange
    let queue_name = Uuid::new_v4().to_string();
    let bodies: Vec<String> = (0..20).map(|i| format!("message-{i}")).collect();
    let received: Arc<Mutex<Vec<String>>> = Arc::default();
    let consumer = ConsumerBuilder::new(get_connection_factory(), received.clone())
        .queue_name(&queue_name)
        .exit_after(bodies.len())
        .build(RecordBodies)
        .await
        .unwrap();
    let payloads: Vec<&str> = bodies.iter().map(String::as_str).collect();
    publish(&queue_name, &payloads).await;

    // Act
    consumer
        .run_until_shutdown(std::future::pending())
        .await
        .unwrap();

    // Assert
    assert_eq!(*received.lock().await, bodies);
    wait_for_ready_messages(&queue_name, 0).await;
    delete_queue(&queue_name).await;
}

#[tokio::test]
#[ignore = "requires a RabbitMQ broker on localhost:5672"]
async fn shutdown_stops_an_idle_consumer() {
    // Arrange
    let queue_name = Uuid::new_v4().to_string();
    let consumer = ConsumerBuilder::new(get_connection_factory(), ())
        .queue_name(&queue_name)
        .build(LogBody)
        .await
        .unwrap();
    let shutdown = CancellationToken::new();
    let handle = tokio::spawn({
        let shutdown = shutdown.clone();
        consumer.run_until_shutdown(async move { shutdown.cancelled().await })
    });

    // Act
    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown.cancel();

    // Assert
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("the consumer did not stop")
        .unwrap()
        .unwrap();
    delete_queue(&queue_name).await;
}

/// Blocks on every message until the test hands out a permit.
struct Gate;

#[async_trait]
impl Handler for Gate {
    type Context = Semaphore;
    type Error = Infallible;

    async fn handle(
        &self,
        incoming: &Incoming<Semaphore>,
    ) -> Result<BrokerAction, HandlerError<Infallible>> {
        incoming.context.acquire().await.unwrap().forget();
        Ok(BrokerAction::Ack)
    }
}

#[tokio::test]
#[ignore = "requires a RabbitMQ broker on localhost:5672"]
async fn no_more_than_prefetch_count_messages_are_in_flight() {
    // Arrange
    let prefetch_count = 5;
    let published = 12;
    let queue_name = Uuid::new_v4().to_string();
    let gate = Arc::new(Semaphore::new(0));
    let consumer = ConsumerBuilder::new(get_connection_factory(), gate.clone())
        .queue_name(&queue_name)
        .with_prefetch_count(prefetch_count)
        .exit_after(published)
        .build(Gate)
        .await
        .unwrap();
    let payloads = vec!["blocked"; published];
    publish(&queue_name, &payloads).await;

    // Act
    let handle = tokio::spawn(consumer.run_until_shutdown(std::future::pending()));

    // Assert: the broker holds back everything beyond the prefetch window.
    wait_for_ready_messages(&queue_name, (published - prefetch_count as usize) as u32).await;

    gate.add_permits(published);
    handle.await.unwrap().unwrap();
    wait_for_ready_messages(&queue_name, 0).await;
    delete_queue(&queue_name).await;
}
