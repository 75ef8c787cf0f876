use crate::helpers::{delete_queue, get_connection_factory, publish};
use request_consumer::amqp::configuration::RabbitMqSettings;
use request_consumer::amqp::ConnectionFactory;
use request_consumer::consumers::{connect, ConsumerError, DEFAULT_PREFETCH_COUNT};
use uuid::Uuid;

#[tokio::test]
#[ignore = "requires a RabbitMQ broker on localhost:5672"]
async fn declaring_the_same_durable_queue_twice_is_idempotent() {
    // Arrange
    let queue_name = Uuid::new_v4().to_string();
    let factory = get_connection_factory();
    let first = connect(&factory, &queue_name, DEFAULT_PREFETCH_COUNT)
        .await
        .unwrap();
    publish(&queue_name, &["still here"]).await;

    // Act
    let second = connect(&factory, &queue_name, DEFAULT_PREFETCH_COUNT)
        .await
        .unwrap();

    // Assert
    assert_eq!(first.queue_name(), second.queue_name());
    // Re-declaring neither recreated nor emptied the queue.
    assert_eq!(second.message_count(), 1);

    first.close().await;
    second.close().await;
    delete_queue(&queue_name).await;
}

#[tokio::test]
async fn unreachable_broker_is_a_connection_error() {
    let settings = RabbitMqSettings {
        port: 9,
        connection_timeout_seconds: Some(2),
        ..RabbitMqSettings::default()
    };
    let factory = ConnectionFactory::new_from_config(&settings).unwrap();

    let error = connect(&factory, "Request", DEFAULT_PREFETCH_COUNT)
        .await
        .err()
        .unwrap();

    assert!(matches!(error, ConsumerError::Connect(_)));
    assert!(error.is_startup());
}

#[tokio::test]
#[ignore = "requires a RabbitMQ broker on localhost:5672"]
async fn redeclaring_a_queue_with_different_properties_fails_at_declare() {
    use request_consumer::amqp::options::QueueDeclareOptions;
    use request_consumer::amqp::types::FieldTable;

    // Arrange: a transient queue with the same name already exists.
    let queue_name = Uuid::new_v4().to_string();
    let connection = get_connection_factory().new_connection().await.unwrap();
    let channel = connection.create_channel().await.unwrap();
    channel
        .queue_declare(
            &queue_name,
            QueueDeclareOptions::default(),
            FieldTable::default(),
        )
        .await
        .unwrap();

    // Act
    let error = connect(&get_connection_factory(), &queue_name, DEFAULT_PREFETCH_COUNT)
        .await
        .err()
        .unwrap();

    // Assert
    assert!(matches!(error, ConsumerError::DeclareQueue { .. }));
    channel
        .queue_delete(&queue_name, Default::default())
        .await
        .unwrap();
    connection.close(200, "cleaned up").await.unwrap();
}
