use request_consumer::amqp::configuration::RabbitMqSettings;
use request_consumer::amqp::options::{
    BasicPublishOptions, ConfirmSelectOptions, QueueDeclareOptions, QueueDeleteOptions,
};
use request_consumer::amqp::types::FieldTable;
use request_consumer::amqp::{BasicProperties, ConnectionFactory};
use request_consumer::storage::configuration::MySqlSettings;
use std::time::Duration;
use uuid::Uuid;

pub fn get_rabbitmq_settings() -> RabbitMqSettings {
    RabbitMqSettings::default()
}

pub fn get_connection_factory() -> ConnectionFactory {
    ConnectionFactory::new_from_config(&get_rabbitmq_settings()).unwrap()
}

/// Publish each payload to `queue_name` through the default exchange, waiting for confirms.
pub async fn publish(queue_name: &str, payloads: &[&str]) {
    let connection = get_connection_factory().new_connection().await.unwrap();
    let channel = connection.create_channel().await.unwrap();
    channel
        .confirm_select(ConfirmSelectOptions::default())
        .await
        .unwrap();
    for payload in payloads {
        channel
            .basic_publish(
                "",
                queue_name,
                BasicPublishOptions::default(),
                payload.as_bytes(),
                BasicProperties::default(),
            )
            .await
            .unwrap()
            .await
            .unwrap();
    }
    connection.close(200, "published").await.unwrap();
}

/// Number of messages ready for delivery in `queue_name`.
pub async fn ready_messages(queue_name: &str) -> u32 {
    let connection = get_connection_factory().new_connection().await.unwrap();
    let channel = connection.create_channel().await.unwrap();
    let queue = channel
        .queue_declare(
            queue_name,
            QueueDeclareOptions {
                passive: true,
                ..QueueDeclareOptions::default()
            },
            FieldTable::default(),
        )
        .await
        .unwrap();
    connection.close(200, "inspected").await.unwrap();
    queue.message_count()
}

/// Poll `queue_name` until it holds `expected` ready messages, panicking after a few seconds.
pub async fn wait_for_ready_messages(queue_name: &str, expected: u32) {
    let mut last = 0;
    for _ in 0..50 {
        last = ready_messages(queue_name).await;
        if last == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("expected {expected} ready messages in `{queue_name}`, found {last}");
}

pub async fn delete_queue(queue_name: &str) {
    let connection = get_connection_factory().new_connection().await.unwrap();
    let channel = connection.create_channel().await.unwrap();
    channel
        .queue_delete(queue_name, QueueDeleteOptions::default())
        .await
        .unwrap();
    connection.close(200, "cleaned up").await.unwrap();
}

/// Settings pointing to a fresh database on the local MySQL instance.
pub fn get_mysql_settings() -> MySqlSettings {
    let database_name = format!("requests_{}", Uuid::new_v4().simple());
    MySqlSettings::from_endpoint("localhost:3306", "root:root", &database_name).unwrap()
}
