//! Immutable, process-wide settings assembled once at start-up.
//!
//! [`Settings`] is usually built from the command line (see [`crate::cli::Cli::settings`]),
//! but every piece of it can also be deserialized or constructed by hand.
use anyhow::Context;
use redact::Secret;
use serde::Deserialize;

use crate::amqp::configuration::RabbitMqSettings;
use crate::consumers::ConsumerSettings;
use crate::storage::configuration::MySqlSettings;

#[derive(Debug, Deserialize, Clone)]
/// Everything the service needs to run.
pub struct Settings {
    /// How to reach the RabbitMq broker.
    pub rabbitmq: RabbitMqSettings,
    /// Queue name, prefetch and error policy of the consumer.
    pub consumer: ConsumerSettings,
    /// What to do with each message.
    pub mode: Mode,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "snake_case", tag = "kind")]
/// The processing applied to every incoming message.
pub enum Mode {
    /// Decode the body as a [`Request`](crate::requests::Request) and store it in MySQL.
    Persist(MySqlSettings),
    /// Log the raw body.
    Log,
}

/// Split a `host[:port]` endpoint, falling back to `default_port` when the port is omitted.
pub fn parse_endpoint(endpoint: &str, default_port: u16) -> Result<(String, u16), anyhow::Error> {
    let endpoint = endpoint.trim();
    if endpoint.is_empty() {
        anyhow::bail!("The endpoint is empty.");
    }
    match endpoint.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse::<u16>()
                .with_context(|| format!("Invalid port in endpoint `{endpoint}`."))?;
            if host.is_empty() {
                anyhow::bail!("The endpoint `{endpoint}` has no host.");
            }
            Ok((host.to_owned(), port))
        }
        None => Ok((endpoint.to_owned(), default_port)),
    }
}

/// Split a `user[:password]` credentials string.
///
/// Only the first `:` separates the two halves, the password may contain more of them.
pub fn parse_credentials(credentials: &str) -> (String, Secret<String>) {
    match credentials.split_once(':') {
        Some((username, password)) => (username.to_owned(), password.to_owned().into()),
        None => (credentials.to_owned(), String::new().into()),
    }
}
