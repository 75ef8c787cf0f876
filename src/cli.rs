//! Command line interface.
use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use crate::amqp::configuration::{RabbitMqSettings, RabbitMqTlsSettings};
use crate::configuration::{Mode, Settings};
use crate::consumers::{
    ConsumerSettings, FatalErrorPolicy, DEFAULT_PREFETCH_COUNT, DEFAULT_QUEUE_NAME,
};
use crate::storage::configuration::{MySqlSettings, DEFAULT_DATABASE_NAME};

#[derive(Parser, Debug)]
#[command(name = "request-consumer")]
#[command(about = "Consume requests from RabbitMQ, then store or log them")]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub messaging: MessagingArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Decode each message as a request and insert it in MySQL
    Persist(StorageArgs),
    /// Log the body of each message
    Log,
}

#[derive(Args, Debug)]
pub struct MessagingArgs {
    /// RabbitMQ messaging endpoint, `hostname[:port]`
    #[arg(long, env = "MSG_ENDPOINT", global = true)]
    pub msg_endpoint: Option<String>,

    /// RabbitMQ messaging credentials, `username[:password]`
    #[arg(long, env = "MSG_CREDENTIALS", global = true, hide_env_values = true)]
    pub msg_credentials: Option<String>,

    /// RabbitMQ virtual host
    #[arg(long, env = "MSG_VHOST", default_value = "/", global = true)]
    pub msg_vhost: String,

    /// Give up connecting to RabbitMQ after this many seconds
    #[arg(long, env = "MSG_CONNECTION_TIMEOUT_SECONDS", default_value_t = 10, global = true)]
    pub msg_connection_timeout_seconds: u64,

    /// PEM file with the CA chain used to verify RabbitMQ's certificate. Enables TLS
    #[arg(long, env = "MSG_TLS_CA_FILE", global = true)]
    pub msg_tls_ca_file: Option<std::path::PathBuf>,

    /// Expected domain of RabbitMQ's certificate (defaults to the endpoint host). Enables TLS
    #[arg(long, env = "MSG_TLS_DOMAIN", global = true)]
    pub msg_tls_domain: Option<String>,

    /// Queue to consume from
    #[arg(long, env = "MSG_QUEUE", default_value = DEFAULT_QUEUE_NAME, global = true)]
    pub queue: String,

    /// Maximum number of unacknowledged messages held by the consumer
    #[arg(long, env = "MSG_PREFETCH_COUNT", default_value_t = DEFAULT_PREFETCH_COUNT, global = true)]
    pub prefetch_count: u16,

    /// What to do with a message that can never be processed
    #[arg(long, env = "MSG_ON_FATAL_ERROR", value_enum, default_value_t = FatalErrorPolicy::Halt, global = true)]
    pub on_fatal_error: FatalErrorPolicy,

    /// Exit after processing this many messages
    #[arg(long, env = "MSG_EXIT_AFTER", global = true)]
    pub exit_after: Option<usize>,
}

#[derive(Args, Debug)]
pub struct StorageArgs {
    /// MySQL endpoint, `hostname[:port]`
    #[arg(long, env = "DBS_ENDPOINT")]
    pub dbs_endpoint: String,

    /// MySQL credentials, `username[:password]`
    #[arg(long, env = "DBS_CREDENTIALS", hide_env_values = true)]
    pub dbs_credentials: String,

    /// Database holding the `requests` table, created if absent
    #[arg(long, env = "DBS_NAME", default_value = DEFAULT_DATABASE_NAME)]
    pub dbs_name: String,
}

impl Cli {
    /// Assemble the immutable [`Settings`] the service runs with.
    ///
    /// Reads the TLS CA file, if one was given.
    pub fn settings(&self) -> Result<Settings, anyhow::Error> {
        let args = &self.messaging;
        let endpoint = args
            .msg_endpoint
            .as_deref()
            .context("`--msg-endpoint` is required")?;
        let credentials = args
            .msg_credentials
            .as_deref()
            .context("`--msg-credentials` is required")?;

        let mut rabbitmq = RabbitMqSettings::from_endpoint(endpoint, credentials)?;
        rabbitmq.vhost = args.msg_vhost.clone();
        rabbitmq.connection_timeout_seconds = Some(args.msg_connection_timeout_seconds);
        if args.msg_tls_ca_file.is_some() || args.msg_tls_domain.is_some() {
            let ca_certificate_chain_pem = args
                .msg_tls_ca_file
                .as_ref()
                .map(|path| {
                    std::fs::read_to_string(path).with_context(|| {
                        format!("Failed to read the CA certificate chain at {}", path.display())
                    })
                })
                .transpose()?;
            rabbitmq.tls = Some(RabbitMqTlsSettings {
                domain: args.msg_tls_domain.clone(),
                ca_certificate_chain_pem,
            });
        }

        let consumer = ConsumerSettings {
            queue_name: args.queue.clone(),
            prefetch_count: args.prefetch_count,
            on_fatal_error: args.on_fatal_error,
            exit_after: args.exit_after,
        };

        let mode = match &self.command {
            Command::Persist(storage) => Mode::Persist(MySqlSettings::from_endpoint(
                &storage.dbs_endpoint,
                &storage.dbs_credentials,
                &storage.dbs_name,
            )?),
            Command::Log => Mode::Log,
        };

        Ok(Settings {
            rabbitmq,
            consumer,
            mode,
        })
    }
}
