//! `request-consumer` pulls `Request` messages from a durable RabbitMq queue, built on top of
//! [`lapin`], and either stores them in MySQL or logs them.
//!
//! [`ConsumerBuilder`](crate::consumers::ConsumerBuilder) is the best starting point to learn
//! how messages are pulled, processed and acknowledged.
//! [`requests`] holds the two message handlers shipped with the binary.

pub mod amqp;
pub mod cli;
pub mod configuration;
pub mod consumers;
pub mod requests;
pub mod shutdown;
pub mod storage;
pub mod telemetry;
