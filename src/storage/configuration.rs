//! Configuration types holding the parameters required to connect to MySQL.
use anyhow::Context;
use redact::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::mysql::MySqlConnectOptions;

use crate::configuration::{parse_credentials, parse_endpoint};

pub const DEFAULT_MYSQL_PORT: u16 = 3306;
/// The database requests are stored in unless told otherwise. It is created if absent.
pub const DEFAULT_DATABASE_NAME: &str = "TerraformEdu";

#[derive(Debug, Deserialize, Clone)]
/// Configuration to establish a connection with a MySQL instance.
pub struct MySqlSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub username: String,
    pub password: Secret<String>,
    /// The database holding the `requests` table.
    #[serde(default = "default_database_name")]
    pub database_name: String,
}

fn default_database_name() -> String {
    DEFAULT_DATABASE_NAME.to_owned()
}

impl MySqlSettings {
    /// Build settings from a `host[:port]` endpoint and a `user[:password]` credentials string.
    pub fn from_endpoint(
        endpoint: &str,
        credentials: &str,
        database_name: &str,
    ) -> Result<Self, anyhow::Error> {
        let (host, port) =
            parse_endpoint(endpoint, DEFAULT_MYSQL_PORT).context("Invalid MySQL endpoint.")?;
        let (username, password) = parse_credentials(credentials);
        Ok(Self {
            host,
            port,
            username,
            password,
            database_name: database_name.to_owned(),
        })
    }

    /// Options to connect to the instance, without selecting a database.
    pub fn instance_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.username)
            .password(self.password.expose_secret())
            .charset("utf8mb4")
    }

    /// Options to connect to [`MySqlSettings::database_name`].
    pub fn database_options(&self) -> MySqlConnectOptions {
        self.instance_options().database(&self.database_name)
    }
}
