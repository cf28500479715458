//! Connection configuration.
//!
//! Only the recognized keys (`host`, `user`, `password`, `database`, `db_type`,
//! plus `port` and `debug`) are read; anything else is ignored. Unset keys keep
//! their defaults.

use crate::error::{DbError, DbResult};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// The backend family a facade talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    /// MySQL, legacy client API
    #[default]
    Mysql,
    /// MySQL, improved client API
    Mysqli,
    /// MS SQL Server, legacy client API
    Mssql,
    /// MS SQL Server, ODBC-style client API
    Sqlserv,
    /// PostgreSQL
    Pgsql,
}

impl DbType {
    /// The configuration tag for this backend.
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Mysql => "mysql",
            DbType::Mysqli => "mysqli",
            DbType::Mssql => "mssql",
            DbType::Sqlserv => "sqlserv",
            DbType::Pgsql => "pgsql",
        }
    }

    /// Port used when the configuration does not name one.
    pub fn default_port(&self) -> u16 {
        match self {
            DbType::Mysql | DbType::Mysqli => 3306,
            DbType::Mssql | DbType::Sqlserv => 1433,
            DbType::Pgsql => 5432,
        }
    }
}

impl fmt::Display for DbType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DbType {
    type Err = DbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mysql" => Ok(DbType::Mysql),
            "mysqli" => Ok(DbType::Mysqli),
            "mssql" => Ok(DbType::Mssql),
            "sqlserv" => Ok(DbType::Sqlserv),
            "pgsql" => Ok(DbType::Pgsql),
            other => Err(DbError::config(format!("unknown db_type '{other}'"))),
        }
    }
}

/// Connection settings for a facade.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Host of the connection.
    pub host: String,
    /// Database user.
    pub user: String,
    /// Database password.
    pub password: String,
    /// Default database name.
    pub database: String,
    /// Backend family.
    pub db_type: DbType,
    /// TCP port. `None` means the backend's default port.
    pub port: Option<u16>,
    /// Log every statement and its counts at INFO instead of DEBUG.
    pub debug: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            user: "root".to_string(),
            password: "pass".to_string(),
            database: "users".to_string(),
            db_type: DbType::Mysql,
            port: None,
            debug: false,
        }
    }
}

impl ConnectionConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `(key, value)` pairs over the defaults.
    ///
    /// Unrecognized keys are ignored. A malformed `db_type`, `port` or `debug`
    /// value is a [`DbError::Config`].
    pub fn from_pairs<I, K, V>(pairs: I) -> DbResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            let value = value.into();
            match key.as_ref() {
                "host" => config.host = value,
                "user" => config.user = value,
                "password" => config.password = value,
                "database" => config.database = value,
                "db_type" => config.db_type = value.parse()?,
                "port" => {
                    let port = value
                        .parse::<u16>()
                        .map_err(|e| DbError::config(format!("invalid port '{value}': {e}")))?;
                    config.port = Some(port);
                }
                "debug" => {
                    config.debug = match value.as_str() {
                        "1" | "true" => true,
                        "0" | "false" | "" => false,
                        other => {
                            return Err(DbError::config(format!("invalid debug flag '{other}'")));
                        }
                    };
                }
                _ => {}
            }
        }
        Ok(config)
    }

    /// Load a configuration from TOML text. Unknown keys are ignored.
    pub fn from_toml_str(text: &str) -> DbResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Set the host.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the user.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self
    }

    /// Set the password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the default database.
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the backend family.
    pub fn db_type(mut self, db_type: DbType) -> Self {
        self.db_type = db_type;
        self
    }

    /// Set the TCP port.
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Enable or disable debug logging.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The effective TCP port.
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.db_type.default_port())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ConnectionConfig::new();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.user, "root");
        assert_eq!(config.database, "users");
        assert_eq!(config.db_type, DbType::Mysql);
        assert_eq!(config.effective_port(), 3306);
    }

    #[test]
    fn test_from_pairs_overrides_and_ignores_unknown() {
        let config = ConnectionConfig::from_pairs([
            ("database", "shop"),
            ("db_type", "pgsql"),
            ("charset", "utf8"),
        ])
        .unwrap();

        assert_eq!(config.database, "shop");
        assert_eq!(config.db_type, DbType::Pgsql);
        assert_eq!(config.host, "localhost");
        assert_eq!(config.effective_port(), 5432);
    }

    #[test]
    fn test_from_pairs_rejects_unknown_db_type() {
        let err = ConnectionConfig::from_pairs([("db_type", "oracle")]).unwrap_err();
        assert!(matches!(err, DbError::Config(_)));
    }

    #[test]
    fn test_from_toml_ignores_unknown_keys() {
        let config = ConnectionConfig::from_toml_str(
            r#"
            host = "db.internal"
            db_type = "sqlserv"
            port = 14330
            pool_size = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.host, "db.internal");
        assert_eq!(config.db_type, DbType::Sqlserv);
        assert_eq!(config.effective_port(), 14330);
        assert_eq!(config.password, "pass");
    }

    #[test]
    fn test_db_type_round_trips_tag() {
        for tag in ["mysql", "mysqli", "mssql", "sqlserv", "pgsql"] {
            assert_eq!(tag.parse::<DbType>().unwrap().as_str(), tag);
        }
    }
}
