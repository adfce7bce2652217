use anyhow::Result;
use cb_core::{config as env_config, db};
use std::net::SocketAddr;

use crate::signal::ContactSelection;

#[derive(Clone, Debug)]
pub struct ContactsConfig {
    pub addr: SocketAddr,
    pub database_url: String,
    /// Falls back to `database_url` when the indexer shares the application database.
    pub indexer_database_url: Option<String>,
    pub max_connections: u32,
    pub default_sources: Vec<String>,
}

impl ContactsConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            addr: env_config::socket_addr_from_env("CONTACTS_ADDR", "0.0.0.0:8090")?,
            database_url: env_config::required_env("DATABASE_URL")?,
            indexer_database_url: env_config::optional_env("INDEXER_DATABASE_URL"),
            max_connections: env_config::parse_env(
                "CONTACTS_DB_MAX_CONNECTIONS",
                db::DEFAULT_MAX_CONNECTIONS,
            )?,
            default_sources: env_config::list_from_env("CONTACTS_DEFAULT_SOURCES"),
        })
    }

    /// Selection used when a request does not name any source.
    pub fn default_selection(&self) -> ContactSelection {
        if self.default_sources.is_empty() {
            ContactSelection::all()
        } else {
            ContactSelection::from_names(&self.default_sources)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::ContactPoint;

    fn config(default_sources: &[&str]) -> ContactsConfig {
        ContactsConfig {
            addr: "127.0.0.1:8090".parse().unwrap(),
            database_url: "postgres://localhost/cb".into(),
            indexer_database_url: None,
            max_connections: 4,
            default_sources: default_sources.iter().map(|name| name.to_string()).collect(),
        }
    }

    #[test]
    fn default_selection_is_everything_when_unset() {
        assert_eq!(config(&[]).default_selection(), ContactSelection::all());
    }

    #[test]
    fn default_selection_honours_configured_names() {
        let selection = config(&["CrcTrust", "bogus"]).default_selection();
        assert!(selection.contains(ContactPoint::CrcTrust));
        assert_eq!(selection.iter().count(), 1);
    }
}
