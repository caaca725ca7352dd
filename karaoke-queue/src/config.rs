//! Service configuration
//!
//! Command-line arguments (with environment fallbacks) layered over the
//! bootstrap TOML file from `karaoke_common::config`.

use crate::error::Result;
use clap::Parser;
use karaoke_common::config::{self, TomlConfig};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Command-line arguments for karaoke-queue
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "karaoke-queue")]
#[command(about = "Live song request queue for karaoke events")]
#[command(version)]
pub struct Args {
    /// Path to TOML config file
    #[arg(short, long, env = "KARAOKE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Path to the SQLite database
    #[arg(short, long, env = "KARAOKE_DATABASE")]
    pub database: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long, env = "KARAOKE_PORT")]
    pub port: Option<u16>,

    /// Interface to bind
    #[arg(long, env = "KARAOKE_BIND")]
    pub bind: Option<String>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub database_path: PathBuf,
    pub bind_address: String,
    pub port: u16,
    pub log_level: String,
    pub outbox_capacity: usize,
    pub keepalive: Duration,
}

impl ServiceConfig {
    /// Load the TOML layer and merge the arguments over it
    pub fn resolve(args: &Args) -> Result<Self> {
        let toml = config::load_or_default(args.config.as_deref())?;
        Ok(Self::from_parts(args, &toml))
    }

    pub fn from_parts(args: &Args, toml: &TomlConfig) -> Self {
        Self {
            database_path: config::resolve_database_path(args.database.as_deref(), toml),
            bind_address: args
                .bind
                .clone()
                .unwrap_or_else(|| toml.bind_address.clone()),
            port: args.port.unwrap_or(toml.port),
            log_level: toml.logging.level.clone(),
            outbox_capacity: toml.hub.outbox_capacity,
            keepalive: Duration::from_secs(toml.hub.keepalive_secs),
        }
    }

    /// Address to bind; unparseable interfaces fall back to loopback
    pub fn socket_addr(&self) -> SocketAddr {
        let ip = self
            .bind_address
            .parse::<IpAddr>()
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST));
        SocketAddr::new(ip, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arguments_override_toml() {
        let toml: TomlConfig = toml::from_str(
            r#"
            database_path = "/srv/karaoke/from-toml.db"
            port = 6000

            [hub]
            keepalive_secs = 30
            "#,
        )
        .unwrap();

        let args = Args {
            database: Some(PathBuf::from("/tmp/cli.db")),
            port: Some(7000),
            ..Args::default()
        };

        let config = ServiceConfig::from_parts(&args, &toml);
        assert_eq!(config.database_path, PathBuf::from("/tmp/cli.db"));
        assert_eq!(config.port, 7000);
        assert_eq!(config.keepalive, Duration::from_secs(30));
        assert_eq!(config.outbox_capacity, 64);
    }

    #[test]
    fn test_socket_addr() {
        let mut config = ServiceConfig::from_parts(&Args::default(), &TomlConfig::default());
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:5780");

        config.bind_address = "0.0.0.0".to_string();
        config.port = 8080;
        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:8080");

        config.bind_address = "not an ip".to_string();
        assert_eq!(config.socket_addr().ip().to_string(), "127.0.0.1");
    }
}
