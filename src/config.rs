use std::{env, net::SocketAddr};

use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let bind_port = env::var("BIND_PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let config = Self {
            bind_addr,
            bind_port,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Environment mutations share one test to keep them serialized.
    #[test]
    fn from_env_parses_defaults_and_rejects_bad_ports() {
        env::remove_var("BIND_ADDR");
        env::remove_var("BIND_PORT");

        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.bind_addr, "127.0.0.1");
        assert_eq!(config.bind_port, 8080);

        env::set_var("BIND_PORT", "not-a-port");
        let err = Config::from_env().expect_err("expected invalid port error");
        assert!(matches!(err, ConfigError::InvalidPort));

        env::set_var("BIND_PORT", "9200");
        let config = Config::from_env().expect("config should parse");
        assert_eq!(config.bind_port, 9200);
        env::remove_var("BIND_PORT");
    }

    #[test]
    fn bind_socket_combines_addr_and_port() {
        let config = Config {
            bind_addr: "0.0.0.0".to_string(),
            bind_port: 9100,
        };

        let socket = config.bind_socket().expect("valid socket");
        assert_eq!(socket.port(), 9100);
    }
}
