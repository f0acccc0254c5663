//! Server configuration
//!
//! Configuration is supplied explicitly at construction time; the service
//! reads no environment variables, config files, or CLI arguments.

/// Default listening port
pub const DEFAULT_PORT: u16 = 8080;

/// Default request body limit (1 MiB)
pub const DEFAULT_MAX_BODY_SIZE: usize = 1024 * 1024;

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Hostname or address to bind to
    pub hostname: String,
    /// Number of runtime worker threads
    pub workers: usize,
    /// Maximum accepted request body size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            hostname: "0.0.0.0".to_string(),
            workers: num_cpus::get(),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.hostname, "0.0.0.0");
        assert!(config.workers >= 1);
        assert_eq!(config.max_body_size, 1024 * 1024);
    }
}
