//! Server configuration.

use clap::Parser;

/// Command line options for the relay server
#[derive(Debug, Clone, Parser)]
#[command(name = "roomcast-server", version, about = "Room-based chat relay over WebSocket")]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, default_value_t = 3000)]
    pub port: u16,

    /// Message store, e.g. `sqlite://chat.db`. History is kept in memory when omitted.
    #[arg(long)]
    pub database_url: Option<String>,

    /// Default log level when RUST_LOG is not set
    #[arg(long, default_value = "debug")]
    pub log_level: String,
}

impl ServerConfig {
    /// `host:port` to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            database_url: None,
            log_level: "debug".to_string(),
        }
    }
}
