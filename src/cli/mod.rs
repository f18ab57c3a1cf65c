// CLI module for firecache
// Author: kelexine (https://github.com/kelexine)

use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// firecache - offline-resilience proxy for the fire monitoring dashboard
#[derive(Parser, Debug)]
#[command(name = "firecache", version, about, long_about = None)]
pub struct Args {
    /// Config file (default: ~/.firecache/config.toml)
    #[arg(short, long, env = "FIRECACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind the interception server to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the interception server to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Base URL of the dashboard server
    #[arg(short, long)]
    pub upstream: Option<String>,
}

impl Args {
    /// Apply command line overrides, the highest-precedence config layer.
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(upstream) = &self.upstream {
            config.upstream.base_url = upstream.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides_win() {
        let args = Args::parse_from(["firecache", "--port", "9000", "--upstream", "http://fires.internal:5000"]);
        let mut config = AppConfig::default();
        args.apply(&mut config);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.upstream.base_url, "http://fires.internal:5000");
    }
}
