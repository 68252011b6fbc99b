//! Command-line configuration and the top-level run loop.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use shardkv_core::{Router, RouterConfig};
use tracing::info;

use crate::commands::replay;

/// Replay key-value commands against a consistent-hashing router.
#[derive(Parser, Debug, Clone)]
#[command(name = "shardkv", version)]
pub struct CliConfig {
    /// JSON file with router settings, e.g. `{"max_nodes": 64}`.
    #[arg(long, env = "SHARDKV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Node limit; overrides the config file.
    #[arg(long, env = "SHARDKV_MAX_NODES")]
    pub max_nodes: Option<usize>,

    /// Command script. Reads stdin when omitted.
    pub script: Option<PathBuf>,
}

impl CliConfig {
    /// Router settings from the config file and flags.
    pub fn router_config(&self) -> anyhow::Result<RouterConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let raw = fs::read_to_string(path)
                    .with_context(|| format!("reading config {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("parsing config {}", path.display()))?
            }
            None => RouterConfig::default(),
        };
        if let Some(max_nodes) = self.max_nodes {
            config.max_nodes = max_nodes;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn run(&self) -> anyhow::Result<()> {
        let mut router: Router = Router::new(self.router_config()?)?;
        info!(max_nodes = router.config().max_nodes, "router ready");

        let input: Box<dyn BufRead> = match &self.script {
            Some(path) => Box::new(BufReader::new(
                File::open(path).with_context(|| format!("opening script {}", path.display()))?,
            )),
            None => Box::new(io::stdin().lock()),
        };

        let stdout = io::stdout();
        let mut out = stdout.lock();
        let executed = replay(&mut router, input, &mut out)?;

        info!(
            executed,
            nodes = router.node_count(),
            keys = router.key_count(),
            "script finished"
        );
        router.teardown();
        Ok(())
    }
}
