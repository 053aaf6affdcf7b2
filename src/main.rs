use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use rocket::{catchers, routes, Build, Rocket};
use tracing::debug;

mod config;
use config::BridgeConfig;

mod jenkins;

mod webhooks;
use webhooks::{fallback, github_comment, ping};

#[derive(Parser)]
#[clap(version = "0.1")]
struct Opts {
    /// Configuration file for the bridge
    #[clap(short, long, parse(from_os_str))]
    config: PathBuf,
}

fn rocket(config: BridgeConfig) -> Rocket<Build> {
    rocket::build()
        .mount("/", routes![github_comment, ping])
        .register("/", catchers![fallback])
        .manage(config)
}

#[rocket::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opts = Opts::parse();
    let config_file = File::open(&opts.config)
        .with_context(|| format!("couldn't open {}:", opts.config.display()))?;
    let config: BridgeConfig = serde_yaml::from_reader(BufReader::new(config_file))
        .context("couldn't parse config file")?;

    if !config.github_whitelist.is_empty() {
        // accepted for forward compatibility, not checked in the trigger path
        debug!("whitelisted commenters: {:?}", config.github_whitelist);
    }

    rocket(config).launch().await.map_err(|err| anyhow::anyhow!(err))?;
    Ok(())
}
