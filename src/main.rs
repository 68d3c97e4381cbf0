use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::Parser;
use log::error;

use graphserve::{build_engine, EngineKind, Result, Server, ServerConfig};

#[derive(Parser)]
#[command(name = "graphserve")]
#[command(about = "Concurrent graph-analysis server")]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1:8082")]
    listen: String,

    /// Worker threads for the leader-follower engine
    #[arg(long, default_value_t = num_cpus::get())]
    workers: usize,

    /// Execution strategy
    #[arg(long, value_enum, default_value_t = EngineKind::LeaderFollower)]
    engine: EngineKind,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = ServerConfig { listen: cli.listen, workers: cli.workers, engine: cli.engine };
    if let Err(e) = run(config) {
        error!("{}", e);
        eprintln!("graphserve: {}", e);
        std::process::exit(1);
    }
}

fn run(config: ServerConfig) -> Result<()> {
    let shutdown = Arc::new(AtomicBool::new(false));
    let engine = build_engine(config.engine, config.workers)?;
    let server = Server::bind(&config, engine, shutdown)?;
    server.run()
}
