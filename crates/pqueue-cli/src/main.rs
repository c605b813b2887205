use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pqueue_cli::{run_demo, run_workload, WorkloadConfig};

#[derive(Parser)]
#[command(name = "pq", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default workload config
    Init {
        #[arg(long, default_value = "pq.toml")]
        path: PathBuf,
    },

    /// Run the reference ordering scenario and print the dequeue order
    Demo,

    /// Run producers and consumers against one shared queue
    Run {
        #[arg(long, default_value = "pq.toml")]
        config: PathBuf,
        /// Override the queue limit from the config (0 = unbounded)
        #[arg(long)]
        limit: Option<usize>,
        /// Offer every job twice through enqueue_unique
        #[arg(long)]
        unique: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    match cli.cmd {
        Command::Init { path } => {
            WorkloadConfig::default_config().save_to(&path)?;
            println!("Wrote {}", path.display());
        }
        Command::Demo => {
            for (id, priority) in run_demo()? {
                println!("{id} ({priority})");
            }
        }
        Command::Run { config, limit, unique } => {
            let mut cfg = WorkloadConfig::load_from(&config)?;
            if let Some(limit) = limit {
                cfg.queue.limit = limit;
            }
            cfg.unique |= unique;
            let summary = run_workload(&cfg)?;
            let out = serde_json::to_string_pretty(&summary).context("serialize summary")?;
            println!("{out}");
        }
    }

    Ok(())
}
