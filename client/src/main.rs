use std::{sync::Arc, time::Duration};

use anchor_lang::prelude::Pubkey;
use clap::Parser;
use election_client::{
    config, App, Command, Descriptor, InMemoryLedger, Ledger, RpcLedger, TextRenderer,
};
use tokio::{signal::ctrl_c, sync::mpsc};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

/// Shows the election ballot for one account and keeps it in sync with the
/// ledger. With a cluster configured it reads the deployed program; otherwise
/// it runs an in-process ledger and casts the given ballots against it.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the election descriptor (JSON).
    #[arg(long)]
    descriptor: Option<String>,

    /// RPC endpoint of the cluster; overrides the descriptor's `cluster`.
    #[arg(long)]
    cluster: Option<String>,

    /// Account to connect as.
    #[arg(long)]
    account: Option<Pubkey>,

    /// Candidate ids to vote for, in order.
    #[arg(long = "vote")]
    votes: Vec<u32>,

    /// How often to poll the cluster for new ballots, in milliseconds.
    #[arg(long, default_value_t = 2000)]
    poll_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();
    let path = config::descriptor_path(args.descriptor.clone());

    info!("Loading descriptor from {path}");
    let descriptor = Descriptor::load(&path)?;
    let program_id = descriptor.program_id()?;
    let election = descriptor.election_address()?;
    info!(%program_id, %election, "Descriptor loaded");

    match args.cluster.clone().or(descriptor.cluster.clone()) {
        Some(cluster) => {
            info!(%cluster, "Reading election from cluster");
            let ledger = Arc::new(RpcLedger::new(cluster, program_id, descriptor.authority()?));
            let watcher = ledger.clone().watch(Duration::from_millis(args.poll_ms));

            drive(ledger, &args, async {
                let _ = ctrl_c().await;
            })
            .await?;
            watcher.abort();
        }
        None => {
            info!("No cluster configured, using in-process ledger");
            let ledger = Arc::new(InMemoryLedger::deploy(
                descriptor.authority()?,
                descriptor.candidate_names(),
            )?);

            drive(ledger, &args, async {}).await?;
        }
    }

    Ok(())
}

/// Runs the app against `ledger`, feeds it the command-line actions, and
/// keeps it running until `until` completes.
async fn drive<L: Ledger + 'static>(
    ledger: L,
    args: &Args,
    until: impl std::future::Future<Output = ()>,
) -> anyhow::Result<()> {
    let app = App::new(ledger, TextRenderer::new(std::io::stdout()));

    let (commands, receiver) = mpsc::channel(16);
    let handle = tokio::spawn(app.run(receiver));

    if let Some(account) = args.account {
        commands.send(Command::Connect(account)).await?;
    }
    for candidate_id in &args.votes {
        commands.send(Command::Vote(*candidate_id)).await?;
    }

    until.await;
    drop(commands);

    handle.await?;
    Ok(())
}
