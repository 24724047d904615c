//! solokv server entry point.
//!
//! Wires the pieces together: command queue, executor, expiry sweeper,
//! accept loop. Ctrl+C flips the shared shutdown token; the executor and
//! sweeper observe it and stop.

use clap::Parser;
use solokv::connection::{handle_connection, ConnectionStats};
use solokv::executor::{command_queue, CommandSender, Executor, QUEUE_CAPACITY};
use solokv::pool::BufferPool;
use solokv::storage::{run_sweeper, ExpireIndex, Keyspace, SweeperConfig};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// A minimal in-memory key-value server with a single-writer executor.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Host to bind to
    #[arg(long, default_value = solokv::DEFAULT_HOST)]
    host: String,

    /// Port to listen on
    #[arg(long, short, default_value_t = solokv::DEFAULT_PORT)]
    port: u16,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.debug { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .init();

    info!("solokv v{}", solokv::VERSION);

    // Shared shutdown token for the executor and the sweeper.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let expire = Arc::new(ExpireIndex::new());
    let keyspace = Keyspace::new(Arc::clone(&expire));
    let (sender, receiver) = command_queue(QUEUE_CAPACITY);

    tokio::spawn(Executor::new(keyspace, receiver, shutdown_rx.clone()).run());
    tokio::spawn(run_sweeper(
        expire,
        sender.clone(),
        SweeperConfig::default(),
        shutdown_rx,
    ));

    let stats = Arc::new(ConnectionStats::new());
    let pool = Arc::new(BufferPool::new());

    let bind_addr = format!("{}:{}", args.host, args.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    info!("listening on {}", bind_addr);

    tokio::select! {
        _ = accept_loop(listener, sender, stats, pool) => {}
        _ = signal::ctrl_c() => {
            info!("shutdown signal received, stopping server");
        }
    }

    let _ = shutdown_tx.send(true);
    info!("server shutdown complete");
    Ok(())
}

/// Accepts connections forever, spawning one handler task per client.
async fn accept_loop(
    listener: TcpListener,
    sender: CommandSender,
    stats: Arc<ConnectionStats>,
    pool: Arc<BufferPool>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                tokio::spawn(handle_connection(
                    stream,
                    addr,
                    sender.clone(),
                    Arc::clone(&stats),
                    Arc::clone(&pool),
                ));
            }
            Err(e) => {
                error!("failed to accept connection: {}", e);
            }
        }
    }
}
