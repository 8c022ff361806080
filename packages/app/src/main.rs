use std::path::PathBuf;
use std::sync::Arc;

use actors::{AssignmentClient, AssignmentQueueArgs};
use boxtag_core::{QueueConfig, RenameFailurePolicy};
use clap::Parser;
use db::DbConfig;
use storage::{PhotoStore, StorageConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use crate::commands::{Command, HELP};
use crate::session::{Flow, Session};

mod commands;
mod session;
mod shutdown;

#[derive(Parser, Debug)]
#[command(name = "boxtag")]
#[command(version)]
#[command(about = "Assign core box photos to drill-hole intervals")]
struct Args {
    /// Database endpoint: mem://, rocksdb://<path> or a bare directory
    #[arg(long, env = "BOXTAG_DB", default_value = "mem://")]
    db: String,

    /// Directory holding the box photos
    #[arg(long, env = "PHOTO_DIR", default_value = ".")]
    photos: PathBuf,

    /// Ticks a box waits before it is committed
    #[arg(long, default_value_t = 5)]
    grace_ticks: u32,

    /// Tick period in milliseconds
    #[arg(long, default_value_t = 1000)]
    tick_millis: u64,

    /// Accept a box whose interval is already waiting in the queue
    #[arg(long)]
    allow_in_flight_duplicates: bool,

    /// Delete the saved record again when its photo cannot be renamed
    #[arg(long)]
    rollback_on_rename_failure: bool,

    /// File name marker of photos still waiting for an assignment
    #[arg(long, default_value = "IMG_")]
    placeholder_marker: String,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,
}

impl Args {
    fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            grace_ticks: self.grace_ticks,
            tick_millis: self.tick_millis,
            reject_in_flight_duplicates: !self.allow_in_flight_duplicates,
            rename_failure: if self.rollback_on_rename_failure {
                RenameFailurePolicy::RollBack
            } else {
                RenameFailurePolicy::KeepRecord
            },
            placeholder_marker: self.placeholder_marker.clone(),
        }
    }

    fn db_config(&self) -> DbConfig {
        DbConfig::from_endpoint(self.db.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let shutdown = shutdown::install_shutdown_handler();

    let repo = Arc::new(db::open(&args.db_config()).await?);
    let photos = Arc::new(PhotoStore::new(StorageConfig::filesystem(&args.photos))?);

    let queue_args = AssignmentQueueArgs::new(args.queue_config(), repo.clone(), photos.clone())
        .with_shutdown(shutdown.child_token());
    let (client, handle) = AssignmentClient::start(queue_args).await?;
    let mut events = client.subscribe();

    let mut session = Session::new(client, repo, photos).with_json(args.json);
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,

            event = events.recv() => match event {
                Ok(event) => println!("{}", session.render_event(&event)),
                Err(RecvError::Lagged(n)) => tracing::warn!("Dropped {} events", n),
                Err(RecvError::Closed) => break,
            },

            line = lines.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Ok(Some(command)) => {
                        let (flow, output) = session.execute(command).await;
                        for out in output {
                            println!("{}", out);
                        }
                        if flow == Flow::Quit {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => println!("{}", e),
                }
            }
        }
    }

    session.client().shutdown();
    shutdown.cancel();
    handle.await?;

    Ok(())
}
