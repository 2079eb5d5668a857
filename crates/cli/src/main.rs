//! DeskPilot CLI: the main entry point.
//!
//! Commands:
//! - `onboard`  - write a default config
//! - `run`      - drive the desktop until the model stops asking for tools
//! - `queue`    - work through queued messaging tasks
//! - `enqueue`, `send`, `inbox` - queue and mailbox records
//! - `talk`     - read the agent's output aloud
//! - `start`    - `talk` and `run` side by side
//! - `windows`  - hide or show application windows
//! - `db-setup` - create the queue tables

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "deskpilot",
    about = "DeskPilot: a computer-use agent that drives your desktop",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true, env = "DESKPILOT_JSON_LOGS")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Onboard,

    /// Give the agent a task and let it work
    Run {
        /// Instruction for the agent (falls back to agent.default_task)
        #[arg(short, long)]
        task: Option<String>,

        /// Do not write model text to the transcript files
        #[arg(long)]
        no_transcript: bool,
    },

    /// Process queued messaging tasks
    Queue {
        /// Keep polling instead of exiting after one pass
        #[arg(short, long)]
        watch: bool,
    },

    /// Add a messaging task to the queue
    Enqueue {
        #[arg(short, long)]
        recipient: String,

        #[arg(short, long)]
        message: String,
    },

    /// Send a mailbox message
    Send {
        #[arg(short, long)]
        sender: String,

        #[arg(short, long)]
        recipient: String,

        #[arg(short, long)]
        content: String,
    },

    /// Show unread mailbox messages
    Inbox {
        /// Defaults to queue.recipient
        #[arg(short, long)]
        recipient: Option<String>,

        /// Mark everything shown as read
        #[arg(long)]
        mark_read: bool,
    },

    /// Speak the agent's output as it is written
    Talk,

    /// Narration and the agent together
    Start {
        #[arg(short, long)]
        task: Option<String>,
    },

    /// Manage application windows (macOS)
    Windows {
        #[command(subcommand)]
        action: WindowsAction,
    },

    /// Create the queue and mailbox tables
    DbSetup,
}

#[derive(Subcommand, Clone, Copy)]
enum WindowsAction {
    /// Hide every app except windows.visible_apps
    Hide,
    /// Show every app
    Show,
    /// List foreground apps
    List,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Run {
            task,
            no_transcript,
        } => commands::run::run(task, !no_transcript).await?,
        Commands::Queue { watch } => commands::queue::run(watch).await?,
        Commands::Enqueue { recipient, message } => {
            commands::queue::enqueue(&recipient, &message).await?
        }
        Commands::Send {
            sender,
            recipient,
            content,
        } => commands::mailbox::send(&sender, &recipient, &content).await?,
        Commands::Inbox {
            recipient,
            mark_read,
        } => commands::mailbox::inbox(recipient, mark_read).await?,
        Commands::Talk => commands::talk::run().await?,
        Commands::Start { task } => commands::start::run(task).await?,
        Commands::Windows { action } => {
            let action = match action {
                WindowsAction::Hide => commands::windows::Action::Hide,
                WindowsAction::Show => commands::windows::Action::Show,
                WindowsAction::List => commands::windows::Action::List,
            };
            commands::windows::run(action).await?
        }
        Commands::DbSetup => commands::queue::db_setup().await?,
    }

    Ok(())
}
