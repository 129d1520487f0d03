use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
pub struct KeyVal {
    pub key: String,
    pub value: String,
}

impl std::str::FromStr for KeyVal {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (k, v) = s
            .split_once('=')
            .ok_or_else(|| anyhow!("expected KEY=VALUE, got: {s}"))?;
        Ok(Self {
            key: k.trim().to_string(),
            value: v.trim().to_string(),
        })
    }
}

#[derive(Parser, Debug, Clone)]
#[command(
    name = "taskdue",
    version,
    about = "Task lists with due dates and countdowns",
    disable_help_subcommand = true
)]
pub struct GlobalCli {
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[arg(short = 'q', long = "quiet", action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[arg(
        long = "rc",
        value_parser = clap::builder::ValueParser::new(|s: &str| s.parse::<KeyVal>()),
        action = ArgAction::Append,
        global = true
    )]
    pub rc_overrides: Vec<KeyVal>,

    #[arg(long = "config", global = true)]
    pub config: Option<PathBuf>,

    #[arg(long = "data", global = true)]
    pub data: Option<PathBuf>,

    /// Reference instant for countdowns (defaults to the current time).
    #[arg(long = "now", global = true)]
    pub now: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show the lists; the auto-selected one is marked.
    Lists,
    /// Create a list.
    NewList {
        #[arg(long)]
        title: String,
    },
    /// Show the tasks of a list with due dates and countdowns.
    Tasks(TasksArgs),
    /// Create a task.
    Add(AddArgs),
    /// Edit a stored task.
    Edit(EditArgs),
    /// Delete a stored task.
    Delete(TaskRef),
    /// Compose a due date and print both representations.
    Compose(DueArgs),
    /// Print the remaining time until a wire timestamp.
    Countdown {
        /// Timestamp such as 2024-03-05T09:15:00Z.
        due: String,
    },
}

impl Default for Command {
    fn default() -> Self {
        Command::Tasks(TasksArgs::default())
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct TasksArgs {
    #[arg(long)]
    pub list: Option<String>,

    /// todo or done; defaults to the configured view filter.
    #[arg(long)]
    pub filter: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct DueArgs {
    /// Calendar date, YYYY-MM-DD.
    #[arg(long)]
    pub date: Option<String>,

    #[arg(long)]
    pub hour: Option<String>,

    /// One of 0, 15, 30, 45.
    #[arg(long)]
    pub minute: Option<String>,

    #[arg(long)]
    pub date_only: bool,
}

#[derive(Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub detail: String,

    /// Target list; defaults to the first list.
    #[arg(long)]
    pub list: Option<String>,

    #[command(flatten)]
    pub due: DueArgs,
}

#[derive(Args, Debug, Clone)]
pub struct TaskRef {
    #[arg(long)]
    pub list: String,

    #[arg(long)]
    pub task: String,
}

#[derive(Args, Debug, Clone)]
pub struct EditArgs {
    #[command(flatten)]
    pub target: TaskRef,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub detail: Option<String>,

    #[arg(long, conflicts_with = "todo")]
    pub done: bool,

    #[arg(long)]
    pub todo: bool,

    #[arg(long, conflicts_with_all = ["date", "hour", "minute"])]
    pub clear_due: bool,

    #[command(flatten)]
    pub due: DueArgs,
}

pub fn init_tracing(verbose: u8, quiet: u8) -> anyhow::Result<()> {
    let default_level = if quiet >= 2 {
        "error"
    } else if quiet == 1 {
        "warn"
    } else if verbose >= 3 {
        "trace"
    } else if verbose == 2 {
        "debug"
    } else if verbose == 1 {
        "info"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let init_result = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .try_init();

    if let Err(err) = init_result {
        debug!(error = %err, "tracing subscriber already set, continuing");
    }

    Ok(())
}
