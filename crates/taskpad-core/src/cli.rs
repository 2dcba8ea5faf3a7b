use std::ffi::OsString;
use std::io::IsTerminal;
use std::path::PathBuf;

use anyhow::anyhow;
use clap::{ArgAction, Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::schema::RawTaskInput;

#[derive(Debug, Clone)]
pub struct PreprocessedArgs {
    pub cleaned_args: Vec<OsString>,
    pub rc_overrides: Vec<(String, String)>,
}

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
    name = "taskpad",
    version,
    about = "Taskpad: validated to-do list with search and confirmed deletes",
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

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a task from form-style field values
    Add(AddArgs),
    /// Show pending (or completed) tasks
    List(ViewArgs),
    /// Flip a task between pending and completed
    #[command(visible_alias = "done")]
    Toggle { id: String },
    /// Delete a task after confirmation
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short = 'y', long = "yes")]
        yes: bool,
    },
    /// Show every field of one task
    Info { id: String },
    /// Print tasks as a JSON array
    Export {
        #[command(flatten)]
        view: ViewArgs,
        /// Ignore the search term and completion toggle
        #[arg(long = "all")]
        all: bool,
    },
    /// Print the version
    Version,
}

/// Values are kept as text; the schema does the checking.
#[derive(Args, Debug, Clone, Default)]
pub struct AddArgs {
    #[arg(long = "name", default_value = "")]
    pub name: String,

    #[arg(long = "priority", default_value = "")]
    pub priority: String,

    #[arg(long = "points", default_value = "", allow_hyphen_values = true)]
    pub points: String,

    #[arg(long = "assignee", default_value = "")]
    pub assignee: String,

    #[arg(long = "due", default_value = "")]
    pub due: String,
}

impl AddArgs {
    pub fn to_raw_input(&self) -> RawTaskInput {
        RawTaskInput {
            task_name: self.name.clone(),
            priority: self.priority.clone(),
            story_points: self.points.clone(),
            assignee: self.assignee.clone(),
            due_date: self.due.clone(),
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// Case-insensitive match on name or assignee
    #[arg(short = 's', long = "search", default_value = "")]
    pub search: String,

    /// Show completed tasks instead of pending ones
    #[arg(short = 'c', long = "completed", conflicts_with = "pending")]
    pub completed: bool,

    /// Show pending tasks even when `list.completed` is on
    #[arg(short = 'p', long = "pending")]
    pub pending: bool,
}

impl ViewArgs {
    /// `None` when neither flag was given, leaving the choice to config.
    pub fn completion(&self) -> Option<bool> {
        if self.completed {
            Some(true)
        } else if self.pending {
            Some(false)
        } else {
            None
        }
    }
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

/// Pulls positional `rc.key=value` / `rc.key:value` tokens out of the
/// argument list so they can be applied as config overrides.
#[tracing::instrument(skip_all)]
pub fn preprocess_args(raw: &[OsString]) -> anyhow::Result<PreprocessedArgs> {
    let mut cleaned = Vec::with_capacity(raw.len());
    let mut overrides: Vec<(String, String)> = Vec::new();

    let mut iter = raw.iter().cloned();
    if let Some(bin) = iter.next() {
        cleaned.push(bin);
    }

    for arg in iter {
        let s = arg.to_string_lossy();
        if let Some(rest) = s.strip_prefix("rc.") {
            let parsed = if let Some((k, v)) = rest.split_once('=') {
                Some((format!("rc.{k}"), v.to_string()))
            } else if let Some((k, v)) = rest.split_once(':') {
                Some((format!("rc.{k}"), v.to_string()))
            } else {
                None
            };

            if let Some((k, v)) = parsed {
                debug!(key = %k, value = %v, "captured positional rc override");
                overrides.push((k, v));
                continue;
            }
        }

        cleaned.push(arg);
    }

    Ok(PreprocessedArgs {
        cleaned_args: cleaned,
        rc_overrides: overrides,
    })
}
