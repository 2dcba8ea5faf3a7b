use std::io::{self, BufRead, Write};

use anyhow::{Context, anyhow};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::cli::{AddArgs, Command, ViewArgs};
use crate::config::Config;
use crate::confirm::DeleteFlow;
use crate::datastore::BlobStore;
use crate::filter::ViewFilter;
use crate::render::Renderer;
use crate::schema::validate_today;
use crate::store::{TaskStore, encode};
use crate::task::{Task, short_id};

#[instrument(skip(store, cfg, renderer, command))]
pub fn dispatch<B: BlobStore>(
    store: &mut TaskStore<B>,
    cfg: &Config,
    renderer: &Renderer,
    command: Option<Command>,
) -> anyhow::Result<()> {
    let command = command.unwrap_or_else(|| Command::List(ViewArgs::default()));
    debug!(?command, "dispatching command");

    let result = match command {
        Command::Add(args) => cmd_add(store, &args),
        Command::List(view) => cmd_list(store, cfg, renderer, &view),
        Command::Toggle { id } => cmd_toggle(store, &id),
        Command::Delete { id, yes } => cmd_delete(store, cfg, &id, yes),
        Command::Info { id } => cmd_info(store, renderer, &id),
        Command::Export { view, all } => cmd_export(store, cfg, &view, all),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    };

    if let Some(err) = store.last_save_error() {
        eprintln!("warning: changes were not saved: {err}");
    }
    result
}

#[instrument(skip(store, args))]
fn cmd_add<B: BlobStore>(store: &mut TaskStore<B>, args: &AddArgs) -> anyhow::Result<()> {
    info!("command add");

    let draft = match validate_today(&args.to_raw_input()) {
        Ok(draft) => draft,
        Err(errors) => {
            for (field, msg) in errors.iter() {
                eprintln!("  {field}: {msg}");
            }
            return Err(anyhow::Error::new(errors).context("task not created"));
        }
    };

    let task = store.add(draft);
    println!("Created task {}.", task.short_id());
    Ok(())
}

#[instrument(skip(store, cfg, renderer, view))]
fn cmd_list<B: BlobStore>(
    store: &TaskStore<B>,
    cfg: &Config,
    renderer: &Renderer,
    view: &ViewArgs,
) -> anyhow::Result<()> {
    info!("command list");

    let filter = view_filter(cfg, view);
    let shown = filter.apply(store.tasks());
    renderer.print_task_list(&shown, filter.show_completed)
}

#[instrument(skip(store))]
fn cmd_toggle<B: BlobStore>(store: &mut TaskStore<B>, selector: &str) -> anyhow::Result<()> {
    info!("command toggle");

    let Some(id) = store.resolve(selector)? else {
        println!("No matching task.");
        return Ok(());
    };

    match store.toggle_completed(id) {
        Some(true) => println!("Task {} marked completed.", short_id(id)),
        Some(false) => println!("Task {} marked pending.", short_id(id)),
        None => println!("No matching task."),
    }
    Ok(())
}

#[instrument(skip(store, cfg))]
fn cmd_delete<B: BlobStore>(
    store: &mut TaskStore<B>,
    cfg: &Config,
    selector: &str,
    yes: bool,
) -> anyhow::Result<()> {
    info!("command delete");

    let Some(id) = store.resolve(selector)? else {
        println!("No matching task.");
        return Ok(());
    };

    let mut flow = DeleteFlow::default();
    flow.request(id);

    let skip_prompt = yes || !cfg.get_bool("confirmation").unwrap_or(true);
    let confirmed = if skip_prompt {
        true
    } else {
        let task = store
            .get(id)
            .ok_or_else(|| anyhow!("task vanished before confirmation: {id}"))?;
        prompt_delete(io::stdin().lock(), io::stderr().lock(), task)?
    };

    if confirmed {
        match flow.confirm(store) {
            Some(task) => println!("Deleted task {}.", task.short_id()),
            None => println!("No matching task."),
        }
    } else {
        flow.cancel();
        println!("Deletion cancelled.");
    }
    Ok(())
}

#[instrument(skip(store, renderer))]
fn cmd_info<B: BlobStore>(
    store: &TaskStore<B>,
    renderer: &Renderer,
    selector: &str,
) -> anyhow::Result<()> {
    info!("command info");

    let id = store
        .resolve(selector)?
        .ok_or_else(|| anyhow!("no task matches {selector}"))?;
    let task = store
        .get(id)
        .ok_or_else(|| anyhow!("no task matches {selector}"))?;
    renderer.print_task_info(task)
}

#[instrument(skip(store, cfg, view))]
fn cmd_export<B: BlobStore>(
    store: &TaskStore<B>,
    cfg: &Config,
    view: &ViewArgs,
    all: bool,
) -> anyhow::Result<()> {
    info!("command export");

    let tasks: Vec<Task> = if all {
        store.tasks().to_vec()
    } else {
        view_filter(cfg, view)
            .apply(store.tasks())
            .into_iter()
            .cloned()
            .collect()
    };

    let mut out = io::stdout().lock();
    writeln!(out, "{}", encode(&tasks)?).context("failed writing export")?;
    Ok(())
}

fn view_filter(cfg: &Config, view: &ViewArgs) -> ViewFilter {
    let show_completed = view
        .completion()
        .unwrap_or_else(|| cfg.get_bool("list.completed").unwrap_or(false));
    ViewFilter::new(view.search.clone(), show_completed)
}

/// Asks before deleting `task`. Anything but `y`/`yes` (including end of
/// input) cancels.
pub fn prompt_delete<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
    task: &Task,
) -> anyhow::Result<bool> {
    writeln!(output, "Confirm Deletion")?;
    write!(
        output,
        "Are you sure you want to delete this task ({})? [y/N] ",
        task.task_name
    )?;
    output.flush()?;

    let mut answer = String::new();
    let read = input
        .read_line(&mut answer)
        .context("failed reading confirmation")?;
    if read == 0 {
        warn!("no confirmation input; cancelling delete");
        return Ok(false);
    }

    let answer = answer.trim().to_ascii_lowercase();
    Ok(matches!(answer.as_str(), "y" | "yes"))
}
