use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument};

use crate::cli::{AddArgs, Command, DueArgs, EditArgs, TaskRef, TasksArgs};
use crate::compose::{DisplayMode, DueDateComposer, DueDateSelection, Hour, Minute};
use crate::config::Config;
use crate::countdown::remaining;
use crate::datetime::parse_calendar_date;
use crate::error::ScreenError;
use crate::form::TaskForm;
use crate::model::{ListId, TaskId};
use crate::render::Renderer;
use crate::screen::HomeScreen;
use crate::store::{SnapshotStore, TaskStore};
use crate::view::CompletionFilter;

#[instrument(skip(store, cfg, renderer, command, now))]
pub fn dispatch(
    store: &SnapshotStore,
    cfg: &Config,
    renderer: &mut Renderer,
    command: Command,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let composer = DueDateComposer::new(cfg.locale);
    debug!(?command, %now, "dispatching command");

    match command {
        Command::Lists => cmd_lists(store, cfg, renderer, composer),
        Command::NewList { title } => cmd_new_list(store, &title),
        Command::Tasks(args) => cmd_tasks(store, cfg, renderer, composer, args, now),
        Command::Add(args) => cmd_add(store, renderer, composer, args),
        Command::Edit(args) => cmd_edit(store, renderer, composer, args),
        Command::Delete(target) => cmd_delete(store, renderer, composer, target),
        Command::Compose(args) => cmd_compose(renderer, composer, &args),
        Command::Countdown { due } => renderer.print_countdown(&remaining(Some(&due), now)),
    }
}

#[instrument(skip(store, cfg, renderer, composer))]
fn cmd_lists(
    store: &SnapshotStore,
    cfg: &Config,
    renderer: &mut Renderer,
    composer: DueDateComposer,
) -> anyhow::Result<()> {
    info!("command lists");
    let mut screen = HomeScreen::new(composer, cfg.filter);
    let loaded = screen.on_lists(store.lists());
    report(renderer, screen.error(), loaded)?;
    renderer.print_lists(screen.lists(), screen.selected_list())
}

#[instrument(skip(store))]
fn cmd_new_list(store: &SnapshotStore, title: &str) -> anyhow::Result<()> {
    info!("command new-list");
    let list = store.create_list(title)?;
    println!("Created list {}.", list.id);
    Ok(())
}

#[instrument(skip(store, cfg, renderer, composer, now))]
fn cmd_tasks(
    store: &SnapshotStore,
    cfg: &Config,
    renderer: &mut Renderer,
    composer: DueDateComposer,
    args: TasksArgs,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    info!("command tasks");

    let filter = match args.filter.as_deref() {
        Some(raw) => raw.parse::<CompletionFilter>()?,
        None => cfg.filter,
    };

    let mut screen = HomeScreen::new(composer, filter);
    match args.list.map(ListId) {
        Some(list_id) => {
            let loaded = screen.load_preferring(store, &list_id);
            report(renderer, screen.error(), loaded)?;
            if screen.selected_list() != Some(&list_id) {
                anyhow::bail!("unknown list: {list_id}");
            }
        }
        None => {
            let loaded = screen.load(store);
            report(renderer, screen.error(), loaded)?;
        }
    }

    let rows = screen.rows(now);
    renderer.print_task_rows(&rows)
}

#[instrument(skip(store, renderer, composer, args), fields(title = %args.title))]
fn cmd_add(
    store: &SnapshotStore,
    renderer: &mut Renderer,
    composer: DueDateComposer,
    args: AddArgs,
) -> anyhow::Result<()> {
    info!("command add");

    let mut form = TaskForm::create(composer).with_display_mode(display_mode(&args.due));
    let loaded = form.load_lists(store);
    report(renderer, form.error(), loaded)?;

    if let Some(list) = args.list {
        form.select_list(ListId(list));
    }
    form.set_title(args.title);
    form.set_detail(args.detail);
    apply_due_fields(&mut form, &args.due)?;

    let saved = form.submit(store);
    let task = report(renderer, form.error(), saved)?;
    println!("Created task {}. Due: {}", task.id, form.composed().display);
    Ok(())
}

#[instrument(skip(store, renderer, composer, args))]
fn cmd_edit(
    store: &SnapshotStore,
    renderer: &mut Renderer,
    composer: DueDateComposer,
    args: EditArgs,
) -> anyhow::Result<()> {
    info!("command edit");

    let list_id = ListId(args.target.list);
    let task_id = TaskId(args.target.task);
    let form = TaskForm::load_edit(store, &list_id, &task_id, composer);
    let mut form = match form {
        Ok(form) => form.with_display_mode(display_mode(&args.due)),
        Err(err) => {
            renderer.print_error(&err.user_message(composer.locale()));
            return Err(err.into());
        }
    };

    if let Some(title) = args.title {
        form.set_title(title);
    }
    if let Some(detail) = args.detail {
        form.set_detail(detail);
    }
    if args.done {
        form.set_done(true);
    } else if args.todo {
        form.set_done(false);
    }
    if args.clear_due {
        form.clear_due();
    } else {
        apply_due_fields(&mut form, &args.due)?;
    }

    let saved = form.submit(store);
    let task = report(renderer, form.error(), saved)?;
    println!("Updated task {}. Due: {}", task.id, form.composed().display);
    Ok(())
}

#[instrument(skip(store, renderer, composer))]
fn cmd_delete(
    store: &SnapshotStore,
    renderer: &mut Renderer,
    composer: DueDateComposer,
    target: TaskRef,
) -> anyhow::Result<()> {
    info!("command delete");

    let list_id = ListId(target.list);
    let task_id = TaskId(target.task);
    let mut form = match TaskForm::load_edit(store, &list_id, &task_id, composer) {
        Ok(form) => form,
        Err(err) => {
            renderer.print_error(&err.user_message(composer.locale()));
            return Err(err.into());
        }
    };
    let deleted = form.delete(store);
    report(renderer, form.error(), deleted)?;
    println!("Deleted task {task_id}.");
    Ok(())
}

#[instrument(skip(renderer, composer))]
fn cmd_compose(
    renderer: &mut Renderer,
    composer: DueDateComposer,
    args: &DueArgs,
) -> anyhow::Result<()> {
    info!("command compose");
    let selection = selection_from_args(args, DueDateSelection::default())?;
    renderer.print_composed(&composer.compose(&selection, display_mode(args)))
}

fn display_mode(args: &DueArgs) -> DisplayMode {
    if args.date_only {
        DisplayMode::DateOnly
    } else {
        DisplayMode::DateTime
    }
}

/// Routes each provided fragment through its own field handler, so the form
/// recomposes exactly as it would for interactive edits.
fn apply_due_fields(form: &mut TaskForm, args: &DueArgs) -> anyhow::Result<()> {
    let selection = selection_from_args(args, *form.selection())?;
    if args.hour.is_some() {
        form.set_hour(selection.hour);
    }
    if args.minute.is_some() {
        form.set_minute(selection.minute);
    }
    if args.date.is_some() {
        form.set_date(selection.date);
    }
    Ok(())
}

fn selection_from_args(
    args: &DueArgs,
    base: DueDateSelection,
) -> anyhow::Result<DueDateSelection> {
    let mut selection = base;
    if let Some(raw) = args.date.as_deref() {
        selection.date = Some(parse_calendar_date(raw)?);
    }
    if let Some(raw) = args.hour.as_deref() {
        selection.hour = raw.parse::<Hour>()?;
    }
    if let Some(raw) = args.minute.as_deref() {
        selection.minute = raw.parse::<Minute>()?;
    }
    Ok(selection)
}

/// Prints the localized message of a failed screen action before handing the
/// error on to the caller.
fn report<T>(
    renderer: &mut Renderer,
    message: Option<&str>,
    result: Result<T, ScreenError>,
) -> anyhow::Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(err) => {
            if let Some(message) = message {
                renderer.print_error(message);
            }
            Err(err.into())
        }
    }
}
