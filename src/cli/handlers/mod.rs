use std::fs;
use std::io::{IsTerminal, Write};
use std::path::Path;

use chrono::{DateTime, Duration, Local, NaiveDate, Utc};
use uuid::Uuid;

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::model::tag::TagColor;
use crate::model::task::Priority;
use crate::ops::import::ImportMode;
use crate::ops::query::TaskQuery;
use crate::ops::tag_ops::{self, TAG_NAME_MAX};
use crate::ops::task_ops::{DETAIL_MAX, TITLE_MAX};
use crate::store::TodoStore;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let mut store = open_store(cli.data_dir.as_deref())?;

    match cli.command {
        // Read commands
        Commands::List(args) => cmd_list(&mut store, args, json),
        Commands::Quadrants(args) => cmd_quadrants(&mut store, args, json),
        Commands::Show(args) => cmd_show(&store, args, json),

        // Write commands
        Commands::Add(args) => cmd_add(&mut store, args, json),
        Commands::Toggle(args) => cmd_toggle(&mut store, args),
        Commands::Done(args) => cmd_done(&mut store, args),
        Commands::Rm(args) => cmd_rm(&mut store, args),
        Commands::ClearDone => cmd_clear_done(&mut store),
        Commands::Title(args) => cmd_title(&mut store, args),
        Commands::Detail(args) => cmd_detail(&mut store, args),
        Commands::Priority(args) => cmd_priority(&mut store, args),
        Commands::Due(args) => cmd_due(&mut store, args),
        Commands::Mv(args) => cmd_mv(&mut store, args),

        // Tag management
        Commands::Tag(cmd) => cmd_tag(&mut store, cmd.action, json),

        // Import / export
        Commands::Import(args) => cmd_import(&mut store, args, json),
        Commands::Export(args) => cmd_export(&store, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_store(data_dir: Option<&Path>) -> Result<TodoStore, Box<dyn std::error::Error>> {
    let dir = config_io::resolve_data_dir(data_dir)?;
    let config = config_io::read_config(&dir)?;
    Ok(TodoStore::open(&dir, config)?)
}

fn use_color() -> bool {
    std::io::stdout().is_terminal()
}

/// Resolve a full UUID or a unique prefix of one among `ids`.
fn resolve_prefix(ids: impl Iterator<Item = Uuid>, input: &str, kind: &str) -> Result<Uuid, String> {
    let needle = input.trim().to_lowercase();
    if needle.is_empty() {
        return Err(format!("empty {} ID", kind));
    }
    let matches: Vec<Uuid> = ids
        .filter(|id| {
            id.hyphenated().to_string().starts_with(&needle)
                || id.simple().to_string().starts_with(&needle)
        })
        .collect();
    match matches.as_slice() {
        [id] => Ok(*id),
        [] => Err(format!("{} not found: {}", kind, input)),
        many => Err(format!(
            "ambiguous {} ID '{}' matches {} entries",
            kind,
            input,
            many.len()
        )),
    }
}

fn resolve_task(store: &TodoStore, input: &str) -> Result<Uuid, String> {
    resolve_prefix(store.tasks().iter().map(|t| t.id), input, "task")
}

fn resolve_tasks(store: &TodoStore, inputs: &[String]) -> Result<Vec<Uuid>, String> {
    inputs.iter().map(|s| resolve_task(store, s)).collect()
}

/// Resolve a tag by name (case-insensitive) or by ID prefix
fn resolve_tag(store: &TodoStore, input: &str) -> Result<Uuid, String> {
    if let Some(tag) = tag_ops::find_tag_by_name(store.tags(), input) {
        return Ok(tag.id);
    }
    resolve_prefix(store.tags().iter().map(|t| t.id), input, "tag")
}

fn parse_priority_arg(s: &str) -> Result<Priority, String> {
    Priority::parse_priority(s)
        .ok_or_else(|| format!("unknown priority '{}' (expected: high, medium, low, none)", s))
}

fn parse_color_arg(s: &str) -> Result<TagColor, String> {
    TagColor::parse_color(s).ok_or_else(|| {
        let names: Vec<&str> = TagColor::ALL.iter().map(|c| c.as_str()).collect();
        format!("unknown color '{}' (expected: {})", s, names.join(", "))
    })
}

/// Parse a due date argument. Dates are local midnight.
fn parse_due(s: &str, today: NaiveDate) -> Result<Option<DateTime<Utc>>, String> {
    let date = match s.trim().to_lowercase().as_str() {
        "none" | "-" | "" => return Ok(None),
        "today" => today,
        "tomorrow" => today + Duration::days(1),
        other => NaiveDate::parse_from_str(other, "%Y-%m-%d")
            .map_err(|_| format!("invalid date '{}' (expected YYYY-MM-DD, today, tomorrow, none)", s))?,
    };
    date.and_hms_opt(0, 0, 0)
        .and_then(|dt| dt.and_local_timezone(Local).earliest())
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .ok_or_else(|| format!("date has no local midnight: {}", date))
}

fn query_from_args(store: &TodoStore, args: &ListArgs) -> Result<TaskQuery, String> {
    Ok(TaskQuery {
        search: args.search.clone().unwrap_or_default(),
        priority: args.priority.as_deref().map(parse_priority_arg).transpose()?,
        tag: args.tag.as_deref().map(|t| resolve_tag(store, t)).transpose()?,
    })
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(store: &mut TodoStore, args: ListArgs, json: bool) -> CmdResult {
    let query = query_from_args(store, &args)?;
    let tags = store.tags().to_vec();
    let tasks = store.filtered_and_sorted(&query);

    if json {
        let out: Vec<TaskJson> = tasks.iter().map(|t| task_to_json(t, &tags)).collect();
        return print_json(&out);
    }
    let color = use_color();
    for task in tasks {
        println!("{}", format_task_line(task, &tags, color));
    }
    Ok(())
}

fn cmd_quadrants(store: &mut TodoStore, args: ListArgs, json: bool) -> CmdResult {
    let query = query_from_args(store, &args)?;
    let groups = store.quadrants(&query);
    let tags = store.tags();

    if json {
        let out: Vec<QuadrantJson> = groups
            .iter()
            .map(|(q, tasks)| quadrant_to_json(*q, tasks, tags))
            .collect();
        return print_json(&out);
    }
    let color = use_color();
    for (i, (quadrant, tasks)) in groups.iter().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", format_quadrant_header(*quadrant, tasks.len()));
        for task in tasks {
            println!("{}", format_task_line(task, tags, color));
        }
    }
    Ok(())
}

fn cmd_show(store: &TodoStore, args: IdArg, json: bool) -> CmdResult {
    let id = resolve_task(store, &args.id)?;
    let task = store.task(id).ok_or_else(|| format!("task not found: {}", args.id))?;
    if json {
        return print_json(&task_to_json(task, store.tags()));
    }
    for line in format_task_detail(task, store.tags(), use_color()) {
        println!("{}", line);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(store: &mut TodoStore, args: AddArgs, json: bool) -> CmdResult {
    let priority = parse_priority_arg(&args.priority)?;
    let id = store
        .add_task(&args.title, priority)?
        .ok_or_else(|| format!("title must be 1 to {} characters", TITLE_MAX))?;
    if json && let Some(task) = store.task(id) {
        return print_json(&task_to_json(task, store.tags()));
    }
    println!("{}", short_id(&id));
    Ok(())
}

fn cmd_toggle(store: &mut TodoStore, args: IdsArg) -> CmdResult {
    let ids = resolve_tasks(store, &args.ids)?;
    store.toggle_completed_many(&ids)?;
    for id in &ids {
        let state = match store.task(*id) {
            Some(t) if t.is_completed => "done",
            _ => "open",
        };
        println!("{} → {}", short_id(id), state);
    }
    Ok(())
}

fn cmd_done(store: &mut TodoStore, args: IdsArg) -> CmdResult {
    let ids = resolve_tasks(store, &args.ids)?;
    store.set_completed_many(&ids, true)?;
    for id in &ids {
        println!("{} → done", short_id(id));
    }
    Ok(())
}

fn cmd_rm(store: &mut TodoStore, args: IdsArg) -> CmdResult {
    let ids = resolve_tasks(store, &args.ids)?;
    store.delete_tasks(&ids)?;
    for id in &ids {
        println!("deleted {}", short_id(id));
    }
    Ok(())
}

fn cmd_clear_done(store: &mut TodoStore) -> CmdResult {
    let count = store.tasks().iter().filter(|t| t.is_completed).count();
    store.clear_completed()?;
    println!("removed {} completed task{}", count, if count == 1 { "" } else { "s" });
    Ok(())
}

fn cmd_title(store: &mut TodoStore, args: TitleArgs) -> CmdResult {
    let id = resolve_task(store, &args.id)?;
    if !store.update_title(id, &args.title)? {
        return Err(format!("title must be 1 to {} characters", TITLE_MAX).into());
    }
    println!("{} title updated", short_id(&id));
    Ok(())
}

fn cmd_detail(store: &mut TodoStore, args: DetailArgs) -> CmdResult {
    let id = resolve_task(store, &args.id)?;
    if !store.update_detail(id, &args.text)? {
        return Err(format!("detail must be at most {} characters", DETAIL_MAX).into());
    }
    println!("{} detail updated", short_id(&id));
    Ok(())
}

fn cmd_priority(store: &mut TodoStore, args: PriorityArgs) -> CmdResult {
    let priority = parse_priority_arg(&args.priority)?;
    let ids = resolve_tasks(store, &args.ids)?;
    store.set_priority_many(&ids, priority)?;
    for id in &ids {
        println!("{} priority → {}", short_id(id), priority.as_str());
    }
    Ok(())
}

fn cmd_due(store: &mut TodoStore, args: DueArgs) -> CmdResult {
    let id = resolve_task(store, &args.id)?;
    let due = parse_due(&args.date, Local::now().date_naive())?;
    store.set_due_date(id, due)?;
    match due {
        Some(d) => println!("{} due {}", short_id(&id), d.with_timezone(&Local).date_naive()),
        None => println!("{} due date cleared", short_id(&id)),
    }
    Ok(())
}

fn cmd_mv(store: &mut TodoStore, args: MvArgs) -> CmdResult {
    let id = resolve_task(store, &args.id)?;
    if !store.move_task(id, args.index)? {
        return Err(format!("cannot move {}: no other tasks share its priority", args.id).into());
    }
    println!("{} moved to {}", short_id(&id), args.index);
    Ok(())
}

// ---------------------------------------------------------------------------
// Tag management
// ---------------------------------------------------------------------------

fn cmd_tag(store: &mut TodoStore, action: TagAction, json: bool) -> CmdResult {
    match action {
        TagAction::New(args) => {
            let color = parse_color_arg(&args.color)?;
            if tag_ops::find_tag_by_name(store.tags(), &args.name).is_some() {
                return Err(format!("tag already exists: {}", args.name.trim()).into());
            }
            let id = store
                .add_tag(&args.name, color)?
                .ok_or_else(|| format!("tag name must be 1 to {} characters", TAG_NAME_MAX))?;
            println!("{}", short_id(&id));
        }
        TagAction::Rename(args) => {
            let id = resolve_tag(store, &args.tag)?;
            if let Some(other) = tag_ops::find_tag_by_name(store.tags(), &args.name)
                && other.id != id
            {
                return Err(format!("tag already exists: {}", other.name).into());
            }
            if tag_ops::validate_tag_name(&args.name).is_err() {
                return Err(format!("tag name must be 1 to {} characters", TAG_NAME_MAX).into());
            }
            store.update_tag(id, Some(&args.name), None)?;
            println!("renamed {} → {}", args.tag, args.name.trim());
        }
        TagAction::Color(args) => {
            let id = resolve_tag(store, &args.tag)?;
            let color = parse_color_arg(&args.color)?;
            store.update_tag(id, None, Some(color))?;
            println!("{} → {}", args.tag, color.as_str());
        }
        TagAction::Rm(args) => {
            let id = resolve_tag(store, &args.tag)?;
            store.delete_tag(id)?;
            println!("deleted tag {}", args.tag);
        }
        TagAction::Ls => {
            if json {
                let out: Vec<TagJson> = store
                    .tags()
                    .iter()
                    .map(|t| tag_to_json(t, store.tasks()))
                    .collect();
                return print_json(&out);
            }
            let color = use_color();
            for tag in store.tags() {
                println!("{}", format_tag_line(tag, store.tasks(), color));
            }
        }
        TagAction::Add(args) => {
            let id = resolve_task(store, &args.id)?;
            let tag = resolve_tag(store, &args.tag)?;
            store.add_tag_to_task(id, tag)?;
            println!("{} tag add {}", short_id(&id), args.tag);
        }
        TagAction::Remove(args) => {
            let id = resolve_task(store, &args.id)?;
            let tag = resolve_tag(store, &args.tag)?;
            store.remove_tag_from_task(id, tag)?;
            println!("{} tag remove {}", short_id(&id), args.tag);
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Import / export
// ---------------------------------------------------------------------------

fn cmd_import(store: &mut TodoStore, args: ImportArgs, json: bool) -> CmdResult {
    let bytes = fs::read(&args.file)
        .map_err(|e| format!("cannot read {}: {}", args.file.display(), e))?;
    let mode = if args.merge {
        ImportMode::Merge
    } else {
        ImportMode::Replace
    };
    let summary = store.import(&bytes, mode)?;
    if json {
        return print_json(&import_to_json(&summary));
    }
    println!(
        "imported: {} added, {} skipped, {} new tags",
        summary.added, summary.skipped, summary.tags_added
    );
    Ok(())
}

fn cmd_export(store: &TodoStore, args: ExportArgs) -> CmdResult {
    let bytes = store.export_bytes()?;
    match args.file {
        Some(path) => {
            fs::write(&path, &bytes).map_err(|e| format!("cannot write {}: {}", path.display(), e))?;
            eprintln!("exported to {}", path.display());
        }
        None => std::io::stdout().write_all(&bytes)?,
    }
    Ok(())
}
