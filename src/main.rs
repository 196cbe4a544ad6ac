mod app;
mod cli;
mod completions;
mod config;
mod db;
mod domain;
mod logging;
mod paths;
mod store;
mod tui;
mod ui;

use std::io::Read;
use std::path::Path;

use app::{App, AppError, EntryDraft, PhotoImport};
use cli::{BodyArgs, Commands, DiarySubcommands, EntrySubcommands, PhotoSubcommands};

fn main() {
    if let Err(err) = run() {
        report(&err);
        std::process::exit(1);
    }
}

/// Reference failures get one `error:` line each.
fn report(err: &AppError) {
    match err {
        AppError::References(errors) => {
            for err in errors.errors() {
                eprintln!("error: {err}");
            }
        }
        other => eprintln!("error: {}", other),
    }
}

fn print_json(value: &impl serde::Serialize) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).expect("json serialization should work")
    );
}

fn run() -> Result<(), AppError> {
    use clap::Parser;

    let cli = cli::Cli::parse();
    let command = cli.command.unwrap_or(Commands::Tui);
    if let Commands::Completions(args) = &command {
        return completions::run_completions_command(args.shell, args.install);
    }

    let layout = paths::DirectoryLayout::resolve(cli.home)?;
    layout.ensure_home()?;
    logging::init(&layout.log_path())?;
    let config = config::Config::load_or_create(&layout)?;
    let mut app = App::open(layout, config, cli.db.as_deref())?;

    match command {
        Commands::Tui => tui::run(app),
        Commands::Diary(args) => run_diary(&mut app, args.command),
        Commands::Entry(args) => run_entry(&mut app, args.command),
        Commands::Photo(args) => run_photo(&mut app, args.command),
        Commands::Check(args) => {
            let text = read_body(&args.body)?.unwrap_or_default();
            let photos = app.check_references(args.diary_id, &text)?;
            if args.json {
                print_json(&photos);
            } else {
                ui::print_reference_check(&photos);
            }
            Ok(())
        }
        Commands::Completions(_) => Ok(()),
    }
}

fn run_diary(app: &mut App, command: DiarySubcommands) -> Result<(), AppError> {
    match command {
        DiarySubcommands::New(args) => {
            let diary = app.create_diary(&args.name)?;
            if args.json {
                print_json(&diary);
            } else {
                println!("created diary #{} {} ({})", diary.id, diary.name, diary.path);
            }
        }
        DiarySubcommands::Ls(args) => {
            let diaries = app.list_diaries()?;
            if args.json {
                print_json(&diaries);
            } else {
                ui::print_diary_list(&diaries);
            }
        }
        DiarySubcommands::Show(args) => {
            let diary = app.get_diary(args.id)?;
            if args.json {
                print_json(&diary);
            } else {
                ui::print_diary(&diary);
            }
        }
        DiarySubcommands::Rename(args) => {
            let diary = app.rename_diary(args.id, &args.name)?;
            println!("renamed diary #{} to {}", diary.id, diary.name);
        }
        DiarySubcommands::Rm(args) => {
            let diary = app.get_diary(args.id)?;
            if args.confirm != diary.name {
                return Err(AppError::InvalidArgument(format!(
                    "confirmation '{}' does not match diary name '{}'",
                    args.confirm, diary.name
                )));
            }
            let removed = app.delete_diary(args.id)?;
            println!(
                "deleted diary #{} {} ({} entries, {} photos)",
                removed.id, removed.name, removed.entries, removed.photos
            );
        }
    }
    Ok(())
}

fn run_entry(app: &mut App, command: EntrySubcommands) -> Result<(), AppError> {
    match command {
        EntrySubcommands::New(args) => {
            let entry = app.save_entry(EntryDraft {
                id: None,
                diary_id: args.diary_id,
                title: args.title,
                text: read_body(&args.body)?.unwrap_or_default(),
                date: args.date,
            })?;
            if args.json {
                print_json(&entry);
            } else {
                println!(
                    "created entry #{} {} ({} photo(s) linked)",
                    entry.id,
                    entry.title,
                    entry.photos.len()
                );
            }
        }
        EntrySubcommands::Ls(args) => {
            let entries = app.list_entries(args.diary_id)?;
            if args.json {
                print_json(&entries);
            } else {
                ui::print_entry_list(&entries);
            }
        }
        EntrySubcommands::Show(args) => {
            let entry = app.get_entry(args.id)?;
            if args.json {
                print_json(&entry);
            } else {
                ui::print_entry(&entry);
            }
        }
        EntrySubcommands::Edit(args) => {
            let current = app.get_entry(args.id)?;
            let text = read_body(&args.body)?;
            if args.title.is_none() && args.date.is_none() && text.is_none() {
                return Err(AppError::InvalidArgument(
                    "entry edit requires --title, --date, --text or --file".to_string(),
                ));
            }
            // A title-only change skips reference validation.
            let entry = match (args.title, args.date, text) {
                (Some(title), None, None) => app.rename_entry(current.id, &title)?,
                (title, date, text) => app.save_entry(EntryDraft {
                    id: Some(current.id),
                    diary_id: current.diary_id,
                    title: title.unwrap_or(current.title),
                    text: text.unwrap_or(current.text),
                    date,
                })?,
            };
            if args.json {
                print_json(&entry);
            } else {
                println!(
                    "updated entry #{} {} ({} photo(s) linked)",
                    entry.id,
                    entry.title,
                    entry.photos.len()
                );
            }
        }
        EntrySubcommands::Photos(args) => {
            let photos = app.entry_photos(args.id)?;
            if args.json {
                print_json(&photos);
            } else {
                ui::print_photo_list(&photos);
            }
        }
        EntrySubcommands::Rm(args) => {
            let entry = app.delete_entry(args.id)?;
            println!("deleted entry #{} {}", entry.id, entry.title);
        }
    }
    Ok(())
}

fn run_photo(app: &mut App, command: PhotoSubcommands) -> Result<(), AppError> {
    match command {
        PhotoSubcommands::Add(args) => {
            let photo = app.ingest_photo(
                args.diary_id,
                PhotoImport {
                    source: args.path,
                    name: args.name,
                    caption: args.caption,
                },
            )?;
            if args.json {
                print_json(&photo);
            } else {
                println!("added photo #{} {} {}", photo.id, photo.name, photo.reference);
            }
        }
        PhotoSubcommands::Ls(args) => {
            let photos = app.list_photos(args.diary_id)?;
            if args.json {
                print_json(&photos);
            } else {
                ui::print_photo_list(&photos);
            }
        }
        PhotoSubcommands::Edit(args) => {
            if args.name.is_none() && args.caption.is_none() {
                return Err(AppError::InvalidArgument(
                    "photo edit requires --name or --caption".to_string(),
                ));
            }
            let photo = app.update_photo(args.id, args.name.as_deref(), args.caption.as_deref())?;
            ui::print_photo(&photo);
        }
        PhotoSubcommands::Rm(args) => {
            let linked = app.photo_link_count(args.id)?;
            let photo = app.delete_photo(args.id)?;
            println!("deleted photo #{} {}", photo.id, photo.name);
            if linked > 0 {
                eprintln!(
                    "warning: {linked} entr{} still reference {} and will fail to save until edited",
                    if linked == 1 { "y" } else { "ies" },
                    photo.reference
                );
            }
        }
        PhotoSubcommands::Ref(args) => {
            println!("{}", app.get_photo(args.id)?.reference);
        }
    }
    Ok(())
}

/// `--text` wins as given; `--file -` reads stdin.
fn read_body(body: &BodyArgs) -> Result<Option<String>, AppError> {
    if let Some(text) = &body.text {
        return Ok(Some(text.clone()));
    }
    match body.file.as_deref() {
        Some(path) if path == Path::new("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(Some(buf))
        }
        Some(path) => Ok(Some(std::fs::read_to_string(path)?)),
        None => Ok(None),
    }
}
