use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{ArgGroup, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "pilgrim")]
#[command(bin_name = "pilgrim")]
#[command(version)]
#[command(about = "A terminal travel diary with photo references")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        long,
        env = "PILGRIM_HOME",
        global = true,
        help = "Directory holding config.toml, the database and diaries (default ~/.pilgrim)."
    )]
    pub home: Option<PathBuf>,

    #[arg(
        long,
        env = "PILGRIM_DB_PATH",
        global = true,
        help = "SQLite database path; overrides database.url from config.toml."
    )]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Start the interactive terminal UI (the default).")]
    Tui,
    #[command(about = "Create, list, rename and delete diaries.")]
    Diary(DiaryArgs),
    #[command(about = "Write, read and delete diary entries.")]
    Entry(EntryArgs),
    #[command(about = "Add and manage photos in a diary.")]
    Photo(PhotoArgs),
    #[command(about = "Validate photo references without saving.")]
    Check(CheckArgs),
    #[command(about = "Generate or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct DiaryArgs {
    #[command(subcommand)]
    pub command: DiarySubcommands,
}

#[derive(Debug, Subcommand)]
pub enum DiarySubcommands {
    #[command(about = "Create a diary and its directory.")]
    New(DiaryNewArgs),
    #[command(about = "List diaries.")]
    Ls(JsonArgs),
    #[command(about = "Show one diary.")]
    Show(DiaryShowArgs),
    #[command(about = "Change a diary's display name.")]
    Rename(DiaryRenameArgs),
    #[command(about = "Delete a diary with all entries, photos and files.")]
    Rm(DiaryRmArgs),
}

#[derive(Debug, Args)]
pub struct DiaryNewArgs {
    #[arg(help = "Diary name.")]
    pub name: String,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct JsonArgs {
    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DiaryShowArgs {
    #[arg(help = "Diary id.")]
    pub id: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct DiaryRenameArgs {
    #[arg(help = "Diary id.")]
    pub id: i64,

    #[arg(help = "New display name.")]
    pub name: String,
}

#[derive(Debug, Args)]
pub struct DiaryRmArgs {
    #[arg(help = "Diary id.")]
    pub id: i64,

    #[arg(long, help = "Repeat the diary name to confirm deletion.")]
    pub confirm: String,
}

#[derive(Debug, Args)]
pub struct EntryArgs {
    #[command(subcommand)]
    pub command: EntrySubcommands,
}

#[derive(Debug, Subcommand)]
pub enum EntrySubcommands {
    #[command(about = "Create an entry; references are validated before saving.")]
    New(EntryNewArgs),
    #[command(about = "List the entries of a diary.")]
    Ls(EntryLsArgs),
    #[command(about = "Show one entry with its linked photos.")]
    Show(EntryShowArgs),
    #[command(about = "Edit an entry; references are validated before saving.")]
    Edit(EntryEditArgs),
    #[command(about = "List the photos an entry references.")]
    Photos(EntryShowArgs),
    #[command(about = "Delete an entry.")]
    Rm(EntryRmArgs),
}

/// `--text` and `--file` are mutually exclusive ways to provide a body.
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("body").args(["text", "file"]).multiple(false)))]
pub struct BodyArgs {
    #[arg(long, help = "Entry text.")]
    pub text: Option<String>,

    #[arg(long, help = "Read the entry text from a file ('-' for stdin).")]
    pub file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct EntryNewArgs {
    #[arg(help = "Diary id.")]
    pub diary_id: i64,

    #[arg(short = 't', long, help = "Entry title.")]
    pub title: String,

    #[arg(long, help = "Entry date as YYYY-MM-DD (defaults to today, UTC).")]
    pub date: Option<String>,

    #[command(flatten)]
    pub body: BodyArgs,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct EntryLsArgs {
    #[arg(help = "Diary id.")]
    pub diary_id: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct EntryShowArgs {
    #[arg(help = "Entry id.")]
    pub id: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct EntryEditArgs {
    #[arg(help = "Entry id.")]
    pub id: i64,

    #[arg(short = 't', long, help = "New title.")]
    pub title: Option<String>,

    #[arg(long, help = "New date as YYYY-MM-DD.")]
    pub date: Option<String>,

    #[command(flatten)]
    pub body: BodyArgs,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct EntryRmArgs {
    #[arg(help = "Entry id.")]
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct PhotoArgs {
    #[command(subcommand)]
    pub command: PhotoSubcommands,
}

#[derive(Debug, Subcommand)]
pub enum PhotoSubcommands {
    #[command(about = "Copy a photo into a diary and print its reference token.")]
    Add(PhotoAddArgs),
    #[command(about = "List the photos of a diary.")]
    Ls(PhotoLsArgs),
    #[command(about = "Change a photo's name or caption.")]
    Edit(PhotoEditArgs),
    #[command(about = "Delete a photo and unlink it from entries.")]
    Rm(PhotoIdArgs),
    #[command(about = "Print the reference token for a photo.")]
    Ref(PhotoIdArgs),
}

#[derive(Debug, Args)]
pub struct PhotoAddArgs {
    #[arg(help = "Diary id.")]
    pub diary_id: i64,

    #[arg(help = "Path of the photo to copy in.")]
    pub path: PathBuf,

    #[arg(short = 'n', long, help = "Display name (defaults to the file stem).")]
    pub name: Option<String>,

    #[arg(short = 'c', long, help = "Optional caption.")]
    pub caption: Option<String>,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PhotoLsArgs {
    #[arg(help = "Diary id.")]
    pub diary_id: i64,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct PhotoEditArgs {
    #[arg(help = "Photo id.")]
    pub id: i64,

    #[arg(short = 'n', long, help = "New display name.")]
    pub name: Option<String>,

    #[arg(short = 'c', long, help = "New caption; an empty value clears it.")]
    pub caption: Option<String>,
}

#[derive(Debug, Args)]
pub struct PhotoIdArgs {
    #[arg(help = "Photo id.")]
    pub id: i64,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[arg(help = "Diary id whose photos the references must resolve to.")]
    pub diary_id: i64,

    #[command(flatten)]
    pub body: BodyArgs,

    #[arg(short = 'j', long, help = "Render machine-readable JSON.")]
    pub json: bool,
}

#[derive(Debug, Args)]
#[command(about = "Generate or install shell completions.")]
pub struct CompletionsArgs {
    #[arg(value_enum, ignore_case = true, help = "Target shell. Detected from $SHELL if omitted.")]
    pub shell: Option<Shell>,

    #[arg(long, help = "Install completions to the standard location for the shell.")]
    pub install: bool,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
