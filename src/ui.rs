use std::io::{self, IsTerminal};

use crate::app::{DiaryView, EntryView, PhotoView};

pub fn print_diary_list(diaries: &[DiaryView]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Diaries"));
    if diaries.is_empty() {
        println!("{}", palette.dim("no diaries yet; create one with `pilgrim diary new`"));
        return;
    }
    for diary in diaries {
        println!("{}", format_diary_row(diary, &palette));
    }
    println!("{}", palette.dim(&format!("{} diary(ies)", diaries.len())));
}

pub fn print_diary(diary: &DiaryView) {
    let palette = Palette::auto();
    println!("{}", format_diary_row(diary, &palette));
    println!("{} {}", palette.label("path:"), diary.path);
}

fn format_diary_row(diary: &DiaryView, palette: &Palette) -> String {
    format!(
        "{} {} {}",
        palette.id(&format!("#{}", diary.id)),
        diary.name,
        palette.dim(&format!(
            "({}, {} entries, {} photos)",
            diary.directory_name,
            diary.entries,
            diary.photos
        ))
    )
}

pub fn print_entry_list(entries: &[EntryView]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Entries"));
    if entries.is_empty() {
        println!("{}", palette.dim("no entries in this diary"));
        return;
    }
    for entry in entries {
        println!("{}", format_entry_row(entry, &palette));
    }
    println!("{}", palette.dim(&format!("{} entry(ies)", entries.len())));
}

fn format_entry_row(entry: &EntryView, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} {}",
        palette.id(&format!("#{}", entry.id)),
        palette.date(&entry.date),
        entry.title
    );
    if !entry.photos.is_empty() {
        line.push(' ');
        line.push_str(&palette.dim(&format!("[{} photo(s)]", entry.photos.len())));
    }
    line
}

pub fn print_entry(entry: &EntryView) {
    let palette = Palette::auto();
    println!("{}", format_entry_row(entry, &palette));
    if !entry.text.is_empty() {
        println!();
        println!("{}", entry.text);
    }
    if !entry.photos.is_empty() {
        println!();
        println!("{}", palette.label("photos:"));
        for photo in &entry.photos {
            println!("  {}", format_photo_row(photo, &palette));
        }
    }
}

pub fn print_photo_list(photos: &[PhotoView]) {
    let palette = Palette::auto();
    println!("{}", palette.heading("Photos"));
    if photos.is_empty() {
        println!("{}", palette.dim("no photos in this diary"));
        return;
    }
    for photo in photos {
        println!("{}", format_photo_row(photo, &palette));
    }
    println!("{}", palette.dim(&format!("{} photo(s)", photos.len())));
}

pub fn print_photo(photo: &PhotoView) {
    let palette = Palette::auto();
    println!("{}", format_photo_row(photo, &palette));
    println!("{} {}", palette.label("file:"), photo.filepath);
    println!("{} {}", palette.label("added:"), photo.addition_date);
}

fn format_photo_row(photo: &PhotoView, palette: &Palette) -> String {
    let mut line = format!(
        "{} {} {}",
        palette.id(&format!("#{}", photo.id)),
        palette.reference(&photo.reference),
        photo.name
    );
    if let Some(caption) = photo.caption.as_deref() {
        line.push(' ');
        line.push_str(&palette.dim(&format!("- {caption}")));
    }
    line
}

/// Summary for `pilgrim check`: which photos the text resolves to.
pub fn print_reference_check(photos: &[PhotoView]) {
    let palette = Palette::auto();
    if photos.is_empty() {
        println!("{}", palette.ok("references ok: no photos referenced"));
        return;
    }
    println!(
        "{}",
        palette.ok(&format!("references ok: {} photo(s)", photos.len()))
    );
    for photo in photos {
        println!("  {}", format_photo_row(photo, &palette));
    }
}

struct Palette {
    enabled: bool,
}

impl Palette {
    fn auto() -> Self {
        let enabled = std::env::var_os("NO_COLOR").is_none() && io::stdout().is_terminal();
        Self { enabled }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn heading(&self, text: &str) -> String {
        self.paint("1;36", text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint("2", text)
    }

    fn id(&self, text: &str) -> String {
        self.paint("1;94", text)
    }

    fn label(&self, text: &str) -> String {
        self.paint("1", text)
    }

    fn date(&self, text: &str) -> String {
        self.paint("33", text)
    }

    fn reference(&self, text: &str) -> String {
        self.paint("35", text)
    }

    fn ok(&self, text: &str) -> String {
        self.paint("32", text)
    }
}
