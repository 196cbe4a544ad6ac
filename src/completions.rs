//! Shell completion scripts, printed to stdout or installed where the shell looks for them.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap_complete::{generate, Shell};

use crate::app::AppError;

const BIN_NAME: &str = "pilgrim";

/// Where a script goes, plus the rc file that has to source it when the shell has no
/// autoload directory of its own.
#[derive(Debug, Clone, PartialEq, Eq)]
struct InstallTarget {
    script: PathBuf,
    source_from: Option<PathBuf>,
}

/// The directories an install resolves against, split out so tests can point them anywhere.
struct UserDirs {
    home: PathBuf,
    data: PathBuf,
    config: PathBuf,
}

impl UserDirs {
    fn current() -> io::Result<Self> {
        let home = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not determine home directory")
        })?;
        Ok(Self {
            data: dirs::data_dir().unwrap_or_else(|| home.join(".local/share")),
            config: dirs::config_dir().unwrap_or_else(|| home.join(".config")),
            home,
        })
    }

    fn target(&self, shell: Shell) -> Option<InstallTarget> {
        match shell {
            Shell::Bash => Some(InstallTarget {
                script: self.data.join("bash-completion/completions").join(BIN_NAME),
                source_from: None,
            }),
            Shell::Fish => Some(InstallTarget {
                script: self
                    .config
                    .join("fish/completions")
                    .join(format!("{BIN_NAME}.fish")),
                source_from: None,
            }),
            Shell::Zsh => Some(InstallTarget {
                script: self
                    .config
                    .join(BIN_NAME)
                    .join("completions")
                    .join(format!("_{BIN_NAME}")),
                source_from: Some(self.home.join(".zshrc")),
            }),
            _ => None,
        }
    }
}

fn render(shell: Shell) -> Vec<u8> {
    let mut cmd = crate::cli::styled_command();
    let mut script = Vec::new();
    generate(shell, &mut cmd, BIN_NAME, &mut script);
    script
}

fn install(shell: Shell, user_dirs: &UserDirs) -> io::Result<PathBuf> {
    let target = user_dirs.target(shell).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::Unsupported,
            format!("{shell} completions can only be printed, not installed"),
        )
    })?;
    if let Some(parent) = target.script.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&target.script, render(shell))?;
    if let Some(rc) = &target.source_from {
        append_source_line(rc, &target.script)?;
    }
    Ok(target.script)
}

/// Idempotent: a line already present is left alone.
fn append_source_line(rc: &Path, script: &Path) -> io::Result<()> {
    let line = format!("source \"{}\"", script.display());
    let existing = match std::fs::read_to_string(rc) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err),
    };
    if existing.lines().any(|current| current.trim() == line) {
        return Ok(());
    }

    let mut file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(rc)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }
    writeln!(file, "# {BIN_NAME} completions")?;
    writeln!(file, "{line}")
}

pub fn run_completions_command(shell: Option<Shell>, install_it: bool) -> Result<(), AppError> {
    let shell = shell.or_else(Shell::from_env).ok_or_else(|| {
        AppError::InvalidArgument(
            "unable to detect shell from $SHELL; pass a shell name".to_string(),
        )
    })?;

    if install_it {
        let path = install(shell, &UserDirs::current()?)?;
        println!("completions installed to {}", path.display());
    } else {
        io::stdout().lock().write_all(&render(shell))?;
    }
    Ok(())
}
