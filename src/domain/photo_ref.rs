//! Inline photo references.
//!
//! Entry text links photos with tokens shaped like `[[photo::a1b2c3d4]]`, where the hash is the
//! first eight hex characters of the photo's content digest. Before an entry is saved the text is
//! parsed, every token is resolved against the diary's photos, and the save is refused if any
//! token is broken, unknown or ambiguous.

use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

use super::photo_hash::{short_hash, SHORT_HASH_LEN};

pub const TOKEN_OPEN: &str = "[[photo::";
pub const TOKEN_CLOSE: &str = "]]";
const LOOSE_OPEN: &str = "[[photo:";

/// Anything that carries a full content hash can be the target of a reference.
pub trait HashedPhoto {
    fn full_hash(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReferenceError {
    #[error("malformed photo reference '{fragment}': missing closing ']]'")]
    Malformed { fragment: String },
    #[error("wrong photo reference format '{fragment}': use [[photo::<hash>]]")]
    WrongFormat { fragment: String },
    #[error("invalid hash '{hash}': must be exactly 8 characters")]
    InvalidLength { hash: String },
    #[error("invalid hash '{hash}': must be hexadecimal")]
    InvalidCharacters { hash: String },
    #[error("hash not found: '{hash}'")]
    NotFound { hash: String },
    #[error("ambiguous hash '{hash}': matches {matches} photos")]
    Ambiguous { hash: String, matches: usize },
}

/// Every problem found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceErrors(Vec<ReferenceError>);

impl ReferenceErrors {
    pub fn errors(&self) -> &[ReferenceError] {
        &self.0
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ReferenceErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for err in &self.0 {
            if !first {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::error::Error for ReferenceErrors {}

/// Renders the token for a photo. Accepts either the full digest or an already short hash.
pub fn reference_token(hash: &str) -> String {
    format!("{TOKEN_OPEN}{}{TOKEN_CLOSE}", short_hash(hash))
}

enum Closing {
    Double(usize),
    Single(usize),
    Missing(usize),
}

/// Scans from `from` to the first `]`. A newline or a new `[` ends the token early.
fn scan_body(text: &str, from: usize) -> Closing {
    let Some(offset) = text[from..].find([']', '\n', '[']) else {
        return Closing::Missing(text.len());
    };
    let idx = from + offset;
    if !text[idx..].starts_with(']') {
        return Closing::Missing(idx);
    }
    if text[idx + 1..].starts_with(']') {
        Closing::Double(idx)
    } else {
        Closing::Single(idx)
    }
}

/// Extracts the unique candidate hashes of well-formed tokens.
///
/// Malformed and wrong-format tokens are fatal: all of them are reported and no candidate is
/// returned.
pub fn parse_references(text: &str) -> Result<BTreeSet<String>, ReferenceErrors> {
    let mut candidates = BTreeSet::new();
    let mut errors = Vec::new();
    let mut cursor = 0usize;

    while let Some(found) = text[cursor..].find(LOOSE_OPEN) {
        let start = cursor + found;
        let after_open = start + LOOSE_OPEN.len();

        if text[after_open..].starts_with(':') {
            let body_start = after_open + 1;
            cursor = match scan_body(text, body_start) {
                Closing::Double(end) => {
                    candidates.insert(text[body_start..end].to_string());
                    end + TOKEN_CLOSE.len()
                }
                Closing::Single(end) => {
                    errors.push(ReferenceError::Malformed {
                        fragment: text[start..=end].to_string(),
                    });
                    end + 1
                }
                Closing::Missing(end) => {
                    errors.push(ReferenceError::Malformed {
                        fragment: text[start..end].trim_end().to_string(),
                    });
                    end
                }
            };
        } else {
            cursor = match scan_body(text, after_open) {
                Closing::Double(end) => {
                    errors.push(ReferenceError::WrongFormat {
                        fragment: text[start..end + TOKEN_CLOSE.len()].to_string(),
                    });
                    end + TOKEN_CLOSE.len()
                }
                Closing::Single(end) => {
                    errors.push(ReferenceError::WrongFormat {
                        fragment: text[start..=end].to_string(),
                    });
                    end + 1
                }
                Closing::Missing(end) => {
                    errors.push(ReferenceError::WrongFormat {
                        fragment: text[start..end].trim_end().to_string(),
                    });
                    end
                }
            };
        }
    }

    if errors.is_empty() {
        Ok(candidates)
    } else {
        Err(ReferenceErrors(errors))
    }
}

/// Resolves one candidate. Length, then character set, then existence; the first failing check
/// is the one reported.
pub fn resolve_reference<'a, P: HashedPhoto>(
    hash: &str,
    photos: &'a [P],
) -> Result<&'a P, ReferenceError> {
    if hash.chars().count() != SHORT_HASH_LEN {
        return Err(ReferenceError::InvalidLength {
            hash: hash.to_string(),
        });
    }
    if !hash.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return Err(ReferenceError::InvalidCharacters {
            hash: hash.to_string(),
        });
    }

    let needle = hash.to_ascii_lowercase();
    let matches = photos
        .iter()
        .filter(|photo| photo.full_hash().to_ascii_lowercase().starts_with(&needle))
        .collect::<Vec<_>>();

    match matches.as_slice() {
        [] => Err(ReferenceError::NotFound {
            hash: hash.to_string(),
        }),
        [single] => Ok(*single),
        many => Err(ReferenceError::Ambiguous {
            hash: hash.to_string(),
            matches: many.len(),
        }),
    }
}

/// Parses and resolves every reference in `text` against `photos`.
///
/// On success returns each referenced photo once. On failure returns every collected error; the
/// caller must not persist anything.
pub fn validate_references<'a, P: HashedPhoto>(
    text: &str,
    photos: &'a [P],
) -> Result<Vec<&'a P>, ReferenceErrors> {
    let candidates = parse_references(text)?;

    let mut resolved: Vec<&'a P> = Vec::new();
    let mut errors = Vec::new();
    for candidate in &candidates {
        match resolve_reference(candidate, photos) {
            Ok(photo) => {
                if !resolved
                    .iter()
                    .any(|seen| seen.full_hash() == photo.full_hash())
                {
                    resolved.push(photo);
                }
            }
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(resolved)
    } else {
        Err(ReferenceErrors(errors))
    }
}
