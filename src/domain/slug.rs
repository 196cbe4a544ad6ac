const FALLBACK_SLUG: &str = "diary";

/// Turns a diary name into a filesystem-friendly directory name.
pub fn sanitize_directory_name(name: &str) -> String {
    let kept = name
        .to_lowercase()
        .chars()
        .filter(|ch| ch.is_alphanumeric() || ch.is_whitespace() || *ch == '_' || *ch == '-')
        .collect::<String>();

    let mut slug = String::with_capacity(kept.len());
    let mut pending_separator = false;
    for ch in kept.trim().chars() {
        if ch.is_whitespace() || ch == '-' {
            pending_separator = true;
            continue;
        }
        // Separators only join words; none survive at either end.
        if pending_separator && !slug.is_empty() {
            slug.push('_');
            pending_separator = false;
        }
        slug.push(ch);
    }

    if slug.is_empty() {
        FALLBACK_SLUG.to_string()
    } else {
        slug
    }
}

/// Appends `_1`, `_2`, ... to the sanitized name until `exists` reports it free.
pub fn unique_directory_name<F>(name: &str, mut exists: F) -> String
where
    F: FnMut(&str) -> bool,
{
    let base = sanitize_directory_name(name);
    if !exists(&base) {
        return base;
    }

    let mut counter = 1usize;
    loop {
        let candidate = format!("{base}_{counter}");
        if !exists(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
