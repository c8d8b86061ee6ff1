//! Filename sanitizing and stored-name generation.

use chrono::{DateTime, Utc};

use super::MAX_STORED_NAME_LENGTH;

/// Character substituted for anything unsafe in a filename.
pub const PLACEHOLDER: char = '_';

/// Name used when nothing usable is left of the submitted filename.
pub const FALLBACK_NAME: &str = "upload";

/// Timestamp inserted by [`unique_name`]; sorts lexically by time.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

/// Characters that are separators, wildcards or otherwise special on common filesystems.
const HAZARDOUS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Split a filename into base and extension.
///
/// The extension includes its leading dot. Only the last path component is
/// considered, and leading dots do not start an extension, so `.bashrc` and
/// `..pdf` have none.
///
/// ```
/// use docflow::document::split_extension;
///
/// assert_eq!(split_extension("report.final.pdf"), ("report.final", ".pdf"));
/// assert_eq!(split_extension("../etc/passwd.pdf"), ("../etc/passwd", ".pdf"));
/// assert_eq!(split_extension(".bashrc"), (".bashrc", ""));
/// ```
pub fn split_extension(name: &str) -> (&str, &str) {
    let file_start = name.rfind(is_separator).map_or(0, |i| i + 1);
    let file = &name[file_start..];

    match file.rfind('.') {
        Some(dot) if file[..dot].chars().any(|c| c != '.') => {
            name.split_at(file_start + dot)
        }
        _ => (name, ""),
    }
}

/// Longest prefix of `s` that fits in `max` bytes without splitting a character.
fn cut_to_boundary(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn truncate_preserving_extension(name: &str, max: usize) -> String {
    if name.len() <= max {
        return name.to_string();
    }

    let (base, ext) = split_extension(name);
    if ext.len() >= max {
        return cut_to_boundary(name, max).trim_end().to_string();
    }

    // A cut base must not end in a dot, or it would run into the extension's dot.
    let kept = cut_to_boundary(base, max - ext.len())
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace());
    if kept.is_empty() {
        format!("{PLACEHOLDER}{ext}")
    } else {
        format!("{kept}{ext}")
    }
}

/// Make a client-supplied filename safe to use as a single path component.
///
/// - hazardous and control characters become [`PLACEHOLDER`]
/// - every `..` becomes [`PLACEHOLDER`], and the extension is kept intact
/// - surrounding whitespace is removed and a leading `.` gets a placeholder prefix
/// - names over [`MAX_STORED_NAME_LENGTH`] bytes are shortened, keeping the extension
/// - an empty result is replaced by [`FALLBACK_NAME`]
///
/// The function is total and idempotent.
pub fn sanitize_filename(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if HAZARDOUS.contains(&c) || c.is_control() {
                PLACEHOLDER
            } else {
                c
            }
        })
        .collect();

    let (base, ext) = split_extension(&replaced);
    let mut base = base.replace("..", "_");
    if !ext.is_empty() && base.ends_with('.') {
        base.pop();
        base.push(PLACEHOLDER);
    }

    let joined = format!("{base}{ext}");
    let trimmed = joined.trim();
    let visible = if trimmed.starts_with('.') {
        format!("{PLACEHOLDER}{trimmed}")
    } else {
        trimmed.to_string()
    };

    let bounded = truncate_preserving_extension(&visible, MAX_STORED_NAME_LENGTH);
    if bounded.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        bounded
    }
}

/// Insert a second-resolution timestamp between base name and extension.
///
/// `report.pdf` uploaded at 2024-03-05 14:07:09 UTC becomes
/// `report_20240305_140709.pdf`.
pub fn unique_name(sanitized: &str, at: DateTime<Utc>) -> String {
    let (base, ext) = split_extension(sanitized);
    format!("{base}_{}{ext}", at.format(TIMESTAMP_FORMAT))
}

/// Derive the `attempt`-th alternative for a stored name that is already taken.
///
/// `report_20240305_140709.pdf` with attempt 2 becomes
/// `report_20240305_140709_2.pdf`.
pub fn disambiguate(stored_name: &str, attempt: u32) -> String {
    let (base, ext) = split_extension(stored_name);
    format!("{base}_{attempt}{ext}")
}
