//! Upload policy checks: payload size and declared content type.
//!
//! The type check compares two client-supplied claims, the declared content
//! type and the filename extension. File contents are never inspected.

use std::io::{Seek, SeekFrom};

use super::error::IngestError;
use super::naming::split_extension;

/// Declared content types accepted for ingestion and the extension each requires.
pub const ALLOWED_TYPES: &[(&str, &str)] = &[
    ("application/pdf", ".pdf"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    ("application/msword", ".doc"),
    (
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        ".xlsx",
    ),
    ("application/vnd.ms-excel", ".xls"),
    ("text/csv", ".csv"),
];

/// Reduce a content type to its lowercased essence (`type/subtype`).
///
/// Media types are case-insensitive and may carry parameters such as
/// `; charset=utf-8`, which play no part in the allow-list lookup.
fn essence(declared: &str) -> String {
    declared
        .split_once(';')
        .map_or(declared, |(media_type, _)| media_type)
        .trim()
        .to_ascii_lowercase()
}

/// Look up the extension required for a declared content type.
pub fn required_extension(declared: &str) -> Option<&'static str> {
    let essence = essence(declared);
    ALLOWED_TYPES
        .iter()
        .find(|(mime, _)| *mime == essence)
        .map(|(_, ext)| *ext)
}

/// Human-readable list of the allow-list, used in rejection messages.
pub fn allowed_types_description() -> String {
    ALLOWED_TYPES
        .iter()
        .map(|(mime, ext)| format!("{mime} ({ext})"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Measure the total length of `source` and rewind it to the start.
///
/// Fails with [`IngestError::PayloadTooLarge`] when the length exceeds
/// `max_size`. The position is rewound before the size is judged, so a
/// rejected source is left in the same state as an accepted one.
pub fn measure_size<R: Seek + ?Sized>(source: &mut R, max_size: u64) -> Result<u64, IngestError> {
    let size = source
        .seek(SeekFrom::End(0))
        .map_err(IngestError::UnreadableSource)?;
    source
        .seek(SeekFrom::Start(0))
        .map_err(IngestError::UnreadableSource)?;

    if size > max_size {
        return Err(IngestError::PayloadTooLarge {
            size,
            max: max_size,
        });
    }

    Ok(size)
}

/// Check the declared content type against the allow-list and the filename.
///
/// Returns the required extension on success.
pub fn check_declared_type(declared: &str, filename: &str) -> Result<&'static str, IngestError> {
    let expected =
        required_extension(declared).ok_or_else(|| IngestError::UnsupportedMediaType {
            declared: declared.to_string(),
        })?;

    let actual = split_extension(filename).1.to_lowercase();
    if actual != expected {
        return Err(IngestError::ExtensionMismatch {
            declared: declared.to_string(),
            actual,
            expected,
        });
    }

    Ok(expected)
}
