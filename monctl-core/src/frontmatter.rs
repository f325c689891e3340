//! Splitting of Markdown files into a YAML metadata block and a body.
//!
//! A file has front matter when its first line is a boundary of three or
//! more dashes. The metadata runs until the next boundary line; everything
//! after that is the body. Files without an opening boundary are all body.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::WorkspaceError;

static BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^-{3,}[ \t]*\r?$").expect("valid boundary pattern"));

/// Borrowed view of a document split at its front matter boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontMatter<'a> {
    /// Raw YAML between the boundaries, if the document has front matter.
    pub metadata: Option<&'a str>,
    /// Everything after the closing boundary, untrimmed.
    pub body: &'a str,
}

pub fn split(text: &str) -> FrontMatter<'_> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut boundaries = BOUNDARY.find_iter(text);
    match (boundaries.next(), boundaries.next()) {
        (Some(open), Some(close)) if open.start() == 0 => FrontMatter {
            metadata: Some(&text[open.end()..close.start()]),
            body: &text[close.end()..],
        },
        _ => FrontMatter {
            metadata: None,
            body: text,
        },
    }
}

/// Parse `text` into typed metadata and a trimmed body.
///
/// Absent or empty front matter yields `T::default()`; `path` is only used
/// for error context.
pub fn parse<T>(text: &str, path: &Path) -> Result<(T, String), WorkspaceError>
where
    T: DeserializeOwned + Default,
{
    let parts = split(text);
    let metadata = match parts.metadata {
        Some(raw) if !raw.trim().is_empty() => {
            serde_yaml::from_str(raw).map_err(|source| WorkspaceError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        }
        _ => T::default(),
    };
    Ok((metadata, parts.body.trim().to_string()))
}
