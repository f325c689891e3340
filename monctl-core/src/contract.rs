//! # contract: the remote document store as seen by the synchroniser
//!
//! This module defines a single trait ([`DocumentStore`]) and the supporting
//! types the synchroniser needs from the LMS site: fetching a document by
//! doctype and name, saving a document, and looking up users.
//!
//! ## Interface & Extensibility
//! - Implement [`DocumentStore`] to target a new backend (HTTP client, in-memory fake).
//! - All methods are async and return [`StoreError`] on failure.
//! - Authentication, sessions and transport details belong to the implementor.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so tests can assert exactly which
//!   calls happen (for instance that an unchanged document is never saved).
//!
//! ## Documents
//! - A [`Document`] is an untyped JSON object. Remote documents carry
//!   system-managed fields (see [`SYSTEM_FIELDS`]) that the core never writes
//!   and never compares.

use async_trait::async_trait;
use serde_json::{Map, Value};

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::error::StoreError;

/// Flat key/value document as stored by the remote site.
pub type Document = Map<String, Value>;

pub const COURSE_DOCTYPE: &str = "LMS Course";
pub const CHAPTER_DOCTYPE: &str = "Course Chapter";
pub const LESSON_DOCTYPE: &str = "Course Lesson";

/// Account used as course instructor when the local username has no remote user.
pub const DEFAULT_INSTRUCTOR: &str = "Administrator";

/// Fields owned by the remote store. Stripped from table rows before diffing.
pub const SYSTEM_FIELDS: &[&str] = &[
    "name",
    "owner",
    "creation",
    "modified",
    "modified_by",
    "parent",
    "parentfield",
    "parenttype",
    "idx",
    "docstatus",
    "doctype",
];

/// Placeholder content for a stub document of `doctype`.
///
/// Unknown doctypes get an empty document.
pub fn stub_defaults(doctype: &str) -> Document {
    let keys: &[&str] = match doctype {
        COURSE_DOCTYPE => &["title", "short_introduction", "description"],
        CHAPTER_DOCTYPE => &["title", "description"],
        LESSON_DOCTYPE => &["title", "body"],
        _ => &[],
    };
    keys.iter()
        .map(|k| (k.to_string(), Value::String("-".to_string())))
        .collect()
}

/// A user record returned by [`DocumentStore::list_users`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RemoteUser {
    /// The remote user identifier (usually an email address).
    pub name: String,
}

/// Trait for reading and writing documents on the LMS site.
///
/// The trait is implemented by the real HTTP client and by test mocks.
/// Calls are awaited one at a time by the synchroniser; implementors do not
/// need to support concurrent use.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a document. `Ok(None)` when no document with that name exists.
    async fn get_document(&self, doctype: &str, name: &str)
        -> Result<Option<Document>, StoreError>;

    /// Create or update a document. Returns the remote success payload.
    ///
    /// Anything other than a success envelope must be reported as an error.
    async fn save_document(
        &self,
        doctype: &str,
        name: &str,
        doc: &Document,
    ) -> Result<Value, StoreError>;

    /// Users whose local username equals `username`.
    async fn list_users(&self, username: &str) -> Result<Vec<RemoteUser>, StoreError>;
}
