//! Error types for monctl-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading courses, chapters and lessons from disk.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A course file or lesson front matter that is not valid YAML for its schema.
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// A required field is absent from a course file or lesson front matter.
    #[error("missing required field `{field}` in {path}")]
    MissingField { field: String, path: PathBuf },

    #[error("chapter `{chapter}` is not declared in course `{course}`")]
    ChapterNotFound { course: String, chapter: String },

    /// The lesson file's stem is not listed under its chapter in course.yml.
    #[error("lesson `{lesson}` is not listed under chapter `{chapter}`")]
    LessonNotFound { chapter: String, lesson: String },

    /// A lesson path must look like `<course>/<chapter>/<lesson>.md`.
    #[error("cannot locate chapter and course for lesson path {path}")]
    InvalidLessonPath { path: PathBuf },
}

/// Errors raised by a [`crate::contract::DocumentStore`] implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never produced a usable response (connection, TLS, decoding).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The remote method answered without a success envelope.
    #[error("remote method {method} failed: {message}")]
    RemoteWrite { method: String, message: String },

    /// The response did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors raised while synchronising entities to the remote store.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Workspace(#[from] WorkspaceError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience constructor for [`WorkspaceError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> WorkspaceError {
    WorkspaceError::Io {
        path: path.into(),
        source,
    }
}

/// Convenience constructor for [`WorkspaceError::MissingField`].
pub(crate) fn missing(field: impl Into<String>, path: impl Into<PathBuf>) -> WorkspaceError {
    WorkspaceError::MissingField {
        field: field.into(),
        path: path.into(),
    }
}
