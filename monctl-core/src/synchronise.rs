//! High-level pipeline: pushes courses, chapters and lessons to the remote store.
//!
//! For every entity the [`Synchroniser`]:
//!   - Ensures the documents it references exist, creating placeholder stubs
//!     where they are missing (see [`Synchroniser::ensure_exists`])
//!   - Projects the entity into its desired document
//!   - Fetches the current remote document, restricts it to the desired
//!     document's keys and strips system-managed fields from table rows
//!   - Saves only when the two differ
//!
//! A course push continues into its chapters, and a chapter push into its
//! lessons. Each push is idempotent and can be run standalone: a lesson push
//! creates its course and chapter stubs if needed.
//!
//! # Error Handling
//! Fail-fast. The first failed remote call aborts the rest of the push and is
//! returned to the caller. Documents written before the failure stay written.
//!
//! # Navigation
//! - Entry points: [`Synchroniser::synchronize_course`],
//!   [`Synchroniser::synchronize_chapter`], [`Synchroniser::synchronize_lesson`]
//! - Supporting types: [`SyncReport`], [`SyncEntry`], [`SyncOutcome`]

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::contract::{
    stub_defaults, Document, DocumentStore, CHAPTER_DOCTYPE, COURSE_DOCTYPE, DEFAULT_INSTRUCTOR,
    LESSON_DOCTYPE, SYSTEM_FIELDS,
};
use crate::error::{StoreError, SyncError};
use crate::project::Projectable;
use crate::workspace::{Chapter, Course, Lesson};

/// What happened to a single remote document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Remote content already matched; nothing was written.
    Unchanged,
    /// An existing document was overwritten.
    Saved,
    /// The document did not exist and was written.
    Created,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncEntry {
    pub doctype: String,
    pub name: String,
    pub outcome: SyncOutcome,
}

/// Every write decision taken during one push, in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub entries: Vec<SyncEntry>,
}

impl SyncReport {
    fn record(&mut self, doctype: &str, name: &str, outcome: SyncOutcome) {
        self.entries.push(SyncEntry {
            doctype: doctype.to_string(),
            name: name.to_string(),
            outcome,
        });
    }

    pub fn count(&self, outcome: SyncOutcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    /// Number of documents actually written.
    pub fn writes(&self) -> usize {
        self.entries.len() - self.count(SyncOutcome::Unchanged)
    }

    /// Latest outcome recorded for a document.
    pub fn outcome_of(&self, doctype: &str, name: &str) -> Option<SyncOutcome> {
        self.entries
            .iter()
            .rev()
            .find(|e| e.doctype == doctype && e.name == name)
            .map(|e| e.outcome)
    }

    pub fn extend(&mut self, other: SyncReport) {
        self.entries.extend(other.entries);
    }
}

/// Pushes workspace entities through a [`DocumentStore`].
pub struct Synchroniser<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> Synchroniser<'a, S>
where
    S: DocumentStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Push a course, then every chapter and lesson in it.
    pub async fn synchronize_course(&self, course: &Course) -> Result<SyncReport, SyncError> {
        info!(course = %course.name, "[SYNC] Starting course push");
        let mut report = SyncReport::default();
        self.push_course(course, &mut report).await?;
        info!(
            course = %course.name,
            writes = report.writes(),
            unchanged = report.count(SyncOutcome::Unchanged),
            "[SYNC] Course push complete"
        );
        Ok(report)
    }

    /// Push a chapter, then every lesson in it.
    pub async fn synchronize_chapter(&self, chapter: &Chapter) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        self.push_chapter(chapter, &mut report).await?;
        Ok(report)
    }

    /// Push a single lesson, creating course and chapter stubs if needed.
    pub async fn synchronize_lesson(&self, lesson: &Lesson) -> Result<SyncReport, SyncError> {
        let mut report = SyncReport::default();
        self.push_lesson(lesson, &mut report).await?;
        Ok(report)
    }

    async fn push_course(&self, course: &Course, report: &mut SyncReport) -> Result<(), SyncError> {
        self.ensure_exists(COURSE_DOCTYPE, &course.name, Document::new(), report)
            .await?;
        for chapter in &course.chapters {
            self.ensure_exists(
                CHAPTER_DOCTYPE,
                &chapter.docname(),
                fields([("course", &course.name)]),
                report,
            )
            .await?;
        }

        let mut doc = course.get_doc();
        let instructor = self.resolve_instructor(&course.instructor).await?;
        doc.insert("instructor".to_string(), Value::String(instructor));
        self.save_document(Course::DOCTYPE, &course.remote_name(), &doc, report)
            .await?;

        for chapter in &course.chapters {
            self.push_chapter(chapter, report).await?;
        }
        Ok(())
    }

    async fn push_chapter(
        &self,
        chapter: &Chapter,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        // Lesson files are parsed before anything is written for the chapter.
        let lessons = chapter.get_lessons()?;
        let docname = chapter.docname();

        self.ensure_exists(COURSE_DOCTYPE, &chapter.course.name, Document::new(), report)
            .await?;
        self.ensure_exists(
            CHAPTER_DOCTYPE,
            &docname,
            fields([("course", &chapter.course.name)]),
            report,
        )
        .await?;
        for lesson_name in chapter.lesson_docnames() {
            self.ensure_exists(
                LESSON_DOCTYPE,
                &lesson_name,
                fields([("title", &lesson_name), ("chapter", &docname)]),
                report,
            )
            .await?;
        }

        self.save_document(Chapter::DOCTYPE, &docname, &chapter.get_doc(), report)
            .await?;

        for lesson in &lessons {
            self.push_lesson(lesson, report).await?;
        }
        Ok(())
    }

    async fn push_lesson(&self, lesson: &Lesson, report: &mut SyncReport) -> Result<(), SyncError> {
        let chapter = &lesson.chapter;
        self.ensure_exists(COURSE_DOCTYPE, &chapter.course.name, Document::new(), report)
            .await?;
        self.ensure_exists(
            CHAPTER_DOCTYPE,
            &chapter.docname,
            fields([("course", &chapter.course.name)]),
            report,
        )
        .await?;
        self.save_document(Lesson::DOCTYPE, &lesson.remote_name(), &lesson.get_doc(), report)
            .await?;
        Ok(())
    }

    /// Create a placeholder document unless one named `name` already exists.
    ///
    /// `fields` override the doctype's placeholder defaults.
    pub async fn ensure_exists(
        &self,
        doctype: &str,
        name: &str,
        fields: Document,
        report: &mut SyncReport,
    ) -> Result<(), StoreError> {
        if self.store.get_document(doctype, name).await?.is_some() {
            debug!(doctype, name, "[SYNC] Document exists");
            return Ok(());
        }
        let mut stub = stub_defaults(doctype);
        stub.extend(fields);
        info!(doctype, name, "[SYNC] Creating stub document");
        self.write_if_changed(doctype, name, &stub, None, report)
            .await?;
        Ok(())
    }

    /// Fetch the remote document and save `doc` only if it differs.
    pub async fn save_document(
        &self,
        doctype: &str,
        name: &str,
        doc: &Document,
        report: &mut SyncReport,
    ) -> Result<SyncOutcome, StoreError> {
        let existing = self.store.get_document(doctype, name).await?;
        self.write_if_changed(doctype, name, doc, existing, report)
            .await
    }

    async fn write_if_changed(
        &self,
        doctype: &str,
        name: &str,
        doc: &Document,
        existing: Option<Document>,
        report: &mut SyncReport,
    ) -> Result<SyncOutcome, StoreError> {
        let outcome = match existing {
            Some(old) if is_unchanged(&old, doc) => {
                info!(doctype, name, "[SYNC] no changes found");
                report.record(doctype, name, SyncOutcome::Unchanged);
                return Ok(SyncOutcome::Unchanged);
            }
            Some(_) => SyncOutcome::Saved,
            None => SyncOutcome::Created,
        };

        info!(doctype, name, "[SYNC] saving...");
        if let Err(e) = self.store.save_document(doctype, name, doc).await {
            error!(doctype, name, error = %e, "[SYNC][ERROR] Save failed");
            return Err(e);
        }
        report.record(doctype, name, outcome);
        Ok(outcome)
    }

    /// Remote user id for a local username, or [`DEFAULT_INSTRUCTOR`] when
    /// no user matches.
    pub async fn resolve_instructor(&self, username: &str) -> Result<String, StoreError> {
        let users = self.store.list_users(username).await?;
        match users.into_iter().next() {
            Some(user) => {
                debug!(username, user = %user.name, "[SYNC] Resolved instructor");
                Ok(user.name)
            }
            None => {
                warn!(
                    username,
                    fallback = DEFAULT_INSTRUCTOR,
                    "[SYNC] No remote user for instructor, using fallback"
                );
                Ok(DEFAULT_INSTRUCTOR.to_string())
            }
        }
    }
}

fn fields<const N: usize>(pairs: [(&str, &String); N]) -> Document {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.clone())))
        .collect()
}

/// True when `existing`, seen through the keys of `desired` and with
/// system-managed fields removed from table rows, equals `desired`.
pub fn is_unchanged(existing: &Document, desired: &Document) -> bool {
    trim_tables(restrict(existing, desired.keys())) == *desired
}

/// The entries of `doc` whose key is in `keys`.
pub fn restrict<'k>(doc: &Document, keys: impl IntoIterator<Item = &'k String>) -> Document {
    keys.into_iter()
        .filter_map(|k| doc.get(k).map(|v| (k.clone(), v.clone())))
        .collect()
}

/// Remove [`SYSTEM_FIELDS`] from every row of every table field.
pub fn trim_tables(mut doc: Document) -> Document {
    for value in doc.values_mut() {
        if let Value::Array(rows) = value {
            for row in rows.iter_mut() {
                if let Value::Object(row) = row {
                    row.retain(|k, _| !SYSTEM_FIELDS.contains(&k.as_str()));
                }
            }
        }
    }
    doc
}
