//! Projection of workspace entities into the flat documents the LMS stores.
//!
//! Chapters and lessons are stored under a suffixed name so that courses
//! sharing chapter or lesson names do not collide remotely. Courses keep
//! their local name.

use serde_json::{json, Value};

use crate::contract::{Document, CHAPTER_DOCTYPE, COURSE_DOCTYPE, LESSON_DOCTYPE};
use crate::workspace::{Chapter, Course, Lesson};

/// Remote name for a chapter or lesson of a course with `suffix`.
pub fn docname(local_name: &str, suffix: &str) -> String {
    format!("{local_name}-{suffix}")
}

/// An entity that maps onto one remote document.
pub trait Projectable {
    const DOCTYPE: &'static str;

    /// Primary key of the document on the remote side.
    fn remote_name(&self) -> String;

    /// The desired document content. Pure: no I/O, same output on every call.
    fn get_doc(&self) -> Document;
}

impl Projectable for Course {
    const DOCTYPE: &'static str = COURSE_DOCTYPE;

    fn remote_name(&self) -> String {
        self.name.clone()
    }

    fn get_doc(&self) -> Document {
        document([
            ("name", json!(self.name)),
            ("title", json!(self.title)),
            ("short_introduction", json!(self.short_introduction)),
            ("description", json!(self.description)),
            ("instructor", json!(self.instructor)),
            ("is_published", flag(self.is_published)),
            (
                "chapters",
                links("chapter", self.chapters.iter().map(Chapter::docname)),
            ),
        ])
    }
}

impl Projectable for Chapter {
    const DOCTYPE: &'static str = CHAPTER_DOCTYPE;

    fn remote_name(&self) -> String {
        self.docname()
    }

    fn get_doc(&self) -> Document {
        document([
            ("course", json!(self.course.name)),
            ("name", json!(self.docname())),
            ("title", json!(self.title)),
            ("description", json!(self.description)),
            ("lessons", links("lesson", self.lesson_docnames())),
        ])
    }
}

impl Projectable for Lesson {
    const DOCTYPE: &'static str = LESSON_DOCTYPE;

    fn remote_name(&self) -> String {
        self.docname()
    }

    fn get_doc(&self) -> Document {
        document([
            ("chapter", json!(self.chapter.docname)),
            ("name", json!(self.docname())),
            ("title", json!(self.title)),
            ("body", json!(self.body)),
            ("include_in_preview", flag(self.include_in_preview)),
        ])
    }
}

fn document<const N: usize>(fields: [(&str, Value); N]) -> Document {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}

// The remote schema stores checkboxes as 0/1.
fn flag(value: bool) -> Value {
    json!(u8::from(value))
}

/// Child table rows of the form `[{key: name}, ...]`.
fn links(key: &str, names: impl IntoIterator<Item = String>) -> Value {
    Value::Array(names.into_iter().map(|name| json!({ key: name })).collect())
}
