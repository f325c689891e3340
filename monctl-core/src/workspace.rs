//! Reading courses, chapters and lessons from a workspace directory.
//!
//! Layout on disk:
//!
//! ```text
//! <root>/<course>/course.yml
//! <root>/<course>/<chapter>/<lesson>.md
//! ```
//!
//! A [`Workspace`] owns a read-through cache of parsed `course.yml` files,
//! keyed by path. The cache lives as long as the workspace; create a new
//! workspace to observe edits made on disk since the first read.
//!
//! Entities are plain values. A [`Course`] owns its [`Chapter`]s; chapters and
//! lessons point back to their parents through lightweight handles
//! ([`CourseRef`], [`ChapterRef`]) that carry only what identity and name
//! derivation need.
//!
//! Boolean flags (`is_published`, `include_in_preview`) accept `true`/`false`
//! as well as integers, where any non-zero value is true.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use crate::error::{io_err, missing, WorkspaceError};
use crate::frontmatter;
use crate::project::docname;

pub const COURSE_FILE: &str = "course.yml";

/// course.yml as written by authors. Every field is checked by [`Workspace::read_course`].
#[derive(Debug, Clone, Default, Deserialize)]
struct RawCourse {
    suffix: Option<String>,
    title: Option<String>,
    short_introduction: Option<String>,
    description: Option<String>,
    instructor: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    is_published: Option<bool>,
    chapters: Option<Vec<RawChapter>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RawChapter {
    name: Option<String>,
    title: Option<String>,
    description: Option<String>,
    lessons: Option<Vec<PathBuf>>,
}

/// Front matter of a lesson file.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawLesson {
    title: Option<String>,
    #[serde(default, deserialize_with = "lenient_flag")]
    include_in_preview: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Flag {
    Bool(bool),
    Int(i64),
}

fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Flag>::deserialize(deserializer)?.map(|flag| match flag {
        Flag::Bool(value) => value,
        Flag::Int(value) => value != 0,
    }))
}

/// A directory of courses plus the parse cache for their definition files.
#[derive(Debug)]
pub struct Workspace {
    root: PathBuf,
    cache: HashMap<PathBuf, RawCourse>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Names of the subdirectories of the root that contain a `course.yml`.
    ///
    /// Order follows directory iteration and is not sorted.
    pub fn list_courses(&self) -> Result<Vec<String>, WorkspaceError> {
        let entries = fs::read_dir(&self.root).map_err(|e| io_err(&self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| io_err(&self.root, e))?;
            let path = entry.path();
            if path.join(COURSE_FILE).is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            } else {
                debug!(path = %path.display(), "Skipping entry without course.yml");
            }
        }
        info!(root = %self.root.display(), count = names.len(), "Listed courses");
        Ok(names)
    }

    /// Read `<root>/<name>/course.yml` into a [`Course`] with all chapters.
    pub fn read_course(&mut self, name: &str) -> Result<Course, WorkspaceError> {
        let path = self.root.join(name).join(COURSE_FILE);
        let raw = self.read_course_file(&path)?;

        let course_root = self.root.join(name);
        let suffix = required(raw.suffix, "suffix", &path)?;
        if suffix.is_empty() {
            return Err(missing("suffix", &path));
        }
        let course_ref = CourseRef {
            name: name.to_string(),
            suffix,
            root: course_root.clone(),
        };

        let chapters = required(raw.chapters, "chapters", &path)?
            .into_iter()
            .enumerate()
            .map(|(index, chapter)| parse_chapter(&course_ref, chapter, index, &path))
            .collect::<Result<Vec<_>, _>>()?;

        let course = Course {
            root: course_root,
            name: name.to_string(),
            suffix: course_ref.suffix.clone(),
            title: required(raw.title, "title", &path)?,
            short_introduction: required(raw.short_introduction, "short_introduction", &path)?,
            description: required(raw.description, "description", &path)?,
            instructor: required(raw.instructor, "instructor", &path)?,
            is_published: required(raw.is_published, "is_published", &path)?,
            chapters,
        };
        debug!(
            course = %course.name,
            suffix = %course.suffix,
            chapters = course.chapters.len(),
            "Read course"
        );
        Ok(course)
    }

    /// Read a lesson file, resolving its chapter and course from the two
    /// directories above it.
    pub fn read_lesson(&mut self, path: &Path) -> Result<Lesson, WorkspaceError> {
        let invalid = || WorkspaceError::InvalidLessonPath {
            path: path.to_path_buf(),
        };
        let chapter_dir = path.parent().ok_or_else(invalid)?;
        let chapter_name = dir_name(chapter_dir).ok_or_else(invalid)?;
        let course_name = chapter_dir
            .parent()
            .and_then(dir_name)
            .ok_or_else(invalid)?;
        let stem = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(invalid)?;

        debug!(
            path = %path.display(),
            course = %course_name,
            chapter = %chapter_name,
            "Resolving lesson"
        );
        let course = self.read_course(&course_name)?;
        course.get_chapter(&chapter_name)?.get_lesson(stem)
    }

    fn read_course_file(&mut self, path: &Path) -> Result<RawCourse, WorkspaceError> {
        if let Some(raw) = self.cache.get(path) {
            debug!(path = %path.display(), "Course file served from cache");
            return Ok(raw.clone());
        }

        let content = fs::read_to_string(path).map_err(|e| io_err(path, e))?;
        let raw: RawCourse = if content.trim().is_empty() {
            RawCourse::default()
        } else {
            serde_yaml::from_str(&content).map_err(|source| WorkspaceError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };
        info!(path = %path.display(), "Parsed course file");
        self.cache.insert(path.to_path_buf(), raw.clone());
        Ok(raw)
    }
}

fn required<T>(value: Option<T>, field: &str, path: &Path) -> Result<T, WorkspaceError> {
    value.ok_or_else(|| missing(field, path))
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

fn parse_chapter(
    course: &CourseRef,
    raw: RawChapter,
    index: usize,
    path: &Path,
) -> Result<Chapter, WorkspaceError> {
    let field = |name: &str| format!("chapters[{index}].{name}");
    Ok(Chapter {
        name: raw.name.ok_or_else(|| missing(field("name"), path))?,
        title: raw.title.ok_or_else(|| missing(field("title"), path))?,
        description: raw
            .description
            .ok_or_else(|| missing(field("description"), path))?,
        course: course.clone(),
        lessons: raw.lessons.unwrap_or_default(),
    })
}

/// File stem used as the local lesson name.
pub fn lesson_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A course as represented in the workspace.
#[derive(Debug, Clone, PartialEq)]
pub struct Course {
    /// Directory holding course.yml.
    pub root: PathBuf,
    pub name: String,
    pub suffix: String,
    pub title: String,
    pub short_introduction: String,
    pub description: String,
    /// Local username; resolved to a remote user when pushed.
    pub instructor: String,
    pub is_published: bool,
    pub chapters: Vec<Chapter>,
}

impl Course {
    pub fn get_chapter(&self, name: &str) -> Result<&Chapter, WorkspaceError> {
        self.chapters
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| WorkspaceError::ChapterNotFound {
                course: self.name.clone(),
                chapter: name.to_string(),
            })
    }

    /// The course in the shape of its course.yml.
    pub fn to_definition(&self) -> CourseDefinition {
        CourseDefinition {
            name: self.name.clone(),
            suffix: self.suffix.clone(),
            title: self.title.clone(),
            short_introduction: self.short_introduction.clone(),
            description: self.description.clone(),
            instructor: self.instructor.clone(),
            is_published: self.is_published,
            chapters: self
                .chapters
                .iter()
                .map(|c| ChapterDefinition {
                    name: c.name.clone(),
                    title: c.title.clone(),
                    description: c.description.clone(),
                    lessons: c.lessons.clone(),
                })
                .collect(),
        }
    }
}

/// Identity of a course, held by its chapters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CourseRef {
    pub name: String,
    pub suffix: String,
    pub root: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chapter {
    /// Local, unsuffixed name. Also the chapter's directory name.
    pub name: String,
    pub title: String,
    pub description: String,
    pub course: CourseRef,
    /// Lesson files relative to the course root, in course order.
    pub lessons: Vec<PathBuf>,
}

impl Chapter {
    pub fn docname(&self) -> String {
        docname(&self.name, &self.course.suffix)
    }

    pub fn chapter_ref(&self) -> ChapterRef {
        ChapterRef {
            name: self.name.clone(),
            docname: self.docname(),
            course: self.course.clone(),
        }
    }

    /// Remote names of the listed lessons, in order.
    pub fn lesson_docnames(&self) -> Vec<String> {
        self.lessons
            .iter()
            .map(|p| docname(&lesson_stem(p), &self.course.suffix))
            .collect()
    }

    /// Read every listed lesson file.
    pub fn get_lessons(&self) -> Result<Vec<Lesson>, WorkspaceError> {
        let chapter = self.chapter_ref();
        self.lessons
            .iter()
            .map(|p| Lesson::from_file(chapter.clone(), self.course.root.join(p)))
            .collect()
    }

    /// Read the listed lesson whose file stem is `name`.
    pub fn get_lesson(&self, name: &str) -> Result<Lesson, WorkspaceError> {
        let relative = self
            .lessons
            .iter()
            .find(|p| lesson_stem(p) == name)
            .ok_or_else(|| WorkspaceError::LessonNotFound {
                chapter: self.name.clone(),
                lesson: name.to_string(),
            })?;
        Lesson::from_file(self.chapter_ref(), self.course.root.join(relative))
    }
}

/// Identity of a chapter, held by its lessons.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChapterRef {
    pub name: String,
    pub docname: String,
    pub course: CourseRef,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Lesson {
    pub chapter: ChapterRef,
    pub path: PathBuf,
    pub name: String,
    pub title: String,
    /// Markdown with the front matter removed, trimmed.
    pub body: String,
    pub include_in_preview: bool,
}

impl Lesson {
    pub fn from_file(chapter: ChapterRef, path: PathBuf) -> Result<Self, WorkspaceError> {
        let text = fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
        let (meta, body): (RawLesson, String) = frontmatter::parse(&text, &path)?;
        let title = meta.title.ok_or_else(|| missing("title", &path))?;
        Ok(Lesson {
            chapter,
            name: lesson_stem(&path),
            title,
            body,
            include_in_preview: meta.include_in_preview.unwrap_or(false),
            path,
        })
    }

    pub fn docname(&self) -> String {
        docname(&self.name, &self.chapter.course.suffix)
    }

    /// Local view of the lesson, without chapter linkage.
    pub fn summary(&self) -> LessonSummary {
        LessonSummary {
            name: self.name.clone(),
            title: self.title.clone(),
            body: self.body.clone(),
            include_in_preview: self.include_in_preview,
        }
    }
}

/// Serializable course.yml shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseDefinition {
    pub name: String,
    pub suffix: String,
    pub title: String,
    pub short_introduction: String,
    pub description: String,
    pub instructor: String,
    pub is_published: bool,
    pub chapters: Vec<ChapterDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChapterDefinition {
    pub name: String,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub lessons: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonSummary {
    pub name: String,
    pub title: String,
    pub body: String,
    pub include_in_preview: bool,
}
