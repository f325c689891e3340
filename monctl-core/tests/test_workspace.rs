use std::fs;
use std::path::{Path, PathBuf};

use monctl_core::project::Projectable;
use monctl_core::workspace::{CourseDefinition, Workspace};
use monctl_core::WorkspaceError;
use serde_json::json;
use tempfile::tempdir;

const COURSE_YML: &str = r#"
name: python-primer
title: Python Primer
suffix: pp
short_introduction: Introduction to Python
description: Practical introduction to Python
instructor: foobar
is_published: true
chapters:
  - name: introduction
    title: Introduction
    description: Introduction to Python
    lessons:
      - introduction/getting-started.md
      - introduction/hello-world.md
  - name: datatypes
    title: Datatypes
    description: Exploring Datatypes in Python
    lessons: []
"#;

const LESSON_TEXT: &str = "---
title: Getting Started
include_in_preview: false
---

Getting Started with Python
";

fn write_course(root: &Path, name: &str, yaml: &str) -> PathBuf {
    let path = root.join(name).join("course.yml");
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, yaml).unwrap();
    path
}

fn write_lesson(root: &Path, course: &str, relative: &str, text: &str) -> PathBuf {
    let path = root.join(course).join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, text).unwrap();
    path
}

#[test]
fn test_read_course() {
    let tmp = tempdir().unwrap();
    write_course(tmp.path(), "python-primer", COURSE_YML);

    let mut w = Workspace::new(tmp.path());
    let c = w.read_course("python-primer").expect("course should parse");

    let expected: CourseDefinition = serde_yaml::from_str(COURSE_YML).unwrap();
    assert_eq!(c.to_definition(), expected);
    assert_eq!(c.root, tmp.path().join("python-primer"));

    let doc = serde_json::Value::Object(c.get_doc());
    assert_eq!(
        doc,
        json!({
            "name": "python-primer",
            "title": "Python Primer",
            "short_introduction": "Introduction to Python",
            "description": "Practical introduction to Python",
            "instructor": "foobar",
            "is_published": 1,
            "chapters": [{"chapter": "introduction-pp"}, {"chapter": "datatypes-pp"}]
        })
    );
}

#[test]
fn test_chapter_doc() {
    let tmp = tempdir().unwrap();
    write_course(tmp.path(), "python-primer", COURSE_YML);

    let mut w = Workspace::new(tmp.path());
    let c = w.read_course("python-primer").unwrap();
    let chapter = c.get_chapter("introduction").unwrap();

    assert_eq!(
        serde_json::Value::Object(chapter.get_doc()),
        json!({
            "course": "python-primer",
            "name": "introduction-pp",
            "title": "Introduction",
            "description": "Introduction to Python",
            "lessons": [{"lesson": "getting-started-pp"}, {"lesson": "hello-world-pp"}]
        })
    );
    assert!(c.get_chapter("datatypes").unwrap().lessons.is_empty());
}

#[test]
fn test_read_lesson() {
    let tmp = tempdir().unwrap();
    write_course(tmp.path(), "python-primer", COURSE_YML);
    let path = write_lesson(
        tmp.path(),
        "python-primer",
        "introduction/getting-started.md",
        LESSON_TEXT,
    );

    let mut w = Workspace::new(tmp.path());
    let lesson = w.read_lesson(&path).expect("lesson should parse");

    let summary = lesson.summary();
    assert_eq!(summary.name, "getting-started");
    assert_eq!(summary.title, "Getting Started");
    assert!(!summary.include_in_preview);
    assert_eq!(summary.body, "Getting Started with Python");
    assert_eq!(lesson.chapter.name, "introduction");
    assert_eq!(lesson.chapter.course.name, "python-primer");

    assert_eq!(
        serde_json::Value::Object(lesson.get_doc()),
        json!({
            "chapter": "introduction-pp",
            "name": "getting-started-pp",
            "title": "Getting Started",
            "include_in_preview": 0,
            "body": "Getting Started with Python"
        })
    );
}

#[test]
fn lesson_without_preview_flag_defaults_to_false() {
    let tmp = tempdir().unwrap();
    write_course(tmp.path(), "python-primer", COURSE_YML);
    let path = write_lesson(
        tmp.path(),
        "python-primer",
        "introduction/hello-world.md",
        "---\ntitle: X\n---\n\nBody text\n",
    );

    let lesson = Workspace::new(tmp.path()).read_lesson(&path).unwrap();
    assert_eq!(lesson.title, "X");
    assert_eq!(lesson.body, "Body text");
    assert!(!lesson.include_in_preview);
}

#[test]
fn integer_flags_are_accepted() {
    let tmp = tempdir().unwrap();
    write_course(
        tmp.path(),
        "python-primer",
        &COURSE_YML.replace("is_published: true", "is_published: 1"),
    );
    write_course(
        tmp.path(),
        "draft-course",
        &COURSE_YML.replace("is_published: true", "is_published: 0"),
    );
    let path = write_lesson(
        tmp.path(),
        "python-primer",
        "introduction/hello-world.md",
        "---\ntitle: X\ninclude_in_preview: 1\n---\n\nBody text\n",
    );

    let mut w = Workspace::new(tmp.path());
    assert!(w.read_course("python-primer").unwrap().is_published);
    assert!(!w.read_course("draft-course").unwrap().is_published);
    assert!(w.read_lesson(&path).unwrap().include_in_preview);
}

#[test]
fn empty_published_flag_is_missing_field() {
    let tmp = tempdir().unwrap();
    write_course(
        tmp.path(),
        "python-primer",
        &COURSE_YML.replace("is_published: true", "is_published:"),
    );

    let err = Workspace::new(tmp.path())
        .read_course("python-primer")
        .unwrap_err();
    match err {
        WorkspaceError::MissingField { field, .. } => assert_eq!(field, "is_published"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn lesson_without_title_is_missing_field() {
    let tmp = tempdir().unwrap();
    write_course(tmp.path(), "python-primer", COURSE_YML);
    let path = write_lesson(
        tmp.path(),
        "python-primer",
        "introduction/hello-world.md",
        "---\ninclude_in_preview: true\n---\nBody\n",
    );

    let err = Workspace::new(tmp.path()).read_lesson(&path).unwrap_err();
    match err {
        WorkspaceError::MissingField { field, .. } => assert_eq!(field, "title"),
        other => panic!("expected MissingField, got {other:?}"),
    }
}

#[test]
fn unlisted_lesson_is_not_found() {
    let tmp = tempdir().unwrap();
    write_course(tmp.path(), "python-primer", COURSE_YML);
    let path = write_lesson(
        tmp.path(),
        "python-primer",
        "introduction/extra.md",
        LESSON_TEXT,
    );

    let err = Workspace::new(tmp.path()).read_lesson(&path).unwrap_err();
    assert!(
        matches!(err, WorkspaceError::LessonNotFound { ref lesson, .. } if lesson == "extra"),
        "got {err:?}"
    );
}

#[test]
fn lesson_in_undeclared_chapter_is_reported() {
    let tmp = tempdir().unwrap();
    write_course(tmp.path(), "python-primer", COURSE_YML);
    let path = write_lesson(tmp.path(), "python-primer", "loops/for.md", LESSON_TEXT);

    let err = Workspace::new(tmp.path()).read_lesson(&path).unwrap_err();
    assert!(matches!(err, WorkspaceError::ChapterNotFound { .. }), "got {err:?}");
}

#[test]
fn lesson_path_without_parents_is_invalid() {
    let tmp = tempdir().unwrap();
    let err = Workspace::new(tmp.path())
        .read_lesson(Path::new("lonely.md"))
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::InvalidLessonPath { .. }));
}

#[test]
fn missing_suffix_is_missing_field() {
    let tmp = tempdir().unwrap();
    let yaml = COURSE_YML.replace("suffix: pp\n", "");
    let path = write_course(tmp.path(), "python-primer", &yaml);

    let err = Workspace::new(tmp.path())
        .read_course("python-primer")
        .unwrap_err();
    match err {
        WorkspaceError::MissingField { field, path: at } => {
            assert_eq!(field, "suffix");
            assert_eq!(at, path);
        }
        other => panic!("expected MissingField, got {other:?}"),
    }
}

#[test]
fn empty_suffix_is_rejected() {
    let tmp = tempdir().unwrap();
    let yaml = COURSE_YML.replace("suffix: pp", "suffix: \"\"");
    write_course(tmp.path(), "python-primer", &yaml);

    let err = Workspace::new(tmp.path())
        .read_course("python-primer")
        .unwrap_err();
    assert!(matches!(err, WorkspaceError::MissingField { ref field, .. } if field == "suffix"));
}

#[test]
fn chapter_without_title_names_the_chapter_field() {
    let tmp = tempdir().unwrap();
    let yaml = COURSE_YML.replace("    title: Datatypes\n", "");
    write_course(tmp.path(), "python-primer", &yaml);

    let err = Workspace::new(tmp.path())
        .read_course("python-primer")
        .unwrap_err();
    assert!(
        matches!(err, WorkspaceError::MissingField { ref field, .. } if field == "chapters[1].title"),
        "got {err:?}"
    );
}

#[test]
fn chapter_without_lessons_key_has_no_lessons() {
    let tmp = tempdir().unwrap();
    let yaml = COURSE_YML.replace("    lessons: []\n", "");
    write_course(tmp.path(), "python-primer", &yaml);

    let course = Workspace::new(tmp.path())
        .read_course("python-primer")
        .unwrap();
    let chapter = course.get_chapter("datatypes").unwrap();
    assert!(chapter.lessons.is_empty());
    assert_eq!(chapter.get_doc()["lessons"], json!([]));
}

#[test]
fn scenario_suffix_pp_with_two_lessons() {
    let tmp = tempdir().unwrap();
    let yaml = r#"
suffix: pp
title: X
short_introduction: x
description: x
instructor: someone
is_published: false
chapters:
  - name: introduction
    title: Introduction
    description: Intro
    lessons: [a.md, b.md]
"#;
    write_course(tmp.path(), "x", yaml);

    let course = Workspace::new(tmp.path()).read_course("x").unwrap();
    assert_eq!(course.chapters[0].docname(), "introduction-pp");
    assert_eq!(
        course.chapters[0].get_doc()["lessons"],
        json!([{"lesson": "a-pp"}, {"lesson": "b-pp"}])
    );
    assert_eq!(course.get_doc()["is_published"], 0);
}

#[test]
fn docnames_are_stable_across_reads() {
    let tmp = tempdir().unwrap();
    write_course(tmp.path(), "python-primer", COURSE_YML);

    let first = Workspace::new(tmp.path())
        .read_course("python-primer")
        .unwrap();
    let second = Workspace::new(tmp.path())
        .read_course("python-primer")
        .unwrap();
    for (a, b) in first.chapters.iter().zip(&second.chapters) {
        assert_eq!(a.docname(), b.docname());
        assert_eq!(a.docname(), format!("{}-pp", a.name));
        assert_eq!(a.lesson_docnames(), b.lesson_docnames());
    }
    assert_eq!(first.get_doc(), second.get_doc());
}

#[test]
fn course_file_is_cached_per_workspace() {
    let tmp = tempdir().unwrap();
    let path = write_course(tmp.path(), "python-primer", COURSE_YML);

    let mut w = Workspace::new(tmp.path());
    assert_eq!(w.read_course("python-primer").unwrap().title, "Python Primer");

    fs::write(&path, COURSE_YML.replace("title: Python Primer", "title: Edited")).unwrap();
    assert_eq!(
        w.read_course("python-primer").unwrap().title,
        "Python Primer",
        "same workspace serves the cached parse"
    );

    let mut fresh = Workspace::new(tmp.path());
    assert_eq!(fresh.read_course("python-primer").unwrap().title, "Edited");
}

#[test]
fn list_courses_only_returns_dirs_with_course_file() {
    let tmp = tempdir().unwrap();
    write_course(tmp.path(), "python-primer", COURSE_YML);
    write_course(tmp.path(), "rust-primer", COURSE_YML);
    fs::create_dir_all(tmp.path().join("assets")).unwrap();
    fs::write(tmp.path().join("README.md"), "hello").unwrap();

    let mut names = Workspace::new(tmp.path()).list_courses().unwrap();
    names.sort();
    assert_eq!(names, vec!["python-primer", "rust-primer"]);
}

#[test]
fn list_courses_on_missing_root_is_io_error() {
    let tmp = tempdir().unwrap();
    let workspace = Workspace::new(tmp.path().join("nope"));
    let err = workspace.list_courses().unwrap_err();
    match err {
        WorkspaceError::Io { path, .. } => assert_eq!(path, workspace.root()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn chapter_get_lessons_reads_in_course_order() {
    let tmp = tempdir().unwrap();
    write_course(tmp.path(), "python-primer", COURSE_YML);
    write_lesson(
        tmp.path(),
        "python-primer",
        "introduction/getting-started.md",
        LESSON_TEXT,
    );
    write_lesson(
        tmp.path(),
        "python-primer",
        "introduction/hello-world.md",
        "---\ntitle: Hello World\ninclude_in_preview: true\n---\nprint('hi')\n",
    );

    let course = Workspace::new(tmp.path())
        .read_course("python-primer")
        .unwrap();
    let lessons = course.get_chapter("introduction").unwrap().get_lessons().unwrap();
    let names: Vec<_> = lessons.iter().map(|l| l.docname()).collect();
    assert_eq!(names, vec!["getting-started-pp", "hello-world-pp"]);
    assert!(lessons[1].include_in_preview);
    assert_eq!(lessons[1].get_doc()["include_in_preview"], 1);
}
