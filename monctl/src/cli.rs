//! This module implements the CLI interface for monctl: command parsing,
//! argument validation and the async entrypoint shared by `main` and the
//! integration tests.
//!
//! All business logic (workspace parsing, projection, synchronisation) lives in
//! the [`monctl-core`] crate. This module is strictly CLI glue.
//!
//! ## Features
//! - Entry struct [`Cli`] defines the global `--root` option and the subcommands.
//! - `push` pushes one or all courses, `push-lesson` pushes individual lesson files,
//!   `list` prints the courses found in the workspace.
//! - Pushes run one after another and stop at the first failure.
//!
//! [`monctl-core`]: ../../monctl-core/
use crate::load_config::load_config;
use crate::remote::SiteClient;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use monctl_core::contract::DocumentStore;
use monctl_core::synchronise::{SyncOutcome, SyncReport, Synchroniser};
use monctl_core::workspace::Workspace;
use std::path::PathBuf;

/// CLI for monctl: manage courses on Mon School.
#[derive(Parser)]
#[clap(
    name = "monctl",
    version,
    about = "The CLI tool to manage courses on Mon School"
)]
pub struct Cli {
    /// Directory holding one sub-directory per course
    #[clap(long, global = true, env = "MONCTL_ROOT", default_value = "courses")]
    pub root: PathBuf,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Push the courses to Mon School. If no course is specified, all courses are pushed.
    Push {
        /// Course to push
        #[clap(long = "course")]
        course: Option<String>,
    },
    /// Push one or more lessons to Mon School
    PushLesson {
        /// Lesson files, laid out as <root>/<course>/<chapter>/<lesson>.md
        #[clap(required = true, num_args = 1.., value_parser = existing_path)]
        filenames: Vec<PathBuf>,
    },
    /// List the courses in the workspace
    List,
}

fn existing_path(raw: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(raw);
    if path.exists() {
        Ok(path)
    } else {
        Err(format!("path '{raw}' does not exist"))
    }
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    let mut workspace = Workspace::new(&cli.root);
    match cli.command {
        Commands::List => {
            let names = workspace.list_courses().with_context(|| {
                format!("Failed to list courses in {}", workspace.root().display())
            })?;
            for name in names {
                println!("{name}");
            }
            Ok(())
        }
        Commands::Push { course } => {
            let client = connect()?;
            tracing::info!(command = "push", course = ?course, "Starting push");
            let report = push_courses(&mut workspace, &client, course.as_deref()).await?;
            log_summary("push", &report);
            Ok(())
        }
        Commands::PushLesson { filenames } => {
            let client = connect()?;
            tracing::info!(command = "push-lesson", count = filenames.len(), "Starting push");
            let report = push_lessons(&mut workspace, &client, &filenames).await?;
            log_summary("push-lesson", &report);
            Ok(())
        }
    }
}

fn connect() -> Result<SiteClient> {
    let config = load_config()?;
    SiteClient::new(&config).context("Failed to construct site client")
}

/// Push `course`, or every course in the workspace when `None`.
pub async fn push_courses<S>(
    workspace: &mut Workspace,
    store: &S,
    course: Option<&str>,
) -> Result<SyncReport>
where
    S: DocumentStore + ?Sized,
{
    let names = match course {
        Some(name) => vec![name.to_string()],
        None => workspace.list_courses()?,
    };

    let synchroniser = Synchroniser::new(store);
    let mut report = SyncReport::default();
    for name in names {
        let course = workspace
            .read_course(&name)
            .with_context(|| format!("Failed to read course {name}"))?;
        let pushed = synchroniser
            .synchronize_course(&course)
            .await
            .with_context(|| format!("Failed to push course {name}"))?;
        report.extend(pushed);
    }
    Ok(report)
}

/// Push each lesson file on its own, in the given order.
pub async fn push_lessons<S>(
    workspace: &mut Workspace,
    store: &S,
    filenames: &[PathBuf],
) -> Result<SyncReport>
where
    S: DocumentStore + ?Sized,
{
    let synchroniser = Synchroniser::new(store);
    let mut report = SyncReport::default();
    for path in filenames {
        let lesson = workspace
            .read_lesson(path)
            .with_context(|| format!("Failed to read lesson {}", path.display()))?;
        let pushed = synchroniser
            .synchronize_lesson(&lesson)
            .await
            .with_context(|| format!("Failed to push lesson {}", path.display()))?;
        report.extend(pushed);
    }
    Ok(report)
}

fn log_summary(command: &str, report: &SyncReport) {
    tracing::info!(
        command,
        created = report.count(SyncOutcome::Created),
        saved = report.count(SyncOutcome::Saved),
        unchanged = report.count(SyncOutcome::Unchanged),
        "Push complete"
    );
}
