#![doc = "monctl-core: core logic library for monctl."]

//! This crate reads course workspaces (course.yml plus Markdown lessons with
//! front matter) and synchronises them to an LMS site through the
//! [`contract::DocumentStore`] trait. Transport and CLI concerns live in the
//! `monctl` crate.
//!
//! # Usage
//! Read entities with [`workspace::Workspace`], then push them with
//! [`synchronise::Synchroniser`].

pub mod config;
pub mod contract;
pub mod error;
pub mod frontmatter;
pub mod project;
pub mod synchronise;
pub mod workspace;

pub use error::{StoreError, SyncError, WorkspaceError};
