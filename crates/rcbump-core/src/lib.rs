//! Core library for rcbump.
//!
//! This crate provides the foundational types and functionality used by the
//! `rcbump` CLI and any downstream consumers.
//!
//! # Modules
//!
//! - [`align`] - Release-candidate alignment (plan, decide, commit, push)
//! - [`classify`] - Conventional-commit classification
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//! - [`git`] - Git operations for the alignment workflow
//! - [`outputs`] - Step-output publishing for CI pipelines
//! - [`promote`] - Stable version promotion
//! - [`version`] - Release-candidate version parsing and arithmetic
//!
//! # Quick Start
//!
//! ```no_run
//! use camino::Utf8PathBuf;
//! use rcbump_core::ConfigLoader;
//! use rcbump_core::align::{AlignPlan, plan_align};
//!
//! let repo = Utf8PathBuf::from(".");
//! let config = ConfigLoader::new()
//!     .with_project_search(&repo)
//!     .load()
//!     .expect("failed to load configuration");
//!
//! match plan_align(&repo, &config).expect("planning failed") {
//!     AlignPlan::Ready(ready) => println!("next: {}", ready.next),
//!     AlignPlan::Skip(reason) => println!("skipped: {reason}"),
//! }
//! ```
#![deny(unsafe_code)]

pub mod align;

pub mod classify;

pub mod config;

pub mod error;

pub mod git;

pub mod outputs;

pub mod promote;

pub mod version;

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult};

pub use version::RcVersion;

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;
