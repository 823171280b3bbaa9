//! # VoxMentor Common Library
//!
//! Shared code for the VoxMentor coaching service and its clients:
//! - API request types (attempt submissions, registration profiles)
//! - The canonical score scale
//! - Bootstrap configuration loading
//! - Warm-up quiz classification
//! - The client-side wizard session and its progress store

pub mod api;
pub mod config;
pub mod error;
pub mod scores;
pub mod session;
pub mod warmup;

pub use error::{Error, Result};
pub use scores::{Improvement, ScoreCard};
