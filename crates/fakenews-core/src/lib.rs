//! Inspection commands for fake-news corpora and preprocessed bundles.

pub mod config;
pub mod pipeline;
pub mod results;
