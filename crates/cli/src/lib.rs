#![deny(rustdoc::broken_intra_doc_links)]

//! # Overview
//!
//! Command-line parsing ([`args::Cli`]), `-@file` response-file expansion
//! ([`config_file`]), and the glue that turns a parsed command line into a
//! running [`hslink_engine::Engine`] ([`run`]).

pub mod args;
pub mod config_file;
pub mod run;

pub use args::Cli;
