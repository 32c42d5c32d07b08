//! CLI command implementations for refsieve.
//!
//! Each submodule implements one command:
//!
//! - [`align`] - Align reads against reference databases
//! - [`stats`] - Compute and finalize run statistics
//! - [`report`] - Write a TSV report of aligned reads

// Blanket clippy pedantic allows for command implementations.
#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::unnecessary_wraps,
    clippy::needless_pass_by_value,
    clippy::must_use_candidate,
    clippy::too_many_lines,
    clippy::struct_excessive_bools,
    clippy::uninlined_format_args
)]

pub mod align;
pub mod command;
pub mod common;
pub mod report;
pub mod stats;
