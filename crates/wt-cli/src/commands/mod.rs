//! CLI subcommand implementations.

pub mod categories;
pub mod classify;
pub mod ingest;
pub mod overrides;
pub mod pattern;
pub mod record;
pub mod retention;
pub mod stats;
pub mod status;
pub mod util;
