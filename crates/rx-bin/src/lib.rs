//! `regexlab`: check a saved pattern document from the command line.
//!
//! Batch mode loads the document, waits for every verdict and reports them.
//! Interactive mode keeps the session open and applies line commands
//! (see `commands::HELP`) from stdin.

pub mod commands;
pub mod repl;
pub mod report;
pub mod workspace;

pub use commands::{Command, CommandError, parse_command};
pub use repl::run_interactive;
pub use workspace::{Step, Workspace};
