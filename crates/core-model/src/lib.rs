//! Saved pattern documents and the persistence contract.
//!
//! A `PatternDocument` is the unit a user saves and reopens: a title, the
//! pattern text, and its test cases. The matcher core never persists anything
//! itself; hosts plug a `PatternRepository` in. `InMemoryPatternRepository`
//! is the reference implementation (and what tests and the CLI use).
//!
//! Documents also round-trip through TOML so fixtures can live in files:
//!
//! ```toml
//! title = "hex literals"
//! pattern = "0x[0-9a-f]+"
//!
//! [[test_case]]
//! title = "plain"
//! text = "0xff"
//! mode = "all"
//! ```

pub mod document;
pub mod store;

pub use document::{DocumentId, PatternDocument};
pub use store::{InMemoryPatternRepository, PatternRepository, StoreError};
