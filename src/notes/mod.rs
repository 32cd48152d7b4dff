pub mod frontmatter;
pub mod materialize;
pub mod store;
pub mod todo;
pub mod types;

/// File extension (no dot) for note files, both in the archive and staged
/// outbound.
pub const NOTE_EXTENSION: &str = "md";
