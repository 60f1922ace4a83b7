// Database module
// SQLite record store for the chunks of the active document

pub mod sqlite;

pub use sqlite::*;
