pub mod db;
mod files;
pub mod models;
mod queue;
mod results;
mod tables;
mod users;

pub use db::{Database, DatabaseError};
pub use files::ReplacedFile;
pub use tables::*;
pub use users::SignUpOutcome;
