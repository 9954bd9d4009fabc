mod auth;
mod files;
mod health;

pub use auth::{confirm_sign_up, sign_in, sign_out, sign_up};
pub use files::{get_file, get_result, list_files, upload_file};
pub use health::health;
