pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo::feed_for;
pub use repo_types::Message;
pub use services::{post, MAX_TEXT_LEN};
