pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;

pub use repo_types::{NewUser, User};
pub use services::{authenticate, signup};
