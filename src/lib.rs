//! Domain core of a micro-posting social network: users follow users, post
//! short messages and like each other's messages. Persistence is SQLite via
//! sqlx; uniqueness and referential integrity are enforced by the storage
//! constraints. The HTTP view layer is a separate consumer of this crate.

pub mod config;
pub mod db;
pub mod error;
pub mod follows;
pub mod likes;
pub mod messages;
pub mod users;

pub use error::{Error, Result};
