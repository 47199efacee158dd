pub mod queries;
pub mod runner;

pub use runner::{is_repository, GitRunner, SystemGit};
