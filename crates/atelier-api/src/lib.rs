pub mod auth;
pub mod error;
pub mod friends;
pub mod members;
pub mod middleware;
pub mod projects;
pub mod reactions;
pub mod users;
