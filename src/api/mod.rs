pub mod client;
pub mod comments;
pub mod fitness;
pub mod groups;
pub mod models;
pub mod posts;
pub mod users;

pub use client::{ApiClient, ApiRequest};
