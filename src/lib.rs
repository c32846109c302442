// Library exports for vetsoc
// The binary and the integration tests both build on these modules

pub mod api;
pub mod auth;
pub mod cache;
pub mod commands;
pub mod config;
pub mod db;
pub mod error;
pub mod nav;
pub mod notice;
pub mod quotes;
pub mod state;
pub mod views;
