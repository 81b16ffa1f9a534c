pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod mailer;
pub mod posts;
pub mod questions;
pub mod state;
pub mod store;
