pub mod admin;
pub mod auth;
pub mod chat;
pub mod health;
pub mod messages;
pub mod search;
pub mod settings;
pub mod threads;
