pub mod app;
pub mod auth;
pub mod calendar;
pub mod chatbot;
pub mod config;
pub mod error;
pub mod state;
pub mod store;
pub mod tasks;
