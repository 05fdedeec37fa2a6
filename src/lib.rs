pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
