pub mod auth;
pub mod authz;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod invites;
pub mod middleware;
pub mod plans;
pub mod services;
pub mod telemetry;
pub mod types;
pub mod video;

#[cfg(test)]
pub mod testing;
