pub mod auth;
pub mod configuration;
pub mod database;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod startup;
pub mod telemetry;
pub mod validators;
