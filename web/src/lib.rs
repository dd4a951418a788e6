pub mod adapters;
pub mod backends;
pub mod configuration;
pub mod domain;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod startup;
pub mod utils;
