pub mod config;
pub mod db;
pub mod models;
pub mod responses;
pub mod routes;
pub mod session;
pub mod state;
pub mod utils;

pub use state::AppState;
