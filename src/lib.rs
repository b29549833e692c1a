pub mod database;
pub mod error;
pub mod extract;
pub mod helpers;
pub mod logging;
pub mod models;
pub mod write;
