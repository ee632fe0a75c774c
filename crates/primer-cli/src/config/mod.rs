pub mod builder;
pub mod file;
pub mod models;
