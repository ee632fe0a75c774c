pub mod library;
pub mod parser;
pub mod progress;
