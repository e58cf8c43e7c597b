pub mod command;
pub mod display;
pub mod errors;
pub mod parse;
pub mod runner;
pub mod sample;
pub mod settings;
pub mod stats;
pub mod types;
