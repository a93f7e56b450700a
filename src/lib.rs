pub mod ai_provider;
pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod scanner;
