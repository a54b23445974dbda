//! FlashGuard Control library - exposes modules for integration tests

pub mod cli;
pub mod commands;
pub mod errors;
pub mod logging;
pub mod output;
pub mod resolver;
