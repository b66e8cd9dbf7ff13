pub mod action;
mod app;
pub mod clients;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod manifest;

// Re-export App and Config from modules
pub use app::App;
pub use app::branch_name;
pub use config::Config;

// Disable colors for all tests to get clean output
#[cfg(test)]
#[ctor::ctor]
fn init_tests() {
    colored::control::set_override(false);
}
