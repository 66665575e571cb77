// src/commands/mod.rs
pub mod generate;
pub mod templates;
pub mod version;
