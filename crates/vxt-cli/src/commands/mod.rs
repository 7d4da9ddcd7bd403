pub mod config;
pub mod doctor;
pub mod fetch;
pub mod shell;
