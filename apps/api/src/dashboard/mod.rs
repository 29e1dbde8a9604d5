pub mod handlers;
pub mod settings;
pub mod shell;
