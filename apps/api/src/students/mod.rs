pub mod completion;
pub mod editor;
pub mod handlers;
pub mod models;
pub mod service;
