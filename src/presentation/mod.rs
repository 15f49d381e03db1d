// Presentation layer - Console rendering and operator input
pub mod app_state;
pub mod commands;
pub mod console;
pub mod handlers;
pub mod view;
