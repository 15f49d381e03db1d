// Domain layer - Value types and display state
pub mod history;
pub mod simulator;
pub mod speed;
