pub mod constants;
pub mod engine;
pub mod feedback;
pub mod food;
pub mod obstacles;
pub mod session;
pub mod types;
