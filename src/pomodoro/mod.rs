pub mod engine;
pub mod mode;
pub mod service;
pub mod ticker;
