pub mod config;
pub mod duration;
pub mod hold;
pub mod patterns;
pub mod session;
pub mod stats;
