// src/models/mod.rs
pub mod donation;
pub mod messages;
pub mod user;

pub use donation::*;
pub use messages::*;
pub use user::*;
