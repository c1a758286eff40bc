pub mod args;
pub mod op;
pub mod ops;

pub use ops::{Daemon, Handshake, Health, Init, SendMessage, Session, Version};
