pub mod daemon;
pub mod handshake;
pub mod health;
pub mod init;
pub mod send;
pub mod session;
pub mod version;

pub use daemon::Daemon;
pub use handshake::Handshake;
pub use health::Health;
pub use init::Init;
pub use send::SendMessage;
pub use session::Session;
pub use version::Version;
