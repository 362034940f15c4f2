pub mod diff;
pub mod hash;
pub mod server;
pub mod version;
