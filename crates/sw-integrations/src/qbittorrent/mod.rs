pub mod client;
pub mod types;

pub use client::{QbitClient, QbitError};
pub use types::TorrentInfo;
