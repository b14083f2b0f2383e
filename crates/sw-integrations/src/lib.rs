//! Concrete collaborators for the cleanup engine: the qBittorrent Web API
//! and the Telegram Bot API.

pub mod qbittorrent;
pub mod telegram;
