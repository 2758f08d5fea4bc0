//! Client side game board state for the hex tile board game

pub mod board;
pub mod config;
pub mod error;
pub mod server;

pub use board::events::BoardStatusHandler;
pub use board::state::{Board, Segment, Tile, TileCategory};
pub use board::tile::{SegmentId, SegmentSize};
pub use board::{BoardManager, BoardRequests, LoadReport};
pub use config::BoardConfig;
pub use error::{BoardError, Result};

/// Install the logger for the current platform. Safe to call more than once.
pub fn init_logging() {
    #[cfg(not(target_arch = "wasm32"))]
    {
        let env = env_logger::Env::default().default_filter_or("info");
        let _ = env_logger::Builder::from_env(env).try_init();
    }

    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
    }
}
