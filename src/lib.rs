pub mod config;
pub mod error;
pub mod models;
pub mod utils;
pub mod wallet;

pub use error::{WalletError, WalletResult};
pub use wallet::{WalletConnectionManager, WalletProvider, SimulatedProvider};
