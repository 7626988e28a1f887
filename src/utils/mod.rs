mod convert;
mod format;
mod hash;

pub use convert::normalize_address;
pub use convert::parse_chain_id;
pub use format::format_address;
pub use hash::generate_tx_hash;
