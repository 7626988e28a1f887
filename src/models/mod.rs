pub mod connection;
pub mod network;
mod transaction;

pub use connection::{ActiveConnection, ConnectionState, ConnectorKind};
pub use network::{NetworkDescriptor, NetworkRegistry};
pub use transaction::{Transaction, TransactionRequest, TransactionStatus};
