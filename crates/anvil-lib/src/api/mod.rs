pub mod guard;
pub mod maven;
pub mod mojang;
pub mod transport;

pub use transport::{HttpTransport, Transport, TransportConfig};
