pub mod client;
pub mod config;
pub mod errors;
pub mod metrics;
pub mod transport;

pub use client::Client;
pub use config::ClientConfig;
pub use errors::{ClientError, ErrorKind};
pub use metrics::{DataPoint, Metric, QuerySeries};
pub use transport::{HttpTransport, JsonTransport};
