//! I/O layer: the protocol seam, the stream session built on it, and
//! capture-file replay.
//!
//! - [`protocol`]: [`DataStreamClient`](protocol::DataStreamClient) trait and query types
//! - [`hosts`]: redundant host list and connection string
//! - [`session`]: connect loop, channel setup, mode-aware queries
//! - [`bag`]: capture recording, playback and the simulated client

pub mod bag;
pub mod hosts;
pub mod protocol;
pub mod session;

pub use hosts::{DEFAULT_PORT, HostEndpoint, HostList};
pub use protocol::{ClientError, DataStreamClient, QueryStatus, Reading};
pub use session::{AcquisitionMode, ConnectionState, MarkerSample, SessionOptions, StreamSession};
