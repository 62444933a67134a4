//! Simulated shared-bandwidth links for async byte streams.
//!
//! This crate lets test code observe throughput-limited behavior without a
//! real network. A [`Link`] is a single serialization point running at a
//! fixed [`Rate`]: any number of [`LinkReader`]s and [`LinkWriter`]s share
//! it, and every "I transferred N bytes" notification is delayed by the
//! time that transfer would take on the wire. No payload ever crosses the
//! link itself; the wrapped source or sink moves the actual bytes.
//!
//! Reads and writes are clamped to the link's segment size (an MTU-like
//! cap, 1500 bytes by default) so a single large transfer cannot hold the
//! link for a disproportionate stretch.
//!
//! # Example
//!
//! ```
//! use linkio::{Link, Rate};
//! use tokio::io::AsyncReadExt;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // A 30 Kbps link (kilo = 1024): 1000 bytes take ~260 ms.
//! let link = Link::new(Rate::kbps(30))?;
//!
//! let payload = vec![0u8; 1000];
//! let mut reader = link.reader(&payload[..]);
//!
//! let mut out = Vec::new();
//! reader.read_to_end(&mut out).await?;
//! assert_eq!(out.len(), 1000);
//! # Ok(())
//! # }
//! ```

mod link;
mod rate;
mod reader;
mod writer;

pub use link::{
    Link, LinkError, LinkOptions, LinkStats, DEFAULT_CAPACITY, DEFAULT_SEGMENT_SIZE,
};
pub use rate::Rate;
pub use reader::LinkReader;
pub use writer::LinkWriter;
