//! Two readers pulling data through one simulated 64 Kbps link.
//!
//! Run with `cargo run --example shared_link`.

use std::time::Instant;

use linkio::{Link, Rate};
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let link = Link::new(Rate::kbps(64))?;

    let payload = vec![0u8; 8 * 1024];
    let mut first = link.reader(&payload[..]);
    let mut second = link.reader(&payload[..]);

    let start = Instant::now();
    let (a, b) = tokio::join!(
        async {
            let mut out = Vec::new();
            first.read_to_end(&mut out).await.map(|_| out.len())
        },
        async {
            let mut out = Vec::new();
            second.read_to_end(&mut out).await.map(|_| out.len())
        },
    );
    let elapsed = start.elapsed();

    let total = a? + b?;
    let stats = link.stats();

    println!("moved {} bytes over a {} link in {:?}", total, link.speed(), elapsed);
    println!(
        "{} transfer requests, {:?} of simulated wire time ({:.0}% utilization)",
        stats.requests(),
        stats.busy_time(),
        100.0 * stats.busy_time().as_secs_f64() / elapsed.as_secs_f64(),
    );

    Ok(())
}
