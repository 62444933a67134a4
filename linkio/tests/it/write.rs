use std::{io, time::Duration};

use linkio::{Link, Rate};
use tokio::{io::AsyncWriteExt, time::Instant};

use crate::helpers::{FailingSink, ShortSink};

/// A 30 Kbps link and a 1000-byte buffer: a single segment write reports
/// all 1000 bytes and takes at least the wire time.
#[tokio::test(start_paused = true)]
async fn single_writer_paces_to_wire_time() {
    let _ = tracing_subscriber::fmt::try_init();

    let link = Link::new(Rate::kbps(30)).unwrap();
    let mut writer = link.writer(Vec::new());

    let start = Instant::now();
    let n = writer.write(&[0u8; 1000]).await.unwrap();

    assert_eq!(n, 1000);
    assert_eq!(writer.get_ref().len(), 1000);
    assert!(start.elapsed() >= Rate::kbps(30).delay_for(1000));
}

#[tokio::test(start_paused = true)]
async fn large_writes_are_segmented() {
    let link = Link::new(Rate::mbps(8)).unwrap();
    let mut writer = link.writer(Vec::new());

    let start = Instant::now();
    writer.write_all(&[7u8; 4000]).await.unwrap();

    // 1500 + 1500 + 1000.
    assert_eq!(writer.get_ref().len(), 4000);
    assert_eq!(link.stats().requests(), 3);
    assert!(start.elapsed() >= Rate::mbps(8).delay_for(4000));
}

#[tokio::test(start_paused = true)]
async fn short_writes_are_reported_as_is() {
    let link = Link::new(Rate::mbps(8)).unwrap();
    let mut writer = link.writer(ShortSink::new(10));

    let n = writer.write(&[1u8; 100]).await.unwrap();

    // The sink accepted ten bytes; the caller hears about it instead of the
    // writer quietly retrying, and only those bytes are charged.
    assert_eq!(n, 10);
    assert_eq!(writer.get_ref().data(), &[1u8; 10]);
    assert_eq!(link.stats().bytes(), 10);
}

#[tokio::test(start_paused = true)]
async fn empty_writes_complete_instantly() {
    let link = Link::new(Rate::kbps(1)).unwrap();
    let mut writer = link.writer(Vec::new());

    let start = Instant::now();
    let n = writer.write(&[]).await.unwrap();

    assert_eq!(n, 0);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(link.stats().requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn sink_errors_cost_no_link_time() {
    let link = Link::new(Rate::kbps(1)).unwrap();
    let mut writer = link.writer(FailingSink(io::ErrorKind::PermissionDenied));

    let start = Instant::now();
    let err = writer.write(&[0u8; 64]).await.unwrap_err();

    assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert_eq!(link.stats().requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn writes_fail_once_the_link_is_gone() {
    let link = Link::new(Rate::kbps(30)).unwrap();
    let mut writer = link.writer(Vec::new());

    link.shutdown().await;

    let err = writer.write(&[0u8; 10]).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
}
