//! Byte-rate throttling for download streams.
//!
//! A token-bucket limiter expressed as a `Stream` adapter, so it slots into
//! any byte pipeline between backend read and transport write. Each download
//! gets its own bucket; buckets are never shared across requests.

use bytes::Bytes;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tokio::time::Sleep;

use filevault_storage::{ByteStream, StorageError};

/// Budget refills on this fixed cadence; bursts up to one interval's worth
/// of tokens are possible.
const REFILL_INTERVAL: Duration = Duration::from_millis(250);

/// Delay before a partially emitted chunk's remainder is offered again.
const RETRY_DELAY: Duration = Duration::from_millis(50);

#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    capacity: f64, // bytes per second
    last_refill: Instant,
}

impl TokenBucket {
    fn new(bytes_per_sec: u64) -> Self {
        // A zero or negative rate would stall the stream forever; clamp to
        // the slowest meaningful rate instead.
        let capacity = (bytes_per_sec as f64).max(1.0);
        Self {
            tokens: capacity,
            capacity,
            last_refill: Instant::now(),
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        if elapsed < REFILL_INTERVAL {
            return;
        }

        let tokens_to_add = elapsed.as_secs_f64() * self.capacity;
        self.tokens = (self.tokens + tokens_to_add).min(self.capacity);
        self.last_refill = now;
    }

    /// Spend up to `wanted` tokens, returning how many were granted.
    fn take(&mut self, wanted: usize) -> usize {
        let granted = (self.tokens.floor() as usize).min(wanted);
        self.tokens -= granted as f64;
        granted
    }
}

/// Token-bucket byte-rate limiter over an inner byte stream.
///
/// Chunks that fit the current budget pass through whole; oversized chunks
/// are split, the head emitted immediately and the tail re-offered after a
/// short delay. Ordering is preserved and no bytes are dropped. Sustained
/// throughput converges to the configured rate; instantaneous bursts up to
/// one refill interval are possible.
pub struct ThrottledStream {
    inner: ByteStream,
    bucket: TokenBucket,
    pending: Option<Bytes>,
    delay: Option<Pin<Box<Sleep>>>,
}

impl ThrottledStream {
    pub fn new(inner: ByteStream, bytes_per_sec: u64) -> Self {
        Self {
            inner,
            bucket: TokenBucket::new(bytes_per_sec),
            pending: None,
            delay: None,
        }
    }

    /// The effective rate in bytes/second (after clamping).
    pub fn bytes_per_sec(&self) -> u64 {
        self.bucket.capacity as u64
    }
}

impl Stream for ThrottledStream {
    type Item = Result<Bytes, StorageError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(delay) = this.delay.as_mut() {
                match delay.as_mut().poll(cx) {
                    Poll::Ready(()) => this.delay = None,
                    Poll::Pending => return Poll::Pending,
                }
            }

            this.bucket.refill();

            if let Some(chunk) = this.pending.take() {
                let granted = this.bucket.take(chunk.len());

                if granted == 0 {
                    // Budget exhausted; try again shortly.
                    this.pending = Some(chunk);
                    this.delay = Some(Box::pin(tokio::time::sleep(RETRY_DELAY)));
                    continue;
                }

                if granted >= chunk.len() {
                    return Poll::Ready(Some(Ok(chunk)));
                }

                let head = chunk.slice(..granted);
                this.pending = Some(chunk.slice(granted..));
                this.delay = Some(Box::pin(tokio::time::sleep(RETRY_DELAY)));
                return Poll::Ready(Some(Ok(head)));
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(chunk))) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    this.pending = Some(chunk);
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn source(chunks: Vec<Vec<u8>>) -> ByteStream {
        Box::pin(futures::stream::iter(
            chunks.into_iter().map(|c| Ok(Bytes::from(c))),
        ))
    }

    async fn drain(mut stream: ThrottledStream) -> Vec<u8> {
        let mut out = Vec::new();
        while let Some(chunk) = stream.next().await {
            out.extend_from_slice(&chunk.unwrap());
        }
        out
    }

    #[tokio::test]
    async fn test_passthrough_within_budget() {
        let data = vec![1u8; 100];
        let throttled = ThrottledStream::new(source(vec![data.clone()]), 1_000_000);

        let start = Instant::now();
        let out = drain(throttled).await;

        assert_eq!(out, data);
        // Fits the initial budget, so no delay at all
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_convergence_to_capacity() {
        // 24 KB through an 8 KB/s limiter: the initial full bucket absorbs
        // 8 KB, the remaining 16 KB must wait roughly two seconds.
        let payload: Vec<u8> = (0..24_000u32).map(|i| (i % 251) as u8).collect();
        let chunks: Vec<Vec<u8>> = payload.chunks(1024).map(|c| c.to_vec()).collect();

        let throttled = ThrottledStream::new(source(chunks), 8_000);

        let start = Instant::now();
        let out = drain(throttled).await;
        let elapsed = start.elapsed();

        // No bytes lost or reordered
        assert_eq!(out, payload);
        // At least (N - burst) / C seconds, with slack for timer coarseness
        assert!(
            elapsed >= Duration::from_millis(1500),
            "drained too fast: {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn test_oversized_chunk_split_preserves_order() {
        // A single chunk larger than the bucket must be split, not dropped
        let data: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let throttled = ThrottledStream::new(source(vec![data.clone()]), 4_000);

        let out = drain(throttled).await;
        assert_eq!(out, data);
    }

    #[tokio::test]
    async fn test_zero_capacity_clamps_to_one() {
        let throttled = ThrottledStream::new(source(vec![]), 0);
        assert_eq!(throttled.bytes_per_sec(), 1);
    }

    #[tokio::test]
    async fn test_inner_error_propagates() {
        let inner: ByteStream = Box::pin(futures::stream::iter(vec![
            Ok(Bytes::from_static(b"ok")),
            Err(StorageError::ReadFailed("boom".to_string())),
        ]));

        let mut throttled = ThrottledStream::new(inner, 1_000_000);

        assert!(throttled.next().await.unwrap().is_ok());
        assert!(throttled.next().await.unwrap().is_err());
    }

    #[tokio::test]
    async fn test_empty_source() {
        let throttled = ThrottledStream::new(source(vec![]), 1_000);
        assert!(drain(throttled).await.is_empty());
    }
}
