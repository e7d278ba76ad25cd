//! Sample queues between the decode thread and the consumer
//!
//! The callback bridge is the only writer of each queue and exactly one
//! consumer drains it, fetching at most one sample per call.

use crate::sample::{AudioSample, BinarySample, OverlaySample, TextureSample, TimedSample};
use crate::time::{sample_overlaps, TimeRange};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// FIFO of shared samples of one media kind
pub struct SampleQueue<S> {
    samples: Mutex<VecDeque<Arc<S>>>,
}

impl<S: TimedSample> SampleQueue<S> {
    pub fn new() -> Self {
        Self {
            samples: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends a sample
    pub fn enqueue(&self, sample: Arc<S>) {
        self.samples.lock().push_back(sample);
    }

    /// Returns the oldest sample without removing it
    pub fn peek(&self) -> Option<Arc<S>> {
        self.samples.lock().front().cloned()
    }

    /// Removes and returns the oldest sample
    pub fn dequeue(&self) -> Option<Arc<S>> {
        self.samples.lock().pop_front()
    }

    /// Removes the oldest sample if its time span overlaps `range`
    pub fn fetch(&self, range: &TimeRange) -> Option<Arc<S>> {
        let mut samples = self.samples.lock();
        let front = samples.front()?;

        if !sample_overlaps(range, front.time(), front.duration()) {
            return None;
        }

        samples.pop_front()
    }

    /// Drops every queued sample
    pub fn flush(&self) {
        self.samples.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.samples.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.lock().is_empty()
    }
}

impl<S: TimedSample> Default for SampleQueue<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// The set of sample queues a player publishes into
#[derive(Default)]
pub struct MediaSamples {
    audio: SampleQueue<AudioSample>,
    video: SampleQueue<TextureSample>,
    caption: SampleQueue<OverlaySample>,
    metadata: SampleQueue<BinarySample>,
}

impl MediaSamples {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_audio(&self, sample: Arc<AudioSample>) {
        self.audio.enqueue(sample);
    }

    pub fn add_video(&self, sample: Arc<TextureSample>) {
        self.video.enqueue(sample);
    }

    pub fn add_caption(&self, sample: Arc<OverlaySample>) {
        self.caption.enqueue(sample);
    }

    pub fn add_metadata(&self, sample: Arc<BinarySample>) {
        self.metadata.enqueue(sample);
    }

    /// Fetches the next audio sample if it overlaps `range`
    pub fn fetch_audio(&self, range: &TimeRange) -> Option<Arc<AudioSample>> {
        self.audio.fetch(range)
    }

    /// Fetches the next video sample if it overlaps `range`
    pub fn fetch_video(&self, range: &TimeRange) -> Option<Arc<TextureSample>> {
        self.video.fetch(range)
    }

    /// Fetches the next caption sample if it overlaps `range`
    pub fn fetch_caption(&self, range: &TimeRange) -> Option<Arc<OverlaySample>> {
        self.caption.fetch(range)
    }

    /// Fetches the next metadata sample if it overlaps `range`
    pub fn fetch_metadata(&self, range: &TimeRange) -> Option<Arc<BinarySample>> {
        self.metadata.fetch(range)
    }

    pub fn num_audio(&self) -> usize {
        self.audio.len()
    }

    pub fn num_video(&self) -> usize {
        self.video.len()
    }

    pub fn num_caption(&self) -> usize {
        self.caption.len()
    }

    pub fn num_metadata(&self) -> usize {
        self.metadata.len()
    }

    /// Discards queued audio only
    pub fn flush_audio(&self) {
        self.audio.flush();
    }

    /// Discards every queued sample of every kind
    pub fn flush(&self) {
        self.audio.flush();
        self.video.flush();
        self.caption.flush();
        self.metadata.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn caption(at_ms: u64, len_ms: u64) -> Arc<OverlaySample> {
        Arc::new(OverlaySample {
            text: format!("at {at_ms}"),
            position: None,
            time: Duration::from_millis(at_ms),
            duration: Duration::from_millis(len_ms),
        })
    }

    fn range(start_ms: u64, end_ms: u64) -> TimeRange {
        Duration::from_millis(start_ms)..Duration::from_millis(end_ms)
    }

    #[test]
    fn test_fetch_returns_at_most_one_overlapping_sample() {
        let samples = MediaSamples::new();
        samples.add_caption(caption(0, 100));
        samples.add_caption(caption(100, 100));

        let first = samples.fetch_caption(&range(0, 1000)).unwrap();
        assert_eq!(first.text, "at 0");
        assert_eq!(samples.num_caption(), 1);
    }

    #[test]
    fn test_fetch_leaves_non_overlapping_sample_queued() {
        let samples = MediaSamples::new();
        samples.add_caption(caption(500, 100));

        assert!(samples.fetch_caption(&range(0, 400)).is_none());
        assert_eq!(samples.num_caption(), 1);
        assert!(samples.fetch_caption(&range(550, 600)).is_some());
        assert_eq!(samples.num_caption(), 0);
    }

    #[test]
    fn test_fetch_from_empty_queue() {
        let samples = MediaSamples::new();
        assert!(samples.fetch_video(&range(0, 1000)).is_none());
        assert!(samples.fetch_audio(&range(0, 1000)).is_none());
        assert!(samples.fetch_metadata(&range(0, 1000)).is_none());
    }

    #[test]
    fn test_flush_clears_all_queues() {
        let samples = MediaSamples::new();
        samples.add_caption(caption(0, 10));
        samples.add_metadata(Arc::new(BinarySample {
            data: b"title=x".to_vec(),
            time: Duration::ZERO,
            duration: Duration::ZERO,
        }));

        samples.flush();
        assert_eq!(samples.num_caption(), 0);
        assert_eq!(samples.num_metadata(), 0);
    }

    #[test]
    fn test_queue_peek_and_dequeue() {
        let queue: SampleQueue<OverlaySample> = SampleQueue::new();
        assert!(queue.is_empty());

        queue.enqueue(caption(1, 1));
        queue.enqueue(caption(2, 1));
        assert_eq!(queue.peek().unwrap().text, "at 1");
        assert_eq!(queue.dequeue().unwrap().text, "at 1");
        assert_eq!(queue.len(), 1);
    }
}
