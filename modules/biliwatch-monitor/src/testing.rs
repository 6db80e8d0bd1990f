// Test fakes for the monitor pipeline.
//
// Two fakes matching the two trait boundaries:
// - ScriptedProvider (SearchProvider): plays back a fixed step sequence
// - RecordingNotifier (NotifyBackend): captures sends, fails on markers
//
// Plus make_record for building records with stable fields.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use async_trait::async_trait;

use biliwatch_common::types::video_url;
use biliwatch_common::{ProviderKind, SearchError, VideoRecord};

use crate::notify::NotifyBackend;
use crate::providers::SearchProvider;

// ---------------------------------------------------------------------------
// ScriptedProvider
// ---------------------------------------------------------------------------

/// One scripted provider response.
#[derive(Clone)]
pub enum Step {
    Records(Vec<VideoRecord>),
    Empty,
    Transport,
    Blocked,
    Parse,
}

/// Plays its steps back in insertion order; the last step repeats forever.
/// Clones share the script and the call counter.
#[derive(Clone)]
pub struct ScriptedProvider {
    kind: ProviderKind,
    steps: Arc<Mutex<VecDeque<Step>>>,
    calls: Arc<AtomicU32>,
}

impl ScriptedProvider {
    pub fn new(kind: ProviderKind) -> Self {
        Self {
            kind,
            steps: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn returning(kind: ProviderKind, records: Vec<VideoRecord>) -> Self {
        Self::new(kind).step(Step::Records(records))
    }

    pub fn empty(kind: ProviderKind) -> Self {
        Self::new(kind).step(Step::Empty)
    }

    pub fn failing(kind: ProviderKind) -> Self {
        Self::new(kind).step(Step::Transport)
    }

    pub fn blocked(kind: ProviderKind) -> Self {
        Self::new(kind).step(Step::Blocked)
    }

    /// Append a step to the script.
    pub fn step(self, step: Step) -> Self {
        self.steps.lock().unwrap().push_back(step);
        self
    }

    /// How many times `search` was called.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_step(&self) -> Step {
        let mut steps = self.steps.lock().unwrap();
        if steps.len() > 1 {
            steps.pop_front().unwrap()
        } else {
            steps.front().cloned().unwrap_or(Step::Empty)
        }
    }
}

#[async_trait]
impl SearchProvider for ScriptedProvider {
    async fn search(&self, _keyword: &str, limit: usize) -> Result<Vec<VideoRecord>, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.next_step() {
            Step::Records(mut records) => {
                records.truncate(limit);
                Ok(records)
            }
            Step::Empty => Ok(Vec::new()),
            Step::Transport => Err(SearchError::Transport(
                "scripted transport failure".to_string(),
            )),
            Step::Blocked => Err(SearchError::Blocked("scripted block".to_string())),
            Step::Parse => Err(SearchError::Parse("scripted parse failure".to_string())),
        }
    }

    fn kind(&self) -> ProviderKind {
        self.kind
    }
}

// ---------------------------------------------------------------------------
// RecordingNotifier
// ---------------------------------------------------------------------------

/// A send attempt captured by RecordingNotifier.
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub destination: String,
    pub text: String,
    pub delivered: bool,
}

/// Captures every send. Any send whose text contains a failure marker
/// returns an error, so delivery-failure paths can be exercised.
/// Clones share the captured log.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    fail_markers: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(markers: &[&str]) -> Self {
        let notifier = Self::new();
        *notifier.fail_markers.lock().unwrap() =
            markers.iter().map(|m| m.to_string()).collect();
        notifier
    }

    pub fn clear_failures(&self) {
        self.fail_markers.lock().unwrap().clear();
    }

    /// Every send attempt, failed ones included.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Texts of the sends that went through.
    pub fn delivered(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.delivered)
            .map(|m| m.text.clone())
            .collect()
    }
}

#[async_trait]
impl NotifyBackend for RecordingNotifier {
    async fn send(&self, destination: &str, text: &str) -> Result<()> {
        let fail = self
            .fail_markers
            .lock()
            .unwrap()
            .iter()
            .any(|m| text.contains(m.as_str()));
        self.sent.lock().unwrap().push(SentMessage {
            destination: destination.to_string(),
            text: text.to_string(),
            delivered: !fail,
        });
        if fail {
            bail!("RecordingNotifier: forced failure for {destination}");
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Record helpers
// ---------------------------------------------------------------------------

/// Build a record with stable fields derived from the id.
pub fn make_record(id: &str) -> VideoRecord {
    VideoRecord {
        bvid: id.to_string(),
        title: format!("Video {id}"),
        author: "tester".to_string(),
        url: video_url(id),
        play: 42_000,
        like: 512,
        duration: "12:34".to_string(),
        pubdate: 1_755_000_000,
    }
}

// ---------------------------------------------------------------------------
// Fake self-tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_steps_play_in_order_and_last_sticks() {
        let provider = ScriptedProvider::new(ProviderKind::Api)
            .step(Step::Transport)
            .step(Step::Records(vec![make_record("BV1aa")]));

        assert!(provider.search("kw", 5).await.is_err());
        assert_eq!(provider.search("kw", 5).await.unwrap().len(), 1);
        assert_eq!(provider.search("kw", 5).await.unwrap().len(), 1);
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn recording_notifier_marks_failures() {
        let notifier = RecordingNotifier::failing_on(&["Video B"]);

        notifier.send("room", "about Video A").await.unwrap();
        assert!(notifier.send("room", "about Video B").await.is_err());

        let sent = notifier.sent();
        assert_eq!(sent.len(), 2);
        assert!(sent[0].delivered);
        assert!(!sent[1].delivered);
        assert_eq!(notifier.delivered(), vec!["about Video A".to_string()]);
    }
}
