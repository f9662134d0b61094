//! Test doubles shared by the unit tests in this crate.

use crate::preview::PreviewHost;
use crate::service::{FaceService, NewPerson, RecognitionReply, ServiceError};
use crate::types::MediaAsset;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn jpeg(name: &str) -> MediaAsset {
    MediaAsset::new(name, "image/jpeg", vec![0xFF, 0xD8, 0xFF, 0xE0])
}

pub fn image_of_size(name: &str, size: usize) -> MediaAsset {
    MediaAsset::new(name, "image/jpeg", vec![0u8; size])
}

#[derive(Default)]
struct HostState {
    next: usize,
    live: Vec<String>,
    max_live: usize,
    revoked: HashMap<String, usize>,
}

/// Preview host that records every create and revoke.
#[derive(Default)]
pub struct RecordingHost {
    state: Mutex<HostState>,
}

impl RecordingHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn created(&self) -> usize {
        self.state.lock().unwrap().next
    }

    pub fn live(&self) -> Vec<String> {
        self.state.lock().unwrap().live.clone()
    }

    pub fn max_live(&self) -> usize {
        self.state.lock().unwrap().max_live
    }

    pub fn revocations(&self, url: &str) -> usize {
        self.state.lock().unwrap().revoked.get(url).copied().unwrap_or(0)
    }

    pub fn total_revocations(&self) -> usize {
        self.state.lock().unwrap().revoked.values().sum()
    }
}

impl PreviewHost for RecordingHost {
    fn create(&self, _asset: &MediaAsset) -> String {
        let mut state = self.state.lock().unwrap();
        state.next += 1;
        let url = format!("blob:test/{}", state.next);
        state.live.push(url.clone());
        state.max_live = state.max_live.max(state.live.len());
        url
    }

    fn revoke(&self, url: &str) {
        let mut state = self.state.lock().unwrap();
        state.live.retain(|u| u != url);
        *state.revoked.entry(url.to_string()).or_default() += 1;
    }
}

/// Scripted recognition service that counts calls.
#[derive(Default)]
pub struct FakeService {
    recognize_replies: Mutex<VecDeque<Result<RecognitionReply, ServiceError>>>,
    enroll_replies: Mutex<VecDeque<Result<(), ServiceError>>>,
    recognize_calls: AtomicUsize,
    enroll_calls: AtomicUsize,
    enrolled: Mutex<Vec<NewPerson>>,
    latency: Option<Duration>,
}

impl FakeService {
    pub fn new() -> Self {
        Self::default()
    }

    /// A service that takes `latency` to answer every call.
    pub fn slow(latency: Duration) -> Self {
        Self {
            latency: Some(latency),
            ..Self::default()
        }
    }

    async fn wait(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    pub fn push_recognize(&self, reply: Result<RecognitionReply, ServiceError>) {
        self.recognize_replies.lock().unwrap().push_back(reply);
    }

    pub fn push_enroll(&self, reply: Result<(), ServiceError>) {
        self.enroll_replies.lock().unwrap().push_back(reply);
    }

    pub fn recognize_calls(&self) -> usize {
        self.recognize_calls.load(Ordering::SeqCst)
    }

    pub fn enroll_calls(&self) -> usize {
        self.enroll_calls.load(Ordering::SeqCst)
    }

    pub fn enrolled(&self) -> Vec<NewPerson> {
        self.enrolled.lock().unwrap().clone()
    }
}

impl FaceService for FakeService {
    async fn recognize(&self, _image: &MediaAsset) -> Result<RecognitionReply, ServiceError> {
        self.recognize_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        self.recognize_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(RecognitionReply::NoMatch))
    }

    async fn enroll(&self, person: &NewPerson) -> Result<(), ServiceError> {
        self.enroll_calls.fetch_add(1, Ordering::SeqCst);
        self.wait().await;
        self.enrolled.lock().unwrap().push(person.clone());
        self.enroll_replies.lock().unwrap().pop_front().unwrap_or(Ok(()))
    }
}
