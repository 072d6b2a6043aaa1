//! In-memory collaborators for unit tests.

use memory_model::ProviderError;
use std::sync::Mutex;

use crate::providers::{ArchivalSignal, EmbeddingProvider, SignalSink};

/// Returns fixed vectors for texts starting with a registered key.
#[derive(Debug, Default)]
pub struct StaticEmbedder {
    entries: Vec<(String, Vec<f32>)>,
    fallback: Option<Vec<f32>>,
}

impl StaticEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, vector: Vec<f32>) -> Self {
        self.entries.push((key.to_string(), vector));
        self
    }

    pub fn with_fallback(mut self, vector: Vec<f32>) -> Self {
        self.fallback = Some(vector);
        self
    }
}

impl EmbeddingProvider for StaticEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, ProviderError> {
        self.entries
            .iter()
            .find(|(key, _)| text.starts_with(key.as_str()))
            .map(|(_, vector)| vector.clone())
            .or_else(|| self.fallback.clone())
            .ok_or_else(|| ProviderError::Unavailable(format!("no vector for {text:?}")))
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Always fails.
#[derive(Debug)]
pub struct FailingEmbedder;

impl EmbeddingProvider for FailingEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
        Err(ProviderError::Failed("model offline".to_string()))
    }
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    received: Mutex<Vec<ArchivalSignal>>,
}

impl RecordingSink {
    pub fn signals(&self) -> Vec<ArchivalSignal> {
        self.received.lock().unwrap().clone()
    }
}

impl SignalSink for RecordingSink {
    fn archived(&self, signal: &ArchivalSignal) -> Result<(), ProviderError> {
        self.received.lock().unwrap().push(signal.clone());
        Ok(())
    }
}

#[derive(Debug)]
pub struct FailingSink;

impl SignalSink for FailingSink {
    fn archived(&self, _signal: &ArchivalSignal) -> Result<(), ProviderError> {
        Err(ProviderError::Unavailable("sink closed".to_string()))
    }
}
