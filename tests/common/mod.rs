#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use notice_aggregator::error::{AppError, Result};
use notice_aggregator::models::{Config, PageRange, RawBatch, Source};
use notice_aggregator::services::{NoticeService, Provider};

/// One scripted provider response.
#[derive(Debug, Clone)]
pub enum Step {
    Rows(Vec<(&'static str, &'static str, &'static str)>),
    WithStatus(Vec<(&'static str, &'static str, &'static str, &'static str)>),
    Fail(&'static str),
}

/// Per-source response queues shared by every provider instance the
/// factory creates.
#[derive(Default)]
pub struct Script {
    steps: Mutex<HashMap<String, VecDeque<Step>>>,
    pub created: AtomicUsize,
    pub closed: AtomicUsize,
    pub calls: AtomicUsize,
}

impl Script {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, key: &str, step: Step) {
        self.steps
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(step);
    }

    /// Queue the same step `times` times.
    pub fn repeat(&self, key: &str, step: Step, times: usize) {
        for _ in 0..times {
            self.push(key, step.clone());
        }
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn next(&self, key: &str) -> Result<RawBatch> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let step = self
            .steps
            .lock()
            .unwrap()
            .get_mut(key)
            .and_then(VecDeque::pop_front);

        match step {
            Some(Step::Rows(rows)) => {
                let mut batch = RawBatch::default();
                for (title, link, date) in rows {
                    batch.push(title, link, date);
                }
                Ok(batch)
            }
            Some(Step::WithStatus(rows)) => {
                let mut batch = RawBatch::default();
                for (title, link, date, status) in rows {
                    batch.push_with_status(title, link, date, status);
                }
                Ok(batch)
            }
            Some(Step::Fail(message)) => Err(AppError::provider(key, message)),
            None => Err(AppError::provider(key, "no scripted response")),
        }
    }
}

pub struct ScriptedProvider {
    script: Arc<Script>,
}

#[async_trait]
impl Provider for ScriptedProvider {
    async fn fetch(&self, source: &Source, _pages: Option<PageRange>) -> Result<RawBatch> {
        self.script.next(&source.key)
    }

    async fn close(&self) {
        self.script.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Config with the given sources and a snapshot under `dir`.
pub fn config(dir: &Path, sources: Vec<Source>) -> Config {
    let mut config = Config::default();
    config.sources = sources;
    config.storage.snapshot_path = dir.join("cache.json");
    config.refresh.startup_delay_secs = 0;
    config
}

pub fn service(config: &Config, script: &Arc<Script>) -> NoticeService {
    let script = Arc::clone(script);
    NoticeService::with_factory(config, move || -> Result<Arc<dyn Provider>> {
        script.created.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(ScriptedProvider {
            script: Arc::clone(&script),
        }))
    })
    .unwrap()
}

pub fn source(key: &str) -> Source {
    Source::new(key, key.to_uppercase(), "#000000", "📌")
}
