use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use actix_web::web;
use async_trait::async_trait;

use govlink_core::api::AppState;
use govlink_core::brain::{ChatTurn, TextGenerator};
use govlink_core::config::ResolverSettings;
use govlink_core::curated::{seed_entries, CuratedStore, InMemoryCuratedStore};
use govlink_core::error::GenerationError;
use govlink_core::query_log::MemoryQueryLog;
use govlink_core::Resolver;

/// Replies with canned text in order; errors once the script runs out.
pub struct CannedBrain {
    replies: Mutex<VecDeque<&'static str>>,
    calls: Mutex<usize>,
}

impl CannedBrain {
    pub fn new(replies: &[&'static str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().copied().collect()),
            calls: Mutex::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl TextGenerator for CannedBrain {
    async fn generate(&self, _model: &str, _turns: &[ChatTurn]) -> Result<String, GenerationError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.replies.lock().unwrap().pop_front();
        next.map(str::to_string).ok_or(GenerationError::EmptyReply)
    }
}

pub struct TestApp {
    pub state: web::Data<AppState>,
    pub brain: Arc<CannedBrain>,
    pub log: Arc<MemoryQueryLog>,
    pub curated: Arc<InMemoryCuratedStore>,
}

impl TestApp {
    pub fn new(replies: &[&'static str]) -> Self {
        let brain = CannedBrain::new(replies);
        let log = Arc::new(MemoryQueryLog::new());
        let curated = Arc::new(InMemoryCuratedStore::new(seed_entries()));

        let settings = ResolverSettings {
            tier_timeout: Duration::from_secs(1),
            ..ResolverSettings::default()
        };
        let store: Arc<dyn CuratedStore> = curated.clone();
        let resolver = Arc::new(Resolver::new(store.clone(), brain.clone(), log.clone(), settings));
        let state = web::Data::new(AppState {
            resolver,
            curated: store,
        });

        Self {
            state,
            brain,
            log,
            curated,
        }
    }
}
