//! Built-in heartbeat agent
//!
//! A minimal concrete agent: start and stop are no-ops and every health
//! probe reports healthy with a running beat counter. Each agent in the
//! fleet configuration is hosted as one of these until real agent
//! implementations are plugged in.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use warden_core::prelude::*;

#[derive(Default)]
pub struct HeartbeatAgent {
    beats: AtomicU64,
}

impl HeartbeatAgent {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentHooks for HeartbeatAgent {
    async fn on_start(&self) -> Result<()> {
        Ok(())
    }

    async fn on_stop(&self) -> Result<()> {
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthCheck> {
        let beat = self.beats.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(HealthCheck::healthy().with_detail("beats", beat))
    }
}
