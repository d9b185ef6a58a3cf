//! Adapters that wrap a [`RepositoryProvider`] and implement the individual
//! repository traits, so services can be constructed from a shared provider.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    Error,
    attempt::{AttemptOutcome, AttemptRecord, TrackerState},
    block::Block,
    repositories::{
        AttemptRepository, AttemptRepositoryProvider, BlockRepository, BlockRepositoryProvider,
        RepositoryProvider,
    },
};

pub struct AttemptRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> AttemptRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> AttemptRepository for AttemptRepositoryAdapter<R> {
    async fn record_attempt(
        &self,
        identity: &str,
        outcome: AttemptOutcome,
        state: TrackerState,
        at: DateTime<Utc>,
    ) -> Result<AttemptRecord, Error> {
        self.provider
            .attempts()
            .record_attempt(identity, outcome, state, at)
            .await
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<AttemptRecord>, Error> {
        self.provider.attempts().list_recent(limit).await
    }
}

pub struct BlockRepositoryAdapter<R: RepositoryProvider> {
    provider: Arc<R>,
}

impl<R: RepositoryProvider> BlockRepositoryAdapter<R> {
    pub fn new(provider: Arc<R>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<R: RepositoryProvider> BlockRepository for BlockRepositoryAdapter<R> {
    async fn create_block(
        &self,
        identity: &str,
        blocked_until: DateTime<Utc>,
        reason: &str,
        at: DateTime<Utc>,
    ) -> Result<Block, Error> {
        self.provider
            .blocks()
            .create_block(identity, blocked_until, reason, at)
            .await
    }

    async fn get_active_block(
        &self,
        identity: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Block>, Error> {
        self.provider.blocks().get_active_block(identity, now).await
    }

    async fn list_active_blocks(&self, now: DateTime<Utc>) -> Result<Vec<Block>, Error> {
        self.provider.blocks().list_active_blocks(now).await
    }

    async fn delete_block(&self, id: i64) -> Result<bool, Error> {
        self.provider.blocks().delete_block(id).await
    }

    async fn cleanup_expired(&self, before: DateTime<Utc>) -> Result<u64, Error> {
        self.provider.blocks().cleanup_expired(before).await
    }
}
