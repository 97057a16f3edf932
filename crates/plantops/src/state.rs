//! Data layer composition root.
//!
//! Owns the process-wide cache, the in-flight table, the role policy, the
//! approval and activity sinks and the error reporter. Pages get read access
//! through [`DataLayer::fetch`] and write access through a per-collection
//! [`MutationGateway`].

use std::future::Future;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use plantops_core::approval::RolePolicy;
use plantops_core::cache::{TtlTier, TtlTiers};
use plantops_core::mutation::Record;
use plantops_core::remote::{self, ActivityLogSink, ApprovalSink, RemoteWriter};

use crate::activity::ActivityLogger;
use crate::cache::MemoryCache;
use crate::config::Config;
use crate::error::{ConfigError, FetchError};
use crate::fetch::ReadThroughFetcher;
use crate::gateway::MutationGateway;
use crate::reports::ErrorReporter;
use crate::storage::{InMemoryActivityLog, InMemoryApprovalSink};

/// Shared data layer state.
///
/// Cloning shares every underlying resource.
#[derive(Clone)]
pub struct DataLayer {
    cache: Arc<MemoryCache>,
    fetcher: ReadThroughFetcher<MemoryCache>,
    policy: Arc<RolePolicy>,
    approvals: Arc<dyn ApprovalSink>,
    activity: ActivityLogger,
    reporter: ErrorReporter,
    ttl_tiers: TtlTiers,
}

impl DataLayer {
    /// Builds the data layer from configuration and the remote sinks.
    pub fn new(
        config: &Config,
        policy: RolePolicy,
        approvals: Arc<dyn ApprovalSink>,
        activity: Arc<dyn ActivityLogSink>,
    ) -> Self {
        let cache = Arc::new(MemoryCache::new(config.cache_max_entries));
        let fetcher = ReadThroughFetcher::new(Arc::clone(&cache));

        Self {
            cache,
            fetcher,
            policy: Arc::new(policy),
            approvals,
            activity: ActivityLogger::new(activity),
            reporter: ErrorReporter::new(config.error_channel_capacity),
            ttl_tiers: config.ttl_tiers(),
        }
    }

    /// Builds a data layer backed by in-memory sinks, loading the configured
    /// role policy. Returns the sinks so callers can inspect them.
    pub fn in_memory(
        config: &Config,
    ) -> Result<(Self, InMemoryApprovalSink, InMemoryActivityLog), ConfigError> {
        let policy = config.load_role_policy()?;
        let approvals = InMemoryApprovalSink::new();
        let activity = InMemoryActivityLog::new();

        let layer = Self::new(
            config,
            policy,
            Arc::new(approvals.clone()),
            Arc::new(activity.clone()),
        );
        Ok((layer, approvals, activity))
    }

    pub fn cache(&self) -> &Arc<MemoryCache> {
        &self.cache
    }

    pub fn policy(&self) -> &RolePolicy {
        &self.policy
    }

    pub fn activity(&self) -> &ActivityLogger {
        &self.activity
    }

    pub fn reporter(&self) -> &ErrorReporter {
        &self.reporter
    }

    /// Builds the mutation gateway for one collection.
    pub fn gateway<T, W>(&self, writer: Arc<W>) -> MutationGateway<T, W, MemoryCache>
    where
        T: Record,
        W: RemoteWriter<T>,
    {
        MutationGateway::new(
            writer,
            Arc::clone(&self.cache),
            Arc::clone(&self.policy),
            Arc::clone(&self.approvals),
            self.activity.clone(),
            self.reporter.clone(),
        )
    }

    /// Reads through the cache with the TTL of the given tier.
    pub async fn fetch<T, F, Fut>(
        &self,
        key: &str,
        tier: TtlTier,
        loader: F,
    ) -> Result<T, FetchError>
    where
        T: Serialize + DeserializeOwned + Send + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = remote::Result<T>> + Send + 'static,
    {
        self.fetcher
            .fetch(key, loader, self.ttl_tiers.duration(tier))
            .await
    }

    /// Drops every cached value and pending request, as on logout.
    pub async fn logout(&self) -> Result<(), FetchError> {
        self.fetcher.clear().await?;
        tracing::info!("Cleared data layer state");
        Ok(())
    }
}
