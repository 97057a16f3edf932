//! Mutation gateway.
//!
//! Single entry point for create/update/delete on one remote collection:
//!
//! 1. Reject roles that may not write at all.
//! 2. Edits and deletes consult the approval gate; approval-bound writes are
//!    turned into a pending [`ApprovalRecord`] and nothing else happens.
//! 3. Direct writes go to the remote writer. On success an activity entry is
//!    appended (best effort) and every cached key of the collection is
//!    invalidated. On failure nothing is logged or invalidated.

use std::marker::PhantomData;
use std::sync::Arc;

use serde_json::Value;

use plantops_core::activity::ActivityLogEntry;
use plantops_core::approval::{ApprovalRecord, GateDecision, GatedAction, RolePolicy};
use plantops_core::cache::Cache;
use plantops_core::mutation::{Actor, Mutation, MutationAction, MutationRequest, Record};
use plantops_core::remote::{ApprovalSink, RemoteError, RemoteWriter};

use crate::activity::ActivityLogger;
use crate::error::GatewayError;
use crate::reports::{ErrorReport, ErrorReporter};

/// A write that reached the remote store.
#[derive(Debug, Clone, PartialEq)]
pub struct Committed<T> {
    pub action: MutationAction,
    pub record_id: String,
    /// Record as stored by the server; `None` after a delete.
    pub record: Option<T>,
    /// The appended activity entry, `None` when logging failed.
    pub activity: Option<ActivityLogEntry>,
}

impl<T> Committed<T> {
    /// Returns true if the activity entry was appended.
    pub fn is_logged(&self) -> bool {
        self.activity.is_some()
    }
}

/// Result of a successful [`MutationGateway::execute`].
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    Committed(Committed<T>),
    PendingApproval(ApprovalRecord),
}

impl<T> MutationOutcome<T> {
    pub fn is_pending_approval(&self) -> bool {
        matches!(self, Self::PendingApproval(_))
    }
}

/// Routes writes for one collection through the gate, the remote writer,
/// the activity log and cache invalidation.
pub struct MutationGateway<T, W, C>
where
    T: Record,
    W: RemoteWriter<T>,
    C: Cache,
{
    writer: Arc<W>,
    cache: Arc<C>,
    policy: Arc<RolePolicy>,
    approvals: Arc<dyn ApprovalSink>,
    activity: ActivityLogger,
    reporter: ErrorReporter,
    _record: PhantomData<fn() -> T>,
}

impl<T, W, C> MutationGateway<T, W, C>
where
    T: Record,
    W: RemoteWriter<T>,
    C: Cache,
{
    pub fn new(
        writer: Arc<W>,
        cache: Arc<C>,
        policy: Arc<RolePolicy>,
        approvals: Arc<dyn ApprovalSink>,
        activity: ActivityLogger,
        reporter: ErrorReporter,
    ) -> Self {
        Self {
            writer,
            cache,
            policy,
            approvals,
            activity,
            reporter,
            _record: PhantomData,
        }
    }

    /// Executes one mutation request.
    ///
    /// Routing to approval is a successful outcome. A failed activity log
    /// append is not an error either: the write stays committed, the outcome
    /// carries no activity entry and the failure goes to the error reporter.
    pub async fn execute(
        &self,
        request: MutationRequest<T>,
    ) -> Result<MutationOutcome<T>, GatewayError> {
        let action = request.action();
        self.authorize(&request.actor, action)?;

        if let Some(gated) = action.gated() {
            if self.policy.decide(&request.actor.role, gated) == GateDecision::RequiresApproval {
                let record = self.submit_for_approval(request, gated).await?;
                return Ok(MutationOutcome::PendingApproval(record));
            }
        }

        let committed = self.commit(request).await?;
        Ok(MutationOutcome::Committed(committed))
    }

    fn authorize(&self, actor: &Actor, action: MutationAction) -> Result<(), GatewayError> {
        let permissions = self.policy.permissions(&actor.role);
        let allowed = match action.gated() {
            None => permissions.can_create(),
            Some(gated) => permissions.level_for(gated).can_write(),
        };

        if allowed {
            return Ok(());
        }

        tracing::warn!(
            actor_id = %actor.id,
            role = %actor.role,
            %action,
            "Write denied: role has no write access"
        );
        Err(GatewayError::Forbidden {
            role: actor.role.clone(),
            action,
        })
    }

    async fn submit_for_approval(
        &self,
        request: MutationRequest<T>,
        gated: GatedAction,
    ) -> Result<ApprovalRecord, GatewayError> {
        let MutationRequest {
            entity_kind,
            mutation,
            actor,
            reason,
        } = request;

        let target_id = mutation.target_id().map(str::to_string);
        let snapshot = match &mutation {
            Mutation::Create(record) => to_snapshot(record)?,
            Mutation::Update { after, .. } => to_snapshot(after)?,
            Mutation::Delete { before } => to_snapshot(before)?,
        };

        let record = ApprovalRecord::pending(entity_kind, gated, target_id, snapshot, actor.id)
            .with_reason(reason.unwrap_or_default());

        self.approvals
            .submit(&record)
            .await
            .map_err(GatewayError::ApprovalSubmission)?;

        tracing::info!(
            approval_id = %record.id,
            entity_kind = %record.entity_kind,
            action = %record.action,
            target_id = ?record.target_id,
            submitted_by = %record.submitted_by,
            "Submitted write for approval"
        );
        Ok(record)
    }

    async fn commit(&self, request: MutationRequest<T>) -> Result<Committed<T>, GatewayError> {
        let MutationRequest {
            entity_kind,
            mutation,
            actor,
            ..
        } = request;
        let action = mutation.action();

        let (record_id, before, record) = match mutation {
            Mutation::Create(record) => {
                let stored = self
                    .writer
                    .create(&record)
                    .await
                    .map_err(GatewayError::Write)?;
                (stored.id().to_string(), None, Some(stored))
            }
            Mutation::Update { before, after } => {
                let before = to_snapshot(&before)?;
                let stored = self
                    .writer
                    .update(&after)
                    .await
                    .map_err(GatewayError::Write)?;
                (stored.id().to_string(), Some(before), Some(stored))
            }
            Mutation::Delete { before } => {
                let snapshot = to_snapshot(&before)?;
                self.writer
                    .delete(before.id())
                    .await
                    .map_err(GatewayError::Write)?;
                (before.id().to_string(), Some(snapshot), None)
            }
        };

        tracing::debug!(%entity_kind, %record_id, %action, "Committed write");

        let activity = self
            .log(&entity_kind, &record_id, action, &actor, before, record.as_ref())
            .await;

        if let Err(err) = self.cache.invalidate_by_prefix(&entity_kind).await {
            tracing::warn!(%entity_kind, error = %err, "Failed to invalidate cache");
        }

        Ok(Committed {
            action,
            record_id,
            record,
            activity,
        })
    }

    /// Appends the activity entry for a committed write, reporting failures.
    async fn log(
        &self,
        entity_kind: &str,
        record_id: &str,
        action: MutationAction,
        actor: &Actor,
        before: Option<Value>,
        after: Option<&T>,
    ) -> Option<ActivityLogEntry> {
        let result = match after.map(serde_json::to_value).transpose() {
            Ok(after) => {
                let entry = match action {
                    MutationAction::Create => ActivityLogEntry::created(
                        entity_kind,
                        record_id,
                        actor,
                        after.unwrap_or(Value::Null),
                    ),
                    MutationAction::Update => ActivityLogEntry::updated(
                        entity_kind,
                        record_id,
                        actor,
                        before.unwrap_or(Value::Null),
                        after.unwrap_or(Value::Null),
                    ),
                    MutationAction::Delete => ActivityLogEntry::deleted(
                        entity_kind,
                        record_id,
                        actor,
                        before.unwrap_or(Value::Null),
                    ),
                };
                self.activity.record(&entry).await.map(|()| entry)
            }
            Err(err) => Err(RemoteError::Serialization(err.to_string())),
        };

        match result {
            Ok(entry) => Some(entry),
            Err(err) => {
                self.reporter.report(ErrorReport::activity_log_failed(
                    entity_kind,
                    record_id,
                    action,
                    &err,
                ));
                None
            }
        }
    }
}

fn to_snapshot<T: Record>(record: &T) -> Result<Value, GatewayError> {
    serde_json::to_value(record).map_err(|e| GatewayError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plantops_core::approval::ApprovalStatus;
    use plantops_core::cache::{read_key, record_key};
    use plantops_core::remote::{ActivityLogSink, Result as RemoteResult};
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use crate::cache::MemoryCache;
    use crate::storage::{InMemoryActivityLog, InMemoryApprovalSink, InMemoryCollection};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct TroubleRecord {
        id: String,
        status: String,
        notes: String,
    }

    impl Record for TroubleRecord {
        fn id(&self) -> &str {
            &self.id
        }

        fn set_id(&mut self, id: String) {
            self.id = id;
        }
    }

    fn trouble(id: &str, status: &str) -> TroubleRecord {
        TroubleRecord {
            id: id.to_string(),
            status: status.to_string(),
            notes: "bearing noise".to_string(),
        }
    }

    /// Activity sink that refuses every append.
    struct BrokenLog;

    #[async_trait]
    impl ActivityLogSink for BrokenLog {
        async fn append(&self, _entry: &ActivityLogEntry) -> RemoteResult<()> {
            Err(RemoteError::ConnectionFailed("log sheet offline".to_string()))
        }

        async fn entries_for(&self, _: &str, _: &str) -> RemoteResult<Vec<ActivityLogEntry>> {
            Ok(Vec::new())
        }
    }

    struct Fixture {
        gateway: MutationGateway<TroubleRecord, InMemoryCollection<TroubleRecord>, MemoryCache>,
        collection: InMemoryCollection<TroubleRecord>,
        cache: Arc<MemoryCache>,
        approvals: InMemoryApprovalSink,
        log: InMemoryActivityLog,
        reporter: ErrorReporter,
    }

    fn fixture_with_log(log_sink: Arc<dyn ActivityLogSink>) -> Fixture {
        let collection = InMemoryCollection::with_rows(
            "trouble_record",
            vec![trouble("41", "open"), trouble("42", "open")],
        );
        let cache = Arc::new(MemoryCache::new(100));
        let approvals = InMemoryApprovalSink::new();
        let log = InMemoryActivityLog::new();
        let reporter = ErrorReporter::new(8);

        let gateway = MutationGateway::new(
            Arc::new(collection.clone()),
            Arc::clone(&cache),
            Arc::new(RolePolicy::standard()),
            Arc::new(approvals.clone()),
            ActivityLogger::new(log_sink),
            reporter.clone(),
        );

        Fixture {
            gateway,
            collection,
            cache,
            approvals,
            log,
            reporter,
        }
    }

    fn fixture() -> Fixture {
        let log = InMemoryActivityLog::new();
        let mut fixture = fixture_with_log(Arc::new(log.clone()));
        fixture.log = log;
        fixture
    }

    async fn warm_cache(cache: &MemoryCache) {
        cache.set(&read_key("trouble_record"), b"[]", None).await.unwrap();
        cache.set(&record_key("trouble_record", "42"), b"{}", None).await.unwrap();
        cache.set(&read_key("pump"), b"[]", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_direct_update_commits_logs_and_invalidates() {
        let f = fixture();
        warm_cache(&f.cache).await;
        let actor = Actor::new("u-1", "supervisor").with_plant("north");

        let outcome = f
            .gateway
            .execute(MutationRequest::update(
                "trouble_record",
                actor,
                trouble("42", "open"),
                trouble("42", "closed"),
            ))
            .await
            .unwrap();

        let MutationOutcome::Committed(committed) = outcome else {
            panic!("expected a committed write");
        };
        assert_eq!(committed.action, MutationAction::Update);
        assert_eq!(committed.record, Some(trouble("42", "closed")));
        assert!(committed.is_logged());

        let entries = f.log.entries().await;
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.actor_plant.as_deref(), Some("north"));
        assert_eq!(entry.changes.len(), 1);
        assert_eq!(entry.changes["status"].old, json!("open"));
        assert_eq!(entry.changes["status"].new, json!("closed"));

        assert!(f.cache.get(&read_key("trouble_record")).await.unwrap().is_none());
        assert!(f
            .cache
            .get(&record_key("trouble_record", "42"))
            .await
            .unwrap()
            .is_none());
        assert!(f.cache.get(&read_key("pump")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_create_is_never_gated() {
        let f = fixture();
        let actor = Actor::new("u-7", "operator");

        let outcome = f
            .gateway
            .execute(MutationRequest::create(
                "trouble_record",
                actor,
                trouble("tmp-1", "open"),
            ))
            .await
            .unwrap();

        let MutationOutcome::Committed(committed) = outcome else {
            panic!("creates must not be routed to approval");
        };
        assert_eq!(committed.record_id, "43");
        assert!(f.approvals.records().await.is_empty());

        let entry = committed.activity.unwrap();
        assert_eq!(entry.before, None);
        assert_eq!(entry.after.unwrap()["id"], json!("43"));
        assert!(entry.changes.is_empty());
        assert_eq!(f.collection.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_approval_required_edit_produces_pending_record() {
        let f = fixture();
        warm_cache(&f.cache).await;
        let actor = Actor::new("u-7", "operator");

        let outcome = f
            .gateway
            .execute(
                MutationRequest::update(
                    "trouble_record",
                    actor,
                    trouble("42", "open"),
                    trouble("42", "closed"),
                )
                .with_reason("pump replaced"),
            )
            .await
            .unwrap();

        let MutationOutcome::PendingApproval(record) = outcome else {
            panic!("expected an approval record");
        };
        assert_eq!(record.action, GatedAction::Edit);
        assert_eq!(record.status, ApprovalStatus::Pending);
        assert_eq!(record.target_id.as_deref(), Some("42"));
        assert_eq!(record.snapshot["status"], json!("closed"));
        assert_eq!(record.reason, "pump replaced");
        assert_eq!(record.submitted_by, "u-7");

        assert_eq!(f.approvals.records().await, vec![record]);
        assert!(f.log.entries().await.is_empty());
        assert_eq!(
            f.collection.get("42").await.unwrap(),
            Some(trouble("42", "open"))
        );
        assert!(f.cache.get(&read_key("trouble_record")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_view_only_role_is_forbidden() {
        let f = fixture();
        let actor = Actor::new("u-9", "viewer");

        for request in [
            MutationRequest::create("trouble_record", actor.clone(), trouble("tmp", "open")),
            MutationRequest::delete("trouble_record", actor.clone(), trouble("42", "open")),
        ] {
            let action = request.action();
            let err = f.gateway.execute(request).await.unwrap_err();
            assert_eq!(
                err,
                GatewayError::Forbidden {
                    role: "viewer".to_string(),
                    action,
                }
            );
        }

        assert!(f.approvals.records().await.is_empty());
        assert_eq!(f.collection.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_unknown_role_is_forbidden() {
        let f = fixture();
        let err = f
            .gateway
            .execute(MutationRequest::update(
                "trouble_record",
                Actor::new("u-0", "contractor"),
                trouble("42", "open"),
                trouble("42", "closed"),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Forbidden { .. }));
    }

    #[tokio::test]
    async fn test_failed_write_leaves_log_and_cache_alone() {
        let f = fixture();
        warm_cache(&f.cache).await;

        let err = f
            .gateway
            .execute(MutationRequest::delete(
                "trouble_record",
                Actor::new("u-1", "admin"),
                trouble("99", "open"),
            ))
            .await
            .unwrap_err();

        assert_eq!(
            err,
            GatewayError::Write(RemoteError::NotFound {
                entity_kind: "trouble_record".to_string(),
                id: "99".to_string(),
            })
        );
        assert!(f.log.entries().await.is_empty());
        assert!(f.cache.get(&read_key("trouble_record")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_log_failure_keeps_write_and_reports() {
        let f = fixture_with_log(Arc::new(BrokenLog));
        warm_cache(&f.cache).await;
        let mut reports = f.reporter.subscribe();

        let outcome = f
            .gateway
            .execute(MutationRequest::delete(
                "trouble_record",
                Actor::new("u-1", "admin"),
                trouble("42", "open"),
            ))
            .await
            .unwrap();

        let MutationOutcome::Committed(committed) = outcome else {
            panic!("expected a committed write");
        };
        assert!(!committed.is_logged());
        assert_eq!(f.collection.get("42").await.unwrap(), None);
        assert!(f.cache.get(&read_key("trouble_record")).await.unwrap().is_none());

        assert_eq!(
            reports.recv().await.unwrap(),
            ErrorReport::ActivityLogFailed {
                entity_kind: "trouble_record".to_string(),
                record_id: "42".to_string(),
                action: MutationAction::Delete,
                error: "Connection failed: log sheet offline".to_string(),
            }
        );
    }
}
