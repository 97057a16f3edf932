mod mock_data;

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plantops::storage::InMemoryCollection;
use plantops::{Config, DataLayer, GatewayError, MutationOutcome};
use plantops_core::approval::{GatedAction, RolePolicy};
use plantops_core::cache::{read_key, TtlTier};
use plantops_core::mutation::{Actor, MutationAction, MutationRequest};
use plantops_core::optimistic::{OptimisticList, Rollback};

use crate::mock_data::{TroubleRecord, TROUBLE_RECORDS};

/// plantops - data layer tools for the plant-operations dashboard
#[derive(Parser, Debug)]
#[command(name = "plantops")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Role policy JSON file (overrides ROLE_POLICY_PATH)
    #[arg(long, global = true)]
    policy: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print how the approval gate classifies a role and action
    Decide {
        /// Role of the acting user
        #[arg(long)]
        role: String,

        /// Gated action: edit or delete
        #[arg(long)]
        action: GatedAction,
    },
    /// Run a create, an update and a delete through the gateway against an
    /// in-memory trouble record collection
    Simulate {
        /// Role of the acting user
        #[arg(long, default_value = "supervisor")]
        role: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr, command output to stdout.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "plantops=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut config = Config::from_env();
    if let Some(path) = cli.policy {
        config.role_policy_path = Some(path);
    }

    let report = match cli.command {
        Command::Decide { role, action } => {
            let policy = config.load_role_policy()?;
            decide(&policy, &role, action)
        }
        Command::Simulate { role } => simulate(&config, &role).await?,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn decide(policy: &RolePolicy, role: &str, action: GatedAction) -> Value {
    let level = policy.level(role, action);
    let decision = level.can_write().then(|| policy.decide(role, action));

    json!({
        "role": role,
        "action": action,
        "level": level,
        "decision": decision,
    })
}

async fn simulate(config: &Config, role: &str) -> Result<Value> {
    let (layer, approvals, activity) = DataLayer::in_memory(config)?;
    let collection = InMemoryCollection::with_rows(TROUBLE_RECORDS, mock_data::trouble_records());
    let gateway = layer.gateway(Arc::new(collection.clone()));
    let actor = Actor::new("u-sim", role).with_plant("north");

    let source = collection.clone();
    let rows: Vec<TroubleRecord> = layer
        .fetch(&read_key(TROUBLE_RECORDS), TtlTier::Short, move || async move {
            source.list().await
        })
        .await
        .context("initial page load failed")?;
    let mut page = OptimisticList::from_records(rows)?;
    let mut steps = Vec::new();

    // Create
    let reported_on = NaiveDate::from_ymd_opt(2026, 3, 12).unwrap_or_default();
    let draft = TroubleRecord::new(
        "north",
        "Boiler feed valve V-7",
        "Stuck half open",
        reported_on,
    );
    let handle = page.optimistic_add(draft.clone(), "tmp-1")?;
    let result = gateway
        .execute(MutationRequest::create(TROUBLE_RECORDS, actor.clone(), draft))
        .await;
    steps.push(settle(&mut page, handle, MutationAction::Create, result));

    // Update
    if let Some(before) = collection.get("1").await? {
        let after = before.clone().with_status("closed");
        let handle = page.optimistic_update(after.clone())?;
        let request = MutationRequest::update(TROUBLE_RECORDS, actor.clone(), before, after)
            .with_reason("Seal replaced during shift 2");
        let result = gateway.execute(request).await;
        steps.push(settle(&mut page, handle, MutationAction::Update, result));
    }

    // Delete
    if let Some(before) = collection.get("2").await? {
        let handle = page.optimistic_delete(&before.id)?;
        let request = MutationRequest::delete(TROUBLE_RECORDS, actor.clone(), before)
            .with_reason("Duplicate of an earlier report");
        let result = gateway.execute(request).await;
        steps.push(settle(&mut page, handle, MutationAction::Delete, result));
    }

    Ok(json!({
        "role": role,
        "steps": steps,
        "page": page.records(),
        "stored": collection.list().await?,
        "approvals": approvals.records().await,
        "activity": activity.entries().await,
    }))
}

/// Confirms or reverts the optimistic change behind `handle`.
///
/// Writes routed to approval are reverted too: the record only changes once
/// a reviewer approves it.
fn settle(
    page: &mut OptimisticList<TroubleRecord>,
    handle: Rollback,
    action: MutationAction,
    result: Result<MutationOutcome<TroubleRecord>, GatewayError>,
) -> Value {
    match result {
        Ok(MutationOutcome::Committed(committed)) => {
            let resolution = match (action, committed.record.clone()) {
                (MutationAction::Create, Some(stored)) => {
                    page.confirm_add_with(handle.id(), stored)
                }
                (MutationAction::Delete, _) => page.confirm_delete(handle.id()),
                _ => page.confirm_update(handle.id()),
            };
            json!({
                "action": action,
                "outcome": "committed",
                "record_id": committed.record_id,
                "logged": committed.is_logged(),
                "resolution": format!("{resolution:?}"),
            })
        }
        Ok(MutationOutcome::PendingApproval(record)) => {
            let resolution = page.rollback(&handle);
            json!({
                "action": action,
                "outcome": "pending_approval",
                "approval_id": record.id,
                "resolution": format!("{resolution:?}"),
            })
        }
        Err(err) => {
            let resolution = page.rollback(&handle);
            tracing::warn!(%action, error = %err, "Write failed, reverted page");
            json!({
                "action": action,
                "outcome": "failed",
                "error": err.to_string(),
                "resolution": format!("{resolution:?}"),
            })
        }
    }
}
