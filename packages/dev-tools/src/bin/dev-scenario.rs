//! Scenario runner for NodeGraph composite creation
//!
//! Builds the user / schedule / activity / role graph against an in-memory
//! store and prints a JSON summary of what was written.
//!
//! Usage:
//!   RUST_LOG=debug cargo run --bin dev-scenario
//!
//! Naming conventions can be overridden with `NODEGRAPH_*` variables (see
//! `nodegraph_core::config`).

use anyhow::{Context, Result};
use nodegraph_core::db::MemoryGraph;
use nodegraph_core::models::{
    CreateOptions, FieldDefinition, FieldType, ModelSchema, RoleSpec,
};
use nodegraph_core::services::{ModelRegistry, ModelService};
use nodegraph_core::GraphConfig;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn props(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

fn build_registry() -> Result<ModelRegistry> {
    Ok(ModelRegistry::builder()
        .register(
            "User",
            ModelSchema::new()
                .field("first", FieldType::String)
                .field("countSchedules", FieldType::Number)
                .field_def(
                    "countActivities",
                    FieldDefinition::new(FieldType::Number).with_default(json!(0)),
                ),
        )?
        .register(
            "Activity",
            ModelSchema::new()
                .field("activityName", FieldType::String)
                .strict(false),
        )?
        .register(
            "Schedule",
            ModelSchema::new()
                .field("scheduleName", FieldType::String)
                .field("activityCount", FieldType::Number),
        )?
        .build())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = GraphConfig::from_env().context("invalid NODEGRAPH_* naming override")?;
    let graph = Arc::new(MemoryGraph::new());
    let service =
        ModelService::new(graph.clone(), Arc::new(build_registry()?)).with_config(config)?;

    tracing::info!("Running composite creation scenario");

    let users = service.model("User")?;
    let john = users
        .create(props(json!({"first": "John", "countSchedules": 1})))
        .await?;
    users
        .create(props(json!({"first": "Jane", "countSchedules": 5})))
        .await?;

    let schedule_options: CreateOptions = serde_json::from_value(json!({
        "relationship": {
            "nodeLabel": "User",
            "indexField": "_id",
            "indexValue": john.id,
            "type": "MEMBER",
            "direction": "to"
        },
        "eventNodes": {"user": true},
        "counters": [{"node": "user", "field": "countSchedules"}],
        "role": {"roleOwner": "user", "name": "Admin"}
    }))?;
    let schedule = service
        .model("Schedule")?
        .create_with_relationship(
            props(json!({"scheduleName": "Schedule", "activityCount": 0})),
            Some(john.id.as_str()),
            schedule_options,
        )
        .await?;

    let activity_options: CreateOptions = serde_json::from_value(json!({
        "relationship": {
            "nodeLabel": "Schedule",
            "indexField": "_id",
            "indexValue": schedule.node.id,
            "type": "CONTAINS",
            "direction": "to"
        },
        "eventNodes": {"relationshipNode": true, "user": true},
        "counters": [{"node": "relationshipNode", "field": "activityCount"}]
    }))?;
    let activity = service
        .model("Activity")?
        .create_with_relationship(
            props(json!({"activityName": "A1"})),
            Some(john.id.as_str()),
            activity_options,
        )
        .await?;

    let schedules = service.model("Schedule")?;
    let blue = schedules
        .create_role(
            Some(RoleSpec::new("Blue", john.id.clone(), schedule.node.id.clone())),
            None,
        )
        .await?;
    let yellow = schedules
        .create_role(
            Some(RoleSpec::new("Yellow", john.id.clone(), schedule.node.id.clone())),
            Some(CreateOptions::new().without_event_nodes()),
        )
        .await?;

    let config = service.config();
    let roles = service
        .incoming_relationships(
            &schedule.node.id,
            &config.role_target_type("Schedule"),
            Some(config.role_label("Schedule").as_str()),
        )
        .await?;
    let schedule_events = service
        .incoming_relationships(
            &schedule.node.id,
            &config.event_link_type("Schedule"),
            None,
        )
        .await?;
    let john = users
        .find_by_id(&john.id)
        .await?
        .context("user disappeared")?;
    let stats = graph.stats().await;

    let summary = json!({
        "schedule": schedule,
        "activity": activity,
        "roles": {
            "blue": blue.node,
            "yellow": yellow.node,
            "names": roles
                .nodes
                .iter()
                .filter_map(|n| n.get_str("role"))
                .collect::<Vec<_>>(),
        },
        "scheduleEventCount": schedule_events.len(),
        "user": john,
        "graph": {
            "nodes": stats.node_count,
            "relationships": stats.relationship_count,
        },
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);

    Ok(())
}
