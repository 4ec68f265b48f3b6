//! Role Creation Tests
//!
//! Builds the user / schedule / activity graph through composite creation,
//! then grants roles on the schedule with and without event nodes and
//! checks the relationship counts around the schedule after each step.

#[cfg(test)]
mod create_role_tests {
    use anyhow::Result;
    use nodegraph_core::db::MemoryGraph;
    use nodegraph_core::models::{
        CreateOptions, Direction, EventNodes, FieldDefinition, FieldType, ModelSchema, Node,
        ParticipantRole, RelationshipSpec, RoleSpec, ValidationError,
    };
    use nodegraph_core::services::{ModelRegistry, ModelService, ModelServiceError};
    use serde_json::{json, Map, Value};
    use std::sync::Arc;

    struct TestEnv {
        graph: Arc<MemoryGraph>,
        service: ModelService,
        user: Node,
        schedule: Node,
    }

    fn props(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap_or_default()
    }

    fn create_test_service() -> Result<(Arc<MemoryGraph>, ModelService)> {
        let registry = ModelRegistry::builder()
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
            .build();

        let graph = Arc::new(MemoryGraph::new());
        let service = ModelService::new(graph.clone(), Arc::new(registry));
        Ok((graph, service))
    }

    /// Two users, a schedule owned by the first (with an Admin role) and an
    /// activity inside the schedule
    async fn create_test_env() -> Result<TestEnv> {
        let (graph, service) = create_test_service()?;
        let users = service.model("User")?;

        let user = users
            .create(props(json!({"first": "John", "countSchedules": 1})))
            .await?;
        let jane = users
            .create(props(json!({"first": "Jane", "countSchedules": 5})))
            .await?;
        assert_eq!(jane.get_str("first"), Some("Jane"));

        let schedule_options = CreateOptions::new()
            .relationship(RelationshipSpec::new(
                "User",
                "_id",
                user.id.clone(),
                "MEMBER",
                Direction::To,
            ))
            .event_nodes(EventNodes::roles([ParticipantRole::User]))
            .counter(ParticipantRole::User, "countSchedules")
            .role(ParticipantRole::User, "Admin");
        let schedule = service
            .model("Schedule")?
            .create_with_relationship(
                props(json!({"scheduleName": "Schedule", "activityCount": 0})),
                Some(user.id.as_str()),
                schedule_options,
            )
            .await?
            .node;

        let activity_options = CreateOptions::new()
            .relationship(RelationshipSpec::new(
                "Schedule",
                "_id",
                schedule.id.clone(),
                "CONTAINS",
                Direction::To,
            ))
            .event_nodes(EventNodes::roles([
                ParticipantRole::RelationshipNode,
                ParticipantRole::User,
            ]))
            .counter(ParticipantRole::RelationshipNode, "activityCount");
        service
            .model("Activity")?
            .create_with_relationship(
                props(json!({"activityName": "A1"})),
                Some(user.id.as_str()),
                activity_options,
            )
            .await?;

        Ok(TestEnv {
            graph,
            service,
            user,
            schedule,
        })
    }

    fn role(name: &str, env: &TestEnv) -> Option<RoleSpec> {
        Some(RoleSpec::new(name, env.user.id.clone(), env.schedule.id.clone()))
    }

    #[tokio::test]
    async fn test_setup_graph_shape() -> Result<()> {
        let env = create_test_env().await?;

        // Admin role from the schedule's role option
        let roles = env
            .service
            .incoming_relationships(&env.schedule.id, "HAS_SCHEDULE", Some("_ScheduleRole"))
            .await?;
        assert_eq!(roles.len(), 1);
        assert_eq!(roles.nodes[0].get_str("role"), Some("Admin"));

        // Schedule event for the user, activity events for schedule and user
        assert_eq!(env.graph.count_relationships("EVENT_USER").await, 2);
        assert_eq!(env.graph.count_relationships("EVENT_ACTIVITY").await, 2);

        let schedule = env
            .service
            .find_by_id("Schedule", &env.schedule.id)
            .await?
            .expect("schedule should exist");
        assert_eq!(schedule.get_i64("activityCount"), Some(1));

        Ok(())
    }

    #[tokio::test]
    async fn test_create_role_with_event_nodes() -> Result<()> {
        let env = create_test_env().await?;
        let schedules = env.service.model("Schedule")?;

        let created = schedules.create_role(role("Blue", &env), None).await?;
        assert_eq!(created.node.label, "_ScheduleRole");
        assert_eq!(created.node.get_str("role"), Some("Blue"));

        let roles = env
            .service
            .incoming_relationships(&env.schedule.id, "HAS_SCHEDULE", Some("_ScheduleRole"))
            .await?;
        assert_eq!(roles.len(), 2);
        assert!(roles.nodes.iter().any(|n| n.get_str("role") == Some("Blue")));

        let owners = env
            .service
            .incoming_relationships(&created.node.id, "HAS_ROLE", Some("User"))
            .await?;
        assert_eq!(owners.nodes[0].id, env.user.id);

        let latest = env
            .service
            .outgoing_relationships(
                &env.schedule.id,
                "LATEST_EVENT",
                Some("_ScheduleRoleCreated"),
            )
            .await?;
        assert_eq!(latest.len(), 1);

        // Default event selection: the schedule, then the user
        let event_owners: Vec<_> = created.events.iter().map(|e| e.owner_id.clone()).collect();
        assert_eq!(event_owners, vec![env.schedule.id.clone(), env.user.id.clone()]);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_role_without_event_nodes() -> Result<()> {
        let env = create_test_env().await?;
        let schedules = env.service.model("Schedule")?;

        schedules.create_role(role("Blue", &env), None).await?;
        let events_before = env.graph.count_relationships("EVENT_SCHEDULE").await;

        let created = schedules
            .create_role(
                role("Yellow", &env),
                Some(CreateOptions::new().without_event_nodes()),
            )
            .await?;
        assert_eq!(created.node.get_str("role"), Some("Yellow"));
        assert!(created.events.is_empty());

        let roles = env
            .service
            .incoming_relationships(&env.schedule.id, "HAS_SCHEDULE", Some("_ScheduleRole"))
            .await?;
        assert_eq!(roles.len(), 3);
        assert_eq!(roles.nodes[2].get_str("role"), Some("Yellow"));

        let schedule_events = env
            .service
            .incoming_relationships(&env.schedule.id, "EVENT_SCHEDULE", None)
            .await?;
        assert_eq!(schedule_events.len(), 3);
        assert_eq!(schedule_events.len(), events_before);

        Ok(())
    }

    #[tokio::test]
    async fn test_create_role_validation_failures() -> Result<()> {
        let env = create_test_env().await?;
        let schedules = env.service.model("Schedule")?;
        let before = env.graph.stats().await;
        let user_id = env.user.id.clone();
        let schedule_id = env.schedule.id.clone();

        let cases = vec![
            (None, "role"),
            (
                Some(RoleSpec {
                    name: Some("Admin".to_string()),
                    other: Some(schedule_id.clone()),
                    ..RoleSpec::default()
                }),
                "role.user",
            ),
            (
                Some(RoleSpec {
                    name: Some("Admin".to_string()),
                    user: Some(user_id.clone()),
                    ..RoleSpec::default()
                }),
                "role.other",
            ),
            (
                Some(RoleSpec {
                    user: Some(user_id.clone()),
                    other: Some(schedule_id.clone()),
                    ..RoleSpec::default()
                }),
                "role.name",
            ),
        ];

        for (spec, missing) in cases {
            let err = schedules
                .create_role(spec, None)
                .await
                .expect_err("role creation should fail");
            assert_eq!(
                err,
                ModelServiceError::Validation(ValidationError::required(missing))
            );
        }

        assert_eq!(env.graph.stats().await, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_role_unknown_target() -> Result<()> {
        let env = create_test_env().await?;
        let before = env.graph.stats().await;

        let err = env
            .service
            .create_role(
                "Schedule",
                Some(RoleSpec::new("Blue", env.user.id.clone(), "no-such-schedule")),
                None,
            )
            .await
            .expect_err("unknown schedule should not resolve");
        assert!(err.is_not_found());

        // The user id points at a User, not a Schedule
        let err = env
            .service
            .create_role(
                "Schedule",
                Some(RoleSpec::new("Blue", env.user.id.clone(), env.user.id.clone())),
                None,
            )
            .await
            .expect_err("other must be a Schedule");
        assert!(err.is_not_found());

        assert_eq!(env.graph.stats().await, before);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_role_rejects_invalid_counter_field() -> Result<()> {
        let (graph, service) = create_test_service()?;
        let mut flags = indexmap::IndexMap::new();
        flags.insert(ParticipantRole::User, true);
        let options: CreateOptions = serde_json::from_value(json!({
            "eventNodes": {"user": true},
            "counters": [{"node": "user", "field": "not a field"}]
        }))?;
        assert_eq!(options.event_nodes, EventNodes::Roles(flags));

        let err = service
            .create_role(
                "Schedule",
                Some(RoleSpec::new("Blue", "u", "s")),
                Some(options),
            )
            .await
            .expect_err("counter field is not an identifier");
        assert!(err.is_validation());
        assert_eq!(graph.stats().await.node_count, 0);
        Ok(())
    }
}
