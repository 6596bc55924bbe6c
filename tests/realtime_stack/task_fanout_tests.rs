//! Task events reach the owning manager's connections and nobody else.

use super::helpers::{Stack, next_frame, stack};
use rstest::rstest;
use taskhub::{
    identity::domain::Role,
    task::{
        domain::{TaskDraft, TaskPatch, TaskPriority, TaskStatus},
        services::CreateTaskRequest,
    },
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn project_events_reach_only_the_creating_manager(stack: Stack) -> eyre::Result<()> {
    let mut m1 = stack.connect("m1", Role::Manager).await?;
    let mut m2 = stack.connect("m2", Role::Manager).await?;
    let mut admin = stack.connect("admin", Role::Admin).await?;
    let mut u2 = stack.connect("u2", Role::Member).await?;

    stack
        .tasks
        .create_task(
            &m1.actor(),
            CreateTaskRequest::project(
                TaskDraft::new("Quarterly report").with_priority(TaskPriority::High),
                u2.user.id(),
            ),
        )
        .await?;

    let received = stack
        .settle(&mut [&mut m1, &mut m2, &mut admin, &mut u2])
        .await?;
    let [m1_kinds, m2_kinds, admin_kinds, u2_kinds] = received.as_slice() else {
        eyre::bail!("one result per client expected");
    };
    eyre::ensure!(m1_kinds.contains(&"TASK_CREATED".to_owned()));
    eyre::ensure!(m1_kinds.contains(&"DASHBOARD_UPDATED".to_owned()));
    eyre::ensure!(m2_kinds.is_empty(), "other manager saw {m2_kinds:?}");
    eyre::ensure!(
        admin_kinds == &vec!["DASHBOARD_UPDATED".to_owned()],
        "admin saw {admin_kinds:?}"
    );
    eyre::ensure!(
        u2_kinds.iter().all(|kind| !kind.starts_with("TASK_")),
        "assignee saw task events {u2_kinds:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn completion_carries_paired_counters_to_the_manager(stack: Stack) -> eyre::Result<()> {
    let mut m1 = stack.connect("m1", Role::Manager).await?;
    let u2 = stack.enrol("u2", Role::Member)?;
    let task = stack
        .tasks
        .create_task(
            &m1.actor(),
            CreateTaskRequest::project(TaskDraft::new("Deploy"), u2.id()),
        )
        .await?;
    stack
        .tasks
        .update_task(
            &u2.as_actor(),
            task.id(),
            TaskPatch::new().with_status(TaskStatus::InProgress),
        )
        .await?;
    stack.settle(&mut [&mut m1]).await?;

    stack
        .tasks
        .update_task(
            &u2.as_actor(),
            task.id(),
            TaskPatch::new().with_status(TaskStatus::Completed),
        )
        .await?;

    let frame = next_frame(&mut m1.frames).await?;
    eyre::ensure!(frame["eventType"] == "TASK_COMPLETED");
    eyre::ensure!(frame["performedBy"]["userId"] == u2.id().to_string().as_str());
    eyre::ensure!(frame["performedBy"]["role"] == "MEMBER");
    let counters: Vec<String> = frame["data"]["counters"]
        .as_array()
        .map(|deltas| {
            deltas
                .iter()
                .map(|delta| format!("{}:{}", delta["counter"], delta["delta"]))
                .collect()
        })
        .unwrap_or_default();
    eyre::ensure!(
        counters == vec!["\"TASK_IN_PROGRESS\":-1", "\"TASK_COMPLETED\":1"],
        "unexpected counters {counters:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn personal_tasks_never_reach_a_manager_room(stack: Stack) -> eyre::Result<()> {
    let mut m1 = stack.connect("m1", Role::Manager).await?;
    let mut u1 = stack.connect("u1", Role::Member).await?;

    let task = stack
        .tasks
        .create_task(
            &u1.actor(),
            CreateTaskRequest::personal(TaskDraft::new("Read book")),
        )
        .await?;
    stack
        .tasks
        .update_task(
            &u1.actor(),
            task.id(),
            TaskPatch::new().with_status(TaskStatus::InProgress),
        )
        .await?;
    stack.tasks.delete_task(&u1.actor(), task.id()).await?;

    let received = stack.settle(&mut [&mut m1, &mut u1]).await?;
    eyre::ensure!(
        received.iter().all(Vec::is_empty),
        "personal task leaked: {received:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn every_session_of_the_manager_is_notified(stack: Stack) -> eyre::Result<()> {
    let mut laptop = stack.connect("m1", Role::Manager).await?;
    let (phone_result, mut phone_frames) = stack.handshake(Some("token-m1")).await;
    phone_result?;
    eyre::ensure!(next_frame(&mut phone_frames).await?["eventType"] == "CONNECTED");
    let u2 = stack.enrol("u2", Role::Member)?;

    stack
        .tasks
        .create_task(
            &laptop.actor(),
            CreateTaskRequest::project(TaskDraft::new("Both screens"), u2.id()),
        )
        .await?;

    eyre::ensure!(next_frame(&mut laptop.frames).await?["eventType"] == "TASK_CREATED");
    eyre::ensure!(next_frame(&mut phone_frames).await?["eventType"] == "TASK_CREATED");
    Ok(())
}
