//! When steps for manager-scoped delivery scenarios.

use super::world::{ScopeWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::when;
use taskhub::task::{
    domain::{TaskDraft, TaskPatch, TaskStatus},
    services::CreateTaskRequest,
};

#[when(r#""{manager}" creates a project task "{title}" assigned to "{assignee}""#)]
fn create_project_task(
    world: &mut ScopeWorld,
    manager: String,
    title: String,
    assignee: String,
) -> Result<(), eyre::Report> {
    let creator = world.actor(&manager)?;
    let assignee_id = world.actor(&assignee)?.id;
    let task = run_async(
        world
            .tasks
            .create_task(&creator, CreateTaskRequest::project(TaskDraft::new(title), assignee_id)),
    )
    .wrap_err("create project task")?;
    world.last_task = Some(task);
    world.forget_received();
    Ok(())
}

#[when(r#""{name}" creates a personal task "{title}""#)]
fn create_personal_task(
    world: &mut ScopeWorld,
    name: String,
    title: String,
) -> Result<(), eyre::Report> {
    let creator = world.actor(&name)?;
    let task = run_async(
        world
            .tasks
            .create_task(&creator, CreateTaskRequest::personal(TaskDraft::new(title))),
    )
    .wrap_err("create personal task")?;
    world.last_task = Some(task);
    world.forget_received();
    Ok(())
}

fn update_last_task(
    world: &mut ScopeWorld,
    name: &str,
    patch: TaskPatch,
) -> Result<(), eyre::Report> {
    let actor = world.actor(name)?;
    let task_id = world
        .last_task
        .as_ref()
        .map(taskhub::task::domain::Task::id)
        .ok_or_else(|| eyre::eyre!("missing task in scenario world"))?;
    let result = run_async(world.tasks.update_task(&actor, task_id, patch));
    if let Ok(ref updated) = result {
        world.last_task = Some(updated.clone());
    }
    world.last_update = Some(result);
    world.forget_received();
    Ok(())
}

#[when(r#""{name}" moves the task to "{status}""#)]
fn move_task(world: &mut ScopeWorld, name: String, status: String) -> Result<(), eyre::Report> {
    let target = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    update_last_task(world, &name, TaskPatch::new().with_status(target))
}

#[when(r#""{name}" renames the task to "{title}""#)]
fn rename_task(world: &mut ScopeWorld, name: String, title: String) -> Result<(), eyre::Report> {
    update_last_task(world, &name, TaskPatch::new().with_title(title))
}
