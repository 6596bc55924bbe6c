//! Given steps for manager-scoped delivery scenarios.

use super::world::{ScopeWorld, run_async};
use eyre::WrapErr;
use rstest_bdd_macros::given;
use taskhub::{
    identity::domain::Role,
    task::{domain::TaskDraft, services::CreateTaskRequest},
};

#[given("the realtime hub is running")]
fn hub_running(world: &mut ScopeWorld) -> Result<(), eyre::Report> {
    world.start_hub()
}

#[given(r#"a connected manager "{name}""#)]
fn connected_manager(world: &mut ScopeWorld, name: String) -> Result<(), eyre::Report> {
    run_async(world.connect(&name, Role::Manager)).wrap_err("connect manager")
}

#[given(r#"a connected member "{name}""#)]
fn connected_member(world: &mut ScopeWorld, name: String) -> Result<(), eyre::Report> {
    run_async(world.connect(&name, Role::Member)).wrap_err("connect member")
}

#[given(r#""{manager}" has created a project task "{title}" assigned to "{assignee}""#)]
fn project_task_exists(
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
    .wrap_err("create project task in scenario setup")?;
    world.last_task = Some(task);
    // Setup traffic must not count towards later expectations.
    run_async(world.received_by(&manager))?;
    world.forget_received();
    Ok(())
}
