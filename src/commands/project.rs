use crate::args::CreateProjectArgs;
use crate::commands::Out;
use crate::model::Project;
use crate::{App, Result};

pub async fn create_project(app: &mut App, args: &CreateProjectArgs) -> Result<Out<Project>> {
    let project = app
        .create_project(
            args.name(),
            args.description(),
            args.currency().map(str::to_string),
        )
        .await?;
    Ok(Out::new(
        format!("Created project '{}' with id {}", project.name, project.id),
        project,
    ))
}

pub async fn list_projects(app: &App) -> Result<Out<Vec<Project>>> {
    let projects = app.projects().to_vec();
    if projects.is_empty() {
        return Ok(Out::new(
            "There are no projects yet. Create one with 'fintrack project create'.",
            projects,
        ));
    }
    let lines = projects
        .iter()
        .map(|p| format!("{}  {} ({})", p.id, p.name, p.currency))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(Out::new(
        format!("{} project(s):\n{lines}", projects.len()),
        projects,
    ))
}
