//! Filesystem persistence of projects and their workflow documents.
//!
//! Layout: `<root>/<project>/<workflow>.json`. Documents are stored as
//! given; the store never interprets them.

use serde::Serialize;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tokio::fs;

const WORKFLOW_EXTENSION: &str = ".json";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Project already exists: {0}")]
    ProjectExists(String),

    #[error("Workflow not found: {0}")]
    WorkflowNotFound(String),

    #[error("Workflow already exists: {0}")]
    WorkflowExists(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A project and the workflow files it contains
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProjectSummary {
    pub name: String,
    pub workflows: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// All projects with their workflow file names, both sorted
    pub async fn list_projects(&self) -> Result<Vec<ProjectSummary>, StoreError> {
        let mut projects = Vec::new();
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(projects),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if name.starts_with('.') {
                continue;
            }
            let workflows = self.list_workflows(&name).await?;
            projects.push(ProjectSummary { name, workflows });
        }

        projects.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projects)
    }

    /// Workflow file names of one project, sorted
    pub async fn list_workflows(&self, project: &str) -> Result<Vec<String>, StoreError> {
        let dir = self.existing_project(project).await?;
        let mut workflows = Vec::new();
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if let Ok(name) = entry.file_name().into_string() {
                if name.ends_with(WORKFLOW_EXTENSION) && entry.file_type().await?.is_file() {
                    workflows.push(name);
                }
            }
        }
        workflows.sort();
        Ok(workflows)
    }

    pub async fn create_project(&self, name: &str) -> Result<(), StoreError> {
        let dir = self.project_dir(name)?;
        if fs::try_exists(&dir).await? {
            return Err(StoreError::ProjectExists(name.to_string()));
        }
        fs::create_dir_all(&dir).await?;
        tracing::info!("Created project {}", name);
        Ok(())
    }

    pub async fn rename_project(&self, old: &str, new: &str) -> Result<(), StoreError> {
        let from = self.existing_project(old).await?;
        let to = self.project_dir(new)?;
        if fs::try_exists(&to).await? {
            return Err(StoreError::ProjectExists(new.to_string()));
        }
        fs::rename(&from, &to).await?;
        tracing::info!("Renamed project {} to {}", old, new);
        Ok(())
    }

    pub async fn duplicate_project(&self, source: &str, target: &str) -> Result<(), StoreError> {
        let from = self.existing_project(source).await?;
        let to = self.project_dir(target)?;
        if fs::try_exists(&to).await? {
            return Err(StoreError::ProjectExists(target.to_string()));
        }
        fs::create_dir_all(&to).await?;

        let mut entries = fs::read_dir(&from).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                fs::copy(entry.path(), to.join(entry.file_name())).await?;
            }
        }
        tracing::info!("Duplicated project {} to {}", source, target);
        Ok(())
    }

    pub async fn delete_project(&self, name: &str) -> Result<(), StoreError> {
        let dir = self.existing_project(name).await?;
        fs::remove_dir_all(&dir).await?;
        tracing::info!("Deleted project {}", name);
        Ok(())
    }

    /// Create an empty workflow document, returning its file name
    pub async fn create_workflow(&self, project: &str, name: &str) -> Result<String, StoreError> {
        let path = self.workflow_path(project, name).await?;
        if fs::try_exists(&path).await? {
            return Err(StoreError::WorkflowExists(workflow_file_name(name)));
        }
        let empty = serde_json::json!({ "nodes": [], "wires": [] });
        fs::write(&path, serde_json::to_vec_pretty(&empty)?).await?;
        Ok(workflow_file_name(name))
    }

    /// Write a workflow document, replacing any previous content
    pub async fn save_workflow(
        &self,
        project: &str,
        workflow: &str,
        data: &serde_json::Value,
    ) -> Result<String, StoreError> {
        let path = self.workflow_path(project, workflow).await?;
        fs::write(&path, serde_json::to_vec_pretty(data)?).await?;
        tracing::debug!("Saved workflow {}/{}", project, workflow);
        Ok(workflow_file_name(workflow))
    }

    pub async fn load_workflow(
        &self,
        project: &str,
        workflow: &str,
    ) -> Result<serde_json::Value, StoreError> {
        let path = self.existing_workflow(project, workflow).await?;
        let bytes = fs::read(&path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    pub async fn rename_workflow(
        &self,
        project: &str,
        old: &str,
        new: &str,
    ) -> Result<(), StoreError> {
        let from = self.existing_workflow(project, old).await?;
        let to = self.workflow_path(project, new).await?;
        if fs::try_exists(&to).await? {
            return Err(StoreError::WorkflowExists(workflow_file_name(new)));
        }
        fs::rename(&from, &to).await?;
        Ok(())
    }

    pub async fn duplicate_workflow(
        &self,
        project: &str,
        source: &str,
        target: &str,
    ) -> Result<(), StoreError> {
        let from = self.existing_workflow(project, source).await?;
        let to = self.workflow_path(project, target).await?;
        if fs::try_exists(&to).await? {
            return Err(StoreError::WorkflowExists(workflow_file_name(target)));
        }
        fs::copy(&from, &to).await?;
        Ok(())
    }

    pub async fn delete_workflow(&self, project: &str, workflow: &str) -> Result<(), StoreError> {
        let path = self.existing_workflow(project, workflow).await?;
        fs::remove_file(&path).await?;
        Ok(())
    }

    fn project_dir(&self, name: &str) -> Result<PathBuf, StoreError> {
        validate_name(name)?;
        Ok(self.root.join(name.trim()))
    }

    async fn existing_project(&self, name: &str) -> Result<PathBuf, StoreError> {
        let dir = self.project_dir(name)?;
        if !fs::try_exists(&dir).await? {
            return Err(StoreError::ProjectNotFound(name.to_string()));
        }
        Ok(dir)
    }

    async fn workflow_path(&self, project: &str, workflow: &str) -> Result<PathBuf, StoreError> {
        let file = workflow_file_name(workflow);
        validate_name(&file)?;
        Ok(self.existing_project(project).await?.join(file))
    }

    async fn existing_workflow(&self, project: &str, workflow: &str) -> Result<PathBuf, StoreError> {
        let path = self.workflow_path(project, workflow).await?;
        if !fs::try_exists(&path).await? {
            return Err(StoreError::WorkflowNotFound(workflow_file_name(workflow)));
        }
        Ok(path)
    }
}

/// `name` with the workflow extension appended when missing
pub fn workflow_file_name(name: &str) -> String {
    let name = name.trim();
    if name.ends_with(WORKFLOW_EXTENSION) {
        name.to_string()
    } else {
        format!("{}{}", name, WORKFLOW_EXTENSION)
    }
}

fn validate_name(name: &str) -> Result<(), StoreError> {
    let trimmed = name.trim();
    let stem = trimmed.strip_suffix(WORKFLOW_EXTENSION).unwrap_or(trimmed);
    if stem.is_empty()
        || trimmed.starts_with('.')
        || trimmed.contains(['/', '\\', '\0'])
    {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    Ok(())
}
