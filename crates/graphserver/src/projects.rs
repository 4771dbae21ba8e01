//! Project and workflow persistence endpoints used by the editor.

use crate::AppState;
use actix_web::{delete, get, post, put, web, HttpResponse};
use graphruntime::StoreError;
use serde::{Deserialize, Serialize};
use tracing::error;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Deserialize)]
struct CreateProjectRequest {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DuplicateProjectRequest {
    source_project: String,
    target_project: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameProjectRequest {
    old_name: String,
    new_name: String,
}

#[derive(Debug, Deserialize)]
struct DeleteProjectRequest {
    project: String,
}

#[derive(Debug, Deserialize)]
struct CreateWorkflowRequest {
    project: String,
    name: String,
}

#[derive(Debug, Deserialize)]
struct SaveWorkflowRequest {
    project: String,
    workflow: String,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DuplicateWorkflowRequest {
    project: String,
    source_workflow: String,
    target_workflow: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameWorkflowRequest {
    project: String,
    old_name: String,
    new_name: String,
}

#[derive(Debug, Deserialize)]
struct DeleteWorkflowRequest {
    project: String,
    workflow: String,
}

pub(crate) fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list_projects)
        .service(create_project)
        .service(duplicate_project)
        .service(rename_project)
        .service(delete_project)
        .service(create_workflow)
        .service(save_workflow)
        .service(duplicate_workflow)
        .service(rename_workflow)
        .service(delete_workflow)
        .service(get_workflow);
}

fn store_error(e: StoreError) -> HttpResponse {
    let body = ErrorResponse {
        error: e.to_string(),
    };
    match e {
        StoreError::InvalidName(_) => HttpResponse::BadRequest().json(body),
        StoreError::ProjectNotFound(_) | StoreError::WorkflowNotFound(_) => {
            HttpResponse::NotFound().json(body)
        }
        StoreError::ProjectExists(_) | StoreError::WorkflowExists(_) => {
            HttpResponse::Conflict().json(body)
        }
        StoreError::Io(_) | StoreError::Serialization(_) => {
            error!("Project store failure: {}", body.error);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn message(text: impl Into<String>) -> serde_json::Value {
    serde_json::json!({ "message": text.into() })
}

#[get("/api/projects")]
async fn list_projects(data: web::Data<AppState>) -> HttpResponse {
    match data.store.list_projects().await {
        Ok(projects) => HttpResponse::Ok().json(projects),
        Err(e) => store_error(e),
    }
}

#[post("/api/projects")]
async fn create_project(
    data: web::Data<AppState>,
    req: web::Json<CreateProjectRequest>,
) -> HttpResponse {
    match data.store.create_project(&req.name).await {
        Ok(()) => HttpResponse::Created().json(message("Project created")),
        Err(e) => store_error(e),
    }
}

#[post("/api/projects/duplicate")]
async fn duplicate_project(
    data: web::Data<AppState>,
    req: web::Json<DuplicateProjectRequest>,
) -> HttpResponse {
    match data
        .store
        .duplicate_project(&req.source_project, &req.target_project)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(message("Project duplicated")),
        Err(e) => store_error(e),
    }
}

#[put("/api/projects/rename")]
async fn rename_project(
    data: web::Data<AppState>,
    req: web::Json<RenameProjectRequest>,
) -> HttpResponse {
    match data.store.rename_project(&req.old_name, &req.new_name).await {
        Ok(()) => HttpResponse::Ok().json(message("Project renamed")),
        Err(e) => store_error(e),
    }
}

#[delete("/api/projects/delete")]
async fn delete_project(
    data: web::Data<AppState>,
    req: web::Json<DeleteProjectRequest>,
) -> HttpResponse {
    match data.store.delete_project(&req.project).await {
        Ok(()) => HttpResponse::Ok().json(message("Project deleted")),
        Err(e) => store_error(e),
    }
}

#[post("/api/workflows")]
async fn create_workflow(
    data: web::Data<AppState>,
    req: web::Json<CreateWorkflowRequest>,
) -> HttpResponse {
    match data.store.create_workflow(&req.project, &req.name).await {
        Ok(file) => HttpResponse::Created().json(serde_json::json!({
            "message": "Workflow created",
            "workflow": file,
        })),
        Err(e) => store_error(e),
    }
}

#[post("/api/workflows/save")]
async fn save_workflow(
    data: web::Data<AppState>,
    req: web::Json<SaveWorkflowRequest>,
) -> HttpResponse {
    match data
        .store
        .save_workflow(&req.project, &req.workflow, &req.data)
        .await
    {
        Ok(file) => HttpResponse::Ok().json(serde_json::json!({
            "message": "Workflow saved",
            "workflow": file,
        })),
        Err(e) => store_error(e),
    }
}

#[get("/api/workflows/{project}/{workflow}")]
async fn get_workflow(
    data: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> HttpResponse {
    let (project, workflow) = path.into_inner();
    match data.store.load_workflow(&project, &workflow).await {
        Ok(doc) => HttpResponse::Ok().json(doc),
        Err(e) => store_error(e),
    }
}

#[post("/api/workflows/duplicate")]
async fn duplicate_workflow(
    data: web::Data<AppState>,
    req: web::Json<DuplicateWorkflowRequest>,
) -> HttpResponse {
    match data
        .store
        .duplicate_workflow(&req.project, &req.source_workflow, &req.target_workflow)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(message("Workflow duplicated")),
        Err(e) => store_error(e),
    }
}

#[put("/api/workflows/rename")]
async fn rename_workflow(
    data: web::Data<AppState>,
    req: web::Json<RenameWorkflowRequest>,
) -> HttpResponse {
    match data
        .store
        .rename_workflow(&req.project, &req.old_name, &req.new_name)
        .await
    {
        Ok(()) => HttpResponse::Ok().json(message("Workflow renamed")),
        Err(e) => store_error(e),
    }
}

#[delete("/api/workflows/delete")]
async fn delete_workflow(
    data: web::Data<AppState>,
    req: web::Json<DeleteWorkflowRequest>,
) -> HttpResponse {
    match data.store.delete_workflow(&req.project, &req.workflow).await {
        Ok(()) => HttpResponse::Ok().json(message("Workflow deleted")),
        Err(e) => store_error(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use graphruntime::{GraphRuntime, ProjectStore, RuntimeConfig};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn state(root: &std::path::Path) -> web::Data<AppState> {
        let runtime = GraphRuntime::with_registry(
            Arc::new(graphnodes::standard_registry()),
            RuntimeConfig::default(),
        );
        web::Data::new(AppState::new(
            Arc::new(runtime),
            ProjectStore::new(root),
            Duration::from_secs(15),
        ))
    }

    #[actix_web::test]
    async fn project_and_workflow_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(dir.path()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/projects")
            .set_json(json!({"name": "demo"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/workflows")
            .set_json(json!({"project": "demo", "name": "adder"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["workflow"], "adder.json");

        let doc = json!({"nodes": [{"id": "1", "type": "Integer Node"}], "wires": []});
        let req = test::TestRequest::post()
            .uri("/api/workflows/save")
            .set_json(json!({"project": "demo", "workflow": "adder.json", "data": doc}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/workflows/demo/adder.json")
            .to_request();
        let loaded: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(loaded, doc);

        let req = test::TestRequest::put()
            .uri("/api/workflows/rename")
            .set_json(json!({"project": "demo", "oldName": "adder", "newName": "sum"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::post()
            .uri("/api/projects/duplicate")
            .set_json(json!({"sourceProject": "demo", "targetProject": "copy"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri("/api/projects").to_request();
        let projects: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            projects,
            json!([
                {"name": "copy", "workflows": ["sum.json"]},
                {"name": "demo", "workflows": ["sum.json"]}
            ])
        );

        let req = test::TestRequest::delete()
            .uri("/api/projects/delete")
            .set_json(json!({"project": "copy"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        assert!(!dir.path().join("copy").exists());
    }

    #[actix_web::test]
    async fn maps_store_errors_to_statuses() {
        let dir = tempfile::tempdir().unwrap();
        let app = test::init_service(
            App::new()
                .app_data(state(dir.path()))
                .configure(configure),
        )
        .await;

        let create = |name: &str| {
            test::TestRequest::post()
                .uri("/api/projects")
                .set_json(json!({ "name": name }))
                .to_request()
        };

        assert_eq!(test::call_service(&app, create("demo")).await.status(), StatusCode::CREATED);
        assert_eq!(test::call_service(&app, create("demo")).await.status(), StatusCode::CONFLICT);
        assert_eq!(test::call_service(&app, create("../up")).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/workflows/demo/missing.json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: serde_json::Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("missing.json"));
    }
}
