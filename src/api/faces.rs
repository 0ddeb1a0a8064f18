use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::SqlitePool;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::model::face::{FaceSummary, NewFace};
use crate::service::registry;
use crate::store::faces;
use crate::utils::clock::Clock;
use crate::utils::descriptor_cache::DescriptorCache;

const MAX_LABEL_LEN: usize = 100;

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterFace {
    #[schema(example = "Ana Silva")]
    pub label: Option<String>,
    #[schema(example = "EMP-001")]
    pub employee_id: Option<String>,
    #[schema(example = "Engineering")]
    pub department: Option<String>,
    /// Averaged descriptor from several client-side samples.
    #[schema(example = json!([0.012, -0.094, 0.131]))]
    pub descriptor: Option<Vec<f32>>,
    #[schema(example = 0.93)]
    pub quality: Option<f32>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RegisterFace {
    pub fn into_new_face(self) -> AppResult<NewFace> {
        let label = non_blank(self.label)
            .ok_or_else(|| AppError::BadRequest("label and descriptor required".into()))?;
        if label.chars().count() > MAX_LABEL_LEN {
            return Err(AppError::BadRequest(format!(
                "label must be at most {MAX_LABEL_LEN} characters"
            )));
        }

        let descriptor =
            super::require_descriptor(self.descriptor, "label and descriptor required")?;

        Ok(NewFace {
            label,
            employee_id: non_blank(self.employee_id),
            department: non_blank(self.department),
            descriptor,
            quality: self.quality,
        })
    }
}

#[derive(Serialize, ToSchema)]
pub struct FaceListResponse {
    pub faces: Vec<FaceSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct DepartmentListResponse {
    #[schema(example = json!(["Engineering", "Operations"]))]
    pub departments: Vec<String>,
}

/// List registered faces
#[utoipa::path(
    get,
    path = "/api/faces",
    responses(
        (status = 200, description = "Registered faces, newest first", body = FaceListResponse),
        (status = 500, description = "Internal server error")
    ),
    tag = "Faces"
)]
pub async fn list_faces(pool: web::Data<SqlitePool>) -> AppResult<HttpResponse> {
    let faces = faces::list_summaries(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(FaceListResponse { faces }))
}

/// Register a face
#[utoipa::path(
    post,
    path = "/api/faces",
    request_body = RegisterFace,
    responses(
        (status = 201, description = "Face registered", body = FaceSummary),
        (status = 400, description = "Missing label or descriptor", body = Object, example = json!({
            "error": "label and descriptor required"
        })),
        (status = 409, description = "Label already registered", body = Object, example = json!({
            "error": "\"Ana Silva\" is already registered"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Faces"
)]
pub async fn register_face(
    pool: web::Data<SqlitePool>,
    cache: web::Data<DescriptorCache>,
    clock: web::Data<Clock>,
    payload: web::Json<RegisterFace>,
) -> AppResult<HttpResponse> {
    let face = payload.into_inner().into_new_face()?;
    let saved = registry::register(pool.get_ref(), cache.get_ref(), &face, clock.now()).await?;
    Ok(HttpResponse::Created().json(saved))
}

/// Delete a face and its attendance history
#[utoipa::path(
    delete,
    path = "/api/faces/{face_id}",
    params(
        ("face_id" = i64, Path, description = "Face ID")
    ),
    responses(
        (status = 200, description = "Deleted", body = Object, example = json!({
            "success": true
        })),
        (status = 404, description = "Face not found", body = Object, example = json!({
            "error": "Face not found"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Faces"
)]
pub async fn delete_face(
    pool: web::Data<SqlitePool>,
    cache: web::Data<DescriptorCache>,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let face_id = path.into_inner();
    registry::remove(pool.get_ref(), cache.get_ref(), face_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// List departments
#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "Distinct departments of registered faces", body = DepartmentListResponse)
    ),
    tag = "Faces"
)]
pub async fn list_departments(pool: web::Data<SqlitePool>) -> AppResult<HttpResponse> {
    let departments = faces::departments(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(DepartmentListResponse { departments }))
}
