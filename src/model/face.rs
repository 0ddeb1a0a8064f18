use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A registered identity with its face descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceTemplate {
    pub id: i64,
    pub label: String,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub descriptor: Vec<f32>,
    pub quality: Option<f32>,
    pub registered_at: NaiveDateTime,
}

/// Raw `faces` row; the descriptor is stored as a JSON array.
#[derive(Debug, sqlx::FromRow)]
pub struct FaceRow {
    pub id: i64,
    pub label: String,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub descriptor: String,
    pub quality: Option<f64>,
    pub registered_at: NaiveDateTime,
}

impl TryFrom<FaceRow> for FaceTemplate {
    type Error = serde_json::Error;

    fn try_from(row: FaceRow) -> Result<Self, Self::Error> {
        Ok(FaceTemplate {
            id: row.id,
            label: row.label,
            employee_id: row.employee_id,
            department: row.department,
            descriptor: serde_json::from_str(&row.descriptor)?,
            quality: row.quality.map(|q| q as f32),
            registered_at: row.registered_at,
        })
    }
}

/// Template metadata without the descriptor, as listed by the API.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "label": "Ana Silva",
    "employee_id": "EMP-001",
    "department": "Engineering",
    "quality": 0.93,
    "registered_at": "2026-01-05T09:12:44"
}))]
pub struct FaceSummary {
    pub id: i64,
    pub label: String,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub quality: Option<f64>,
    #[schema(value_type = String, format = "date-time")]
    pub registered_at: NaiveDateTime,
}

impl From<&FaceTemplate> for FaceSummary {
    fn from(face: &FaceTemplate) -> Self {
        FaceSummary {
            id: face.id,
            label: face.label.clone(),
            employee_id: face.employee_id.clone(),
            department: face.department.clone(),
            quality: face.quality.map(f64::from),
            registered_at: face.registered_at,
        }
    }
}

/// Validated registration input.
#[derive(Debug, Clone)]
pub struct NewFace {
    pub label: String,
    pub employee_id: Option<String>,
    pub department: Option<String>,
    pub descriptor: Vec<f32>,
    pub quality: Option<f32>,
}
