use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::error::{AppError, AppResult};
use crate::model::face::{FaceRow, FaceSummary, FaceTemplate, NewFace};

/// Every readable template with its descriptor, in storage order.
///
/// A row whose descriptor no longer parses is logged and left out so the rest
/// of the gallery stays matchable.
pub async fn load_templates(pool: &SqlitePool) -> AppResult<Vec<FaceTemplate>> {
    let rows = sqlx::query_as::<_, FaceRow>(
        r#"
        SELECT id, label, employee_id, department, descriptor, quality, registered_at
        FROM faces
        ORDER BY id ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    let templates = rows
        .into_iter()
        .filter_map(|row| {
            let id = row.id;
            match FaceTemplate::try_from(row) {
                Ok(template) => Some(template),
                Err(e) => {
                    tracing::warn!(face_id = id, error = %e, "Skipping face with unreadable descriptor");
                    None
                }
            }
        })
        .collect();

    Ok(templates)
}

pub async fn list_summaries(pool: &SqlitePool) -> AppResult<Vec<FaceSummary>> {
    let faces = sqlx::query_as::<_, FaceSummary>(
        r#"
        SELECT id, label, employee_id, department, quality, registered_at
        FROM faces
        ORDER BY registered_at DESC, id DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(faces)
}

pub async fn count(pool: &SqlitePool) -> AppResult<i64> {
    let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM faces")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

pub async fn label_exists(pool: &SqlitePool, label: &str) -> AppResult<bool> {
    let found = sqlx::query_scalar::<_, i64>("SELECT id FROM faces WHERE label = ?")
        .bind(label)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

fn duplicate(label: &str) -> AppError {
    AppError::Conflict(format!("\"{label}\" is already registered"))
}

/// Insert a new template; an existing label is a conflict and leaves storage untouched.
pub async fn insert(
    pool: &SqlitePool,
    face: &NewFace,
    registered_at: NaiveDateTime,
) -> AppResult<FaceSummary> {
    if label_exists(pool, &face.label).await? {
        return Err(duplicate(&face.label));
    }

    let descriptor = serde_json::to_string(&face.descriptor)
        .map_err(|e| AppError::Internal(format!("descriptor serialization failed: {e}")))?;

    let result = sqlx::query(
        r#"
        INSERT INTO faces (label, employee_id, department, descriptor, quality, registered_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&face.label)
    .bind(&face.employee_id)
    .bind(&face.department)
    .bind(descriptor)
    .bind(face.quality.map(f64::from))
    .bind(registered_at)
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(FaceSummary {
            id: done.last_insert_rowid(),
            label: face.label.clone(),
            employee_id: face.employee_id.clone(),
            department: face.department.clone(),
            quality: face.quality.map(f64::from),
            registered_at,
        }),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(duplicate(&face.label))
        }
        Err(e) => Err(e.into()),
    }
}

/// Returns false when no template had that id. Attendance rows go with it.
pub async fn delete(pool: &SqlitePool, face_id: i64) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM faces WHERE id = ?")
        .bind(face_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn departments(pool: &SqlitePool) -> AppResult<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        r#"
        SELECT DISTINCT department
        FROM faces
        WHERE department IS NOT NULL AND TRIM(department) <> ''
        ORDER BY department ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(names)
}
