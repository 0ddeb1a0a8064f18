use crate::api::attendance::ScanRequest;
use crate::api::faces::{DepartmentListResponse, FaceListResponse, RegisterFace};
use crate::model::attendance::{AttendanceEntry, AttendanceStatus};
use crate::model::face::FaceSummary;
use crate::service::reports::{DayReport, HistoryReport, StatusCounts};
use crate::service::scan::{ScanOutcome, ScanResponse};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Face Attendance API",
        version = "0.1.0",
        description = r#"
## Face Recognition Attendance

The browser computes a face descriptor with face-api.js and posts it here.
The server matches it against registered templates (Euclidean distance,
threshold 0.6) and records attendance against office hours.

### Key Features
- **Faces**: register, list and delete templates
- **Scans**: identify, check in, check out
- **Reports**: today's board, per-status counts, filtered history

### Response Format
- JSON everywhere; errors are `{"error": "..."}`
- Times are local server time, `HH:MM:SS`; dates are `YYYY-MM-DD`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::faces::list_faces,
        crate::api::faces::register_face,
        crate::api::faces::delete_face,
        crate::api::faces::list_departments,

        crate::api::attendance::recognize,
        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::today,
        crate::api::attendance::stats,
        crate::api::attendance::history
    ),
    components(
        schemas(
            RegisterFace,
            FaceSummary,
            FaceListResponse,
            DepartmentListResponse,
            ScanRequest,
            ScanOutcome,
            ScanResponse,
            AttendanceStatus,
            AttendanceEntry,
            StatusCounts,
            DayReport,
            HistoryReport
        )
    ),
    tags(
        (name = "Faces", description = "Face template registry"),
        (name = "Attendance", description = "Scans and attendance reports"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn documents_every_endpoint() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/faces",
            "/api/faces/{face_id}",
            "/api/departments",
            "/api/recognize",
            "/api/attendance/check-in",
            "/api/attendance/check-out",
            "/api/attendance/today",
            "/api/attendance/stats",
            "/api/attendance",
        ] {
            assert!(doc.paths.paths.contains_key(path), "{path} missing");
        }
    }
}
