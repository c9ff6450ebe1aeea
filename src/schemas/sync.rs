use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::repositories::attempts::CourseSyncCounts;

#[derive(Debug, Default, Deserialize, Validate)]
pub(crate) struct SyncPendingRequest {
    #[serde(default)]
    #[validate(range(min = 1, max = 500, message = "limit must be between 1 and 500"))]
    pub(crate) limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(crate) struct SyncAttemptResponse {
    pub(crate) attempt_id: i64,
    pub(crate) success: bool,
    pub(crate) already_synced: bool,
    pub(crate) marks_synced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) scaled_score: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) teacher_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) error: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CourseSyncStatus {
    pub(crate) course_id: String,
    pub(crate) total: i64,
    pub(crate) synced: i64,
    pub(crate) unsynced: i64,
}

impl From<CourseSyncCounts> for CourseSyncStatus {
    fn from(counts: CourseSyncCounts) -> Self {
        Self {
            course_id: counts.course_id,
            total: counts.total,
            synced: counts.synced,
            unsynced: counts.unsynced,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SyncStatusResponse {
    pub(crate) analyzer_available: bool,
    pub(crate) total: i64,
    pub(crate) synced: i64,
    pub(crate) unsynced: i64,
    pub(crate) courses: Vec<CourseSyncStatus>,
}

impl SyncStatusResponse {
    pub(crate) fn new(analyzer_available: bool, counts: Vec<CourseSyncCounts>) -> Self {
        let courses: Vec<CourseSyncStatus> = counts.into_iter().map(Into::into).collect();
        Self {
            analyzer_available,
            total: courses.iter().map(|course| course.total).sum(),
            synced: courses.iter().map(|course| course.synced).sum(),
            unsynced: courses.iter().map(|course| course.unsynced).sum(),
            courses,
        }
    }
}
