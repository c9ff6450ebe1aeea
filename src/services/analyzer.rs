use std::collections::BTreeMap;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::config::Settings;
use crate::core::redis::RedisHandle;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const BODY_EXCERPT_CHARS: usize = 200;
const INSTRUCTOR_CACHE_PREFIX: &str = "analyzer:course-instructor:";

#[derive(Debug, Error)]
pub(crate) enum AnalyzerError {
    #[error("analyzer request timed out")]
    Timeout,
    #[error("analyzer request failed: {0}")]
    Transport(String),
    #[error("analyzer responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("analyzer returned malformed json: {0}")]
    MalformedJson(String),
    #[error("analyzer rejected the request: {0}")]
    Rejected(String),
}

impl AnalyzerError {
    /// Short label used for metrics and sync warnings.
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            AnalyzerError::Timeout => "timeout",
            AnalyzerError::Transport(_) => "transport",
            AnalyzerError::Status { .. } => "status",
            AnalyzerError::MalformedJson(_) => "malformed_json",
            AnalyzerError::Rejected(_) => "rejected",
        }
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AnalyzerError::Timeout
        } else {
            AnalyzerError::Transport(err.to_string())
        }
    }
}

/// Body of `POST /staff/update-student-marks`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct MarksUpdate {
    pub(crate) student_id: String,
    pub(crate) course_id: String,
    pub(crate) teacher_email: String,
    pub(crate) marks: BTreeMap<String, f64>,
}

impl MarksUpdate {
    pub(crate) fn tutorial(
        student_id: &str,
        course_id: &str,
        teacher_email: &str,
        tutorial_number: i32,
        scaled_score: f64,
    ) -> Self {
        Self {
            student_id: student_id.to_string(),
            course_id: course_id.to_string(),
            teacher_email: teacher_email.to_string(),
            marks: BTreeMap::from([(format!("tutorial{tutorial_number}"), scaled_score)]),
        }
    }
}

/// Operations this service consumes from the Academic Analyzer.
#[async_trait]
pub(crate) trait AnalyzerApi: Send + Sync {
    async fn enrolled_course_ids(&self, roll_number: &str) -> Result<Vec<String>, AnalyzerError>;

    async fn course_instructor_email(
        &self,
        course_id: &str,
    ) -> Result<Option<String>, AnalyzerError>;

    async fn update_student_marks(&self, update: &MarksUpdate) -> Result<(), AnalyzerError>;

    async fn ping(&self) -> Result<(), AnalyzerError>;
}

#[derive(Clone)]
pub(crate) struct AnalyzerClient {
    client: Client,
    base_url: String,
    request_timeout: Duration,
    lookup_timeout: Duration,
    cache: RedisHandle,
    cache_ttl_seconds: u64,
}

impl AnalyzerClient {
    pub(crate) fn from_settings(settings: &Settings, cache: RedisHandle) -> anyhow::Result<Self> {
        let analyzer = settings.analyzer();
        Self::new(
            &analyzer.base_url,
            Duration::from_secs(analyzer.request_timeout_seconds),
            Duration::from_secs(analyzer.lookup_timeout_seconds),
            cache,
            analyzer.cache_ttl_seconds,
        )
    }

    pub(crate) fn new(
        base_url: &str,
        request_timeout: Duration,
        lookup_timeout: Duration,
        cache: RedisHandle,
        cache_ttl_seconds: u64,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .context("Failed to build analyzer HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout,
            lookup_timeout,
            cache,
            cache_ttl_seconds,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send_json(
        &self,
        request: RequestBuilder,
        timeout: Duration,
    ) -> Result<Value, AnalyzerError> {
        let response =
            request.timeout(timeout).send().await.map_err(AnalyzerError::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(AnalyzerError::from_reqwest)?;

        if !status.is_success() {
            return Err(AnalyzerError::Status { status: status.as_u16(), body: excerpt(&body) });
        }

        serde_json::from_str::<Value>(&body)
            .map_err(|err| AnalyzerError::MalformedJson(format!("{err}: {}", excerpt(&body))))
    }

    async fn cached_instructor(&self, course_id: &str) -> Option<String> {
        let key = format!("{INSTRUCTOR_CACHE_PREFIX}{course_id}");
        match self.cache.get_string(&key).await {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(error = %err, course_id, "Instructor cache read failed");
                None
            }
        }
    }

    async fn remember_instructor(&self, course_id: &str, email: &str) {
        let key = format!("{INSTRUCTOR_CACHE_PREFIX}{course_id}");
        if let Err(err) = self.cache.set_string_ex(&key, email, self.cache_ttl_seconds).await {
            tracing::debug!(error = %err, course_id, "Instructor cache write failed");
        }
    }
}

#[async_trait]
impl AnalyzerApi for AnalyzerClient {
    async fn enrolled_course_ids(&self, roll_number: &str) -> Result<Vec<String>, AnalyzerError> {
        let request =
            self.client.get(self.url("/student/dashboard")).query(&[("rollno", roll_number)]);
        let body = self.send_json(request, self.lookup_timeout).await?;

        if !is_success(&body) {
            return Err(AnalyzerError::Rejected(message_of(&body)));
        }

        let courses = body
            .get("courses")
            .and_then(Value::as_array)
            .map(|courses| {
                courses
                    .iter()
                    .filter_map(|course| course.get("courseId").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(courses)
    }

    async fn course_instructor_email(
        &self,
        course_id: &str,
    ) -> Result<Option<String>, AnalyzerError> {
        if let Some(email) = self.cached_instructor(course_id).await {
            return Ok(Some(email));
        }

        let request =
            self.client.get(self.url("/staff/course-detail")).query(&[("courseId", course_id)]);
        let body = self.send_json(request, self.lookup_timeout).await?;

        if !is_success(&body) {
            return Ok(None);
        }

        let email = body
            .get("instructorEmail")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string);

        if let Some(email) = &email {
            self.remember_instructor(course_id, email).await;
        }

        Ok(email)
    }

    async fn update_student_marks(&self, update: &MarksUpdate) -> Result<(), AnalyzerError> {
        let request = self.client.post(self.url("/staff/update-student-marks")).json(update);
        let body = self.send_json(request, self.request_timeout).await?;

        if !is_success(&body) {
            return Err(AnalyzerError::Rejected(message_of(&body)));
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), AnalyzerError> {
        let response = self
            .client
            .get(self.url("/status"))
            .timeout(self.lookup_timeout)
            .send()
            .await
            .map_err(AnalyzerError::from_reqwest)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(AnalyzerError::Status { status: status.as_u16(), body: String::new() })
        }
    }
}

fn is_success(body: &Value) -> bool {
    body.get("success").and_then(Value::as_bool).unwrap_or(false)
}

fn message_of(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|message| !message.is_empty())
        .unwrap_or("Unknown error")
        .to_string()
}

fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::{Query, State};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use super::*;

    #[derive(Clone, Default)]
    struct Stub {
        received: Arc<Mutex<Vec<Value>>>,
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let addr = listener.local_addr().expect("stub addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{addr}")
    }

    fn client(base_url: &str, timeout: Duration) -> AnalyzerClient {
        let cache = RedisHandle::new("redis://127.0.0.1:1/0".to_string());
        AnalyzerClient::new(base_url, timeout, timeout, cache, 600).expect("client")
    }

    #[tokio::test]
    async fn update_student_marks_posts_camel_case_payload() {
        let stub = Stub::default();
        let router = Router::new()
            .route(
                "/staff/update-student-marks",
                post(|State(stub): State<Stub>, Json(body): Json<Value>| async move {
                    stub.received.lock().unwrap().push(body);
                    Json(json!({"success": true}))
                }),
            )
            .with_state(stub.clone());
        let base_url = spawn(router).await;

        let update = MarksUpdate::tutorial("21MX101", "CS101", "prof@example.edu", 3, 7.5);
        client(&base_url, Duration::from_secs(2)).update_student_marks(&update).await.unwrap();

        let received = stub.received.lock().unwrap().clone();
        assert_eq!(
            received,
            vec![json!({
                "studentId": "21MX101",
                "courseId": "CS101",
                "teacherEmail": "prof@example.edu",
                "marks": {"tutorial3": 7.5}
            })]
        );
    }

    #[tokio::test]
    async fn update_student_marks_maps_failures() {
        let router = Router::new()
            .route(
                "/staff/update-student-marks",
                post(|| async { Json(json!({"success": false, "message": "unknown student"})) }),
            )
            .route("/broken/staff/update-student-marks", post(|| async { "<html>oops</html>" }))
            .route(
                "/down/staff/update-student-marks",
                post(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
            );
        let base_url = spawn(router).await;
        let update = MarksUpdate::tutorial("21MX101", "CS101", "prof@example.edu", 1, 5.0);

        let rejected =
            client(&base_url, Duration::from_secs(2)).update_student_marks(&update).await;
        assert!(matches!(rejected, Err(AnalyzerError::Rejected(ref message)) if message == "unknown student"));

        let malformed = client(&format!("{base_url}/broken"), Duration::from_secs(2))
            .update_student_marks(&update)
            .await;
        assert!(matches!(malformed, Err(AnalyzerError::MalformedJson(_))));

        let status = client(&format!("{base_url}/down"), Duration::from_secs(2))
            .update_student_marks(&update)
            .await;
        assert!(matches!(status, Err(AnalyzerError::Status { status: 502, .. })));
    }

    #[tokio::test]
    async fn slow_analyzer_times_out() {
        let router = Router::new().route(
            "/staff/update-student-marks",
            post(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!({"success": true}))
            }),
        );
        let base_url = spawn(router).await;
        let update = MarksUpdate::tutorial("21MX101", "CS101", "prof@example.edu", 1, 5.0);

        let result =
            client(&base_url, Duration::from_millis(200)).update_student_marks(&update).await;

        let err = result.unwrap_err();
        assert!(matches!(err, AnalyzerError::Timeout));
        assert_eq!(err.kind(), "timeout");
    }

    #[tokio::test]
    async fn unreachable_analyzer_is_a_transport_error() {
        let result = client("http://127.0.0.1:1", Duration::from_secs(1)).ping().await;
        assert!(matches!(result, Err(AnalyzerError::Transport(_)) | Err(AnalyzerError::Timeout)));
    }

    #[tokio::test]
    async fn enrolled_course_ids_reads_dashboard_courses() {
        let router = Router::new().route(
            "/student/dashboard",
            get(|Query(params): Query<BTreeMap<String, String>>| async move {
                if params.get("rollno").map(String::as_str) == Some("21MX101") {
                    Json(json!({
                        "success": true,
                        "courses": [{"courseId": "CS101"}, {"courseId": "MA201"}, {"name": "x"}]
                    }))
                } else {
                    Json(json!({"success": false, "message": "no such student"}))
                }
            }),
        );
        let base_url = spawn(router).await;
        let analyzer = client(&base_url, Duration::from_secs(2));

        let courses = analyzer.enrolled_course_ids("21MX101").await.unwrap();
        assert_eq!(courses, vec!["CS101".to_string(), "MA201".to_string()]);

        let unknown = analyzer.enrolled_course_ids("nobody").await;
        assert!(matches!(unknown, Err(AnalyzerError::Rejected(_))));
    }

    #[tokio::test]
    async fn course_instructor_email_requires_success_flag() {
        let router = Router::new().route(
            "/staff/course-detail",
            get(|Query(params): Query<BTreeMap<String, String>>| async move {
                match params.get("courseId").map(String::as_str) {
                    Some("CS101") => {
                        Json(json!({"success": true, "instructorEmail": "prof@example.edu"}))
                    }
                    Some("MA201") => Json(json!({"success": true, "instructorEmail": ""})),
                    _ => Json(json!({"success": false, "instructorEmail": "ghost@example.edu"})),
                }
            }),
        );
        let base_url = spawn(router).await;
        let analyzer = client(&base_url, Duration::from_secs(2));

        assert_eq!(
            analyzer.course_instructor_email("CS101").await.unwrap(),
            Some("prof@example.edu".to_string())
        );
        assert_eq!(analyzer.course_instructor_email("MA201").await.unwrap(), None);
        assert_eq!(analyzer.course_instructor_email("XX999").await.unwrap(), None);
    }

    #[tokio::test]
    async fn ping_checks_status_endpoint() {
        let router = Router::new().route("/status", get(|| async { "ok" }));
        let base_url = spawn(router).await;

        client(&base_url, Duration::from_secs(2)).ping().await.unwrap();

        let missing = client(&format!("{base_url}/nope"), Duration::from_secs(2)).ping().await;
        assert!(matches!(missing, Err(AnalyzerError::Status { status: 404, .. })));
    }
}
