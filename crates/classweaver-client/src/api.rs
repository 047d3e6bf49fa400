//! Typed endpoint wrappers.
//!
//! One method per backend endpoint, all flowing through the request
//! pipeline in [`crate::http`]. Synthetic knowledge-base ids (the
//! `__default__` entry and friends) never leave the client: they are
//! filtered out of outgoing payloads so the backend only ever sees real ids.

use reqwest::multipart::{Form, Part};
use serde_json::json;

use classweaver_core::error::Result;
use classweaver_core::schema::{
    DeletedCount, KnowledgeBase, KnowledgeBaseListResponse, KnowledgeDocumentListResponse,
    KnowledgeQaResponse, KnowledgeSearchResponse, KnowledgeUploadResponse, LessonEventRequest,
    LessonTimelinePayload, PrestudyJobTicket, PrestudyResponse, QuizAnswer, QuizStartResponse,
    QuizSubmitResponse, RagSearchRequest, RecommendationTaskResponse,
};
use classweaver_core::user::{SignInRequest, SignUpRequest, UserProfile};

use crate::http::{ApiClient, RequestOptions};

/// Default content locale for generation endpoints.
pub const DEFAULT_CONTENT_LOCALE: &str = "zh-CN";

/// Filters out absent, empty, and synthetic (`__`-prefixed) base ids.
fn usable_base_id(base_id: Option<&str>) -> Option<&str> {
    base_id.filter(|id| !id.is_empty() && !id.starts_with("__"))
}

/// Percent-encodes one path segment.
fn encode_path_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

impl ApiClient {
    // -- Prestudy -----------------------------------------------------------

    /// Submits raw text for prestudy ingestion.
    pub async fn create_prestudy_from_text(
        &self,
        text: &str,
        base_id: Option<&str>,
        locale: Option<&str>,
    ) -> Result<PrestudyJobTicket> {
        let mut payload = json!({
            "locale": locale.unwrap_or(DEFAULT_CONTENT_LOCALE),
            "text": text,
        });
        if let Some(base_id) = usable_base_id(base_id) {
            payload["base_id"] = json!(base_id);
        }
        self.request_required(
            "/api/prestudy/from-text/",
            RequestOptions::post().json(&payload)?,
        )
        .await
    }

    /// Uploads a presentation file for prestudy ingestion.
    pub async fn create_prestudy_from_file(
        &self,
        file_name: &str,
        bytes: Vec<u8>,
        base_id: Option<&str>,
        locale: Option<&str>,
    ) -> Result<PrestudyJobTicket> {
        let mut form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text(
                "locale",
                locale.unwrap_or(DEFAULT_CONTENT_LOCALE).to_string(),
            );
        if let Some(base_id) = usable_base_id(base_id) {
            form = form.text("base_id", base_id.to_string());
        }
        self.request_required(
            "/api/prestudy/from-ppt/",
            RequestOptions::post().multipart(form),
        )
        .await
    }

    /// Fetches the full payload of a prestudy job.
    pub async fn get_prestudy(&self, job_id: &str) -> Result<PrestudyResponse> {
        let path = format!("/api/prestudy/{}/", encode_path_segment(job_id));
        self.request_required(&path, RequestOptions::get()).await
    }

    /// Polls the ticket of a running job.
    pub async fn get_job_status(&self, job_id: &str) -> Result<PrestudyJobTicket> {
        let path = format!("/api/jobs/{}/", encode_path_segment(job_id));
        self.request_required(&path, RequestOptions::get()).await
    }

    // -- Quiz ---------------------------------------------------------------

    /// Starts a quiz session for a completed job.
    pub async fn start_quiz(&self, job_id: &str) -> Result<QuizStartResponse> {
        let payload = json!({ "job_id": job_id, "locale": DEFAULT_CONTENT_LOCALE });
        self.request_required("/api/quiz/start/", RequestOptions::post().json(&payload)?)
            .await
    }

    /// Submits quiz answers for scoring.
    pub async fn submit_quiz(
        &self,
        session_id: &str,
        answers: &[QuizAnswer],
    ) -> Result<QuizSubmitResponse> {
        let payload = json!({ "session_id": session_id, "answers": answers });
        self.request_required("/api/quiz/submit/", RequestOptions::post().json(&payload)?)
            .await
    }

    // -- Knowledge ----------------------------------------------------------

    /// Runs a retrieval search across the knowledge store.
    pub async fn search_knowledge(
        &self,
        request: &RagSearchRequest,
    ) -> Result<KnowledgeSearchResponse> {
        let mut payload = serde_json::to_value(request)?;
        payload["locale"] = json!(DEFAULT_CONTENT_LOCALE);
        self.request_required("/api/kb/search/", RequestOptions::post().json(&payload)?)
            .await
    }

    /// Asks a grounded question against one knowledge base.
    pub async fn knowledge_qa(
        &self,
        question: &str,
        base_id: Option<&str>,
        top_k: u32,
    ) -> Result<KnowledgeQaResponse> {
        let mut payload = json!({ "question": question, "top_k": top_k });
        if let Some(base_id) = usable_base_id(base_id) {
            payload["base_id"] = json!(base_id);
        }
        self.request_required("/api/kb/qa/", RequestOptions::post().json(&payload)?)
            .await
    }

    /// Uploads one or more documents into a knowledge base.
    pub async fn upload_knowledge(
        &self,
        files: Vec<(String, Vec<u8>)>,
        base_id: Option<&str>,
    ) -> Result<KnowledgeUploadResponse> {
        let mut form = Form::new();
        for (name, bytes) in files {
            form = form.part("file", Part::bytes(bytes).file_name(name));
        }
        if let Some(base_id) = usable_base_id(base_id) {
            form = form.text("base_id", base_id.to_string());
        }
        self.request_required("/api/kb/upload/", RequestOptions::post().multipart(form))
            .await
    }

    /// Lists ingested documents, optionally scoped to one base.
    pub async fn list_knowledge_documents(
        &self,
        base_id: Option<&str>,
    ) -> Result<KnowledgeDocumentListResponse> {
        let path = match usable_base_id(base_id) {
            Some(base_id) => format!("/api/kb/documents/?base_id={}", encode_path_segment(base_id)),
            None => "/api/kb/documents/".to_string(),
        };
        self.request_required(&path, RequestOptions::get()).await
    }

    /// Deletes one ingested document.
    pub async fn delete_knowledge_document(&self, doc_id: &str) -> Result<DeletedCount> {
        let path = format!("/api/kb/documents/{}/", encode_path_segment(doc_id));
        self.request_required(&path, RequestOptions::delete()).await
    }

    /// Deletes every ingested document.
    pub async fn clear_knowledge_documents(&self) -> Result<DeletedCount> {
        self.request_required("/api/kb/documents/", RequestOptions::delete())
            .await
    }

    /// Lists the knowledge bases.
    pub async fn list_knowledge_bases(&self) -> Result<KnowledgeBaseListResponse> {
        self.request_required("/api/kb/bases/", RequestOptions::get())
            .await
    }

    /// Creates a knowledge base.
    pub async fn create_knowledge_base(
        &self,
        name: &str,
        description: Option<&str>,
    ) -> Result<KnowledgeBase> {
        let payload = json!({ "name": name, "description": description.unwrap_or("") });
        self.request_required("/api/kb/bases/", RequestOptions::post().json(&payload)?)
            .await
    }

    /// Deletes a knowledge base.
    pub async fn delete_knowledge_base(&self, base_id: &str) -> Result<()> {
        let path = format!("/api/kb/bases/{}/", encode_path_segment(base_id));
        self.request_unit(&path, RequestOptions::delete()).await
    }

    // -- Lesson timeline ----------------------------------------------------

    /// Fetches a lesson plan's event timeline.
    pub async fn get_lesson_timeline(&self, plan_id: i64) -> Result<LessonTimelinePayload> {
        let path = format!("/api/lesson/{plan_id}/timeline/");
        self.request_required(&path, RequestOptions::get()).await
    }

    /// Appends an event to a lesson plan's timeline.
    pub async fn post_lesson_event(&self, plan_id: i64, event: &LessonEventRequest) -> Result<()> {
        let path = format!("/api/lesson/{plan_id}/events/");
        self.request_unit(&path, RequestOptions::post().json(event)?)
            .await
    }

    // -- Recommendations ----------------------------------------------------

    /// Triggers recommendation generation for a job.
    pub async fn trigger_recommendations(
        &self,
        job_id: &str,
        session_id: Option<&str>,
    ) -> Result<RecommendationTaskResponse> {
        let mut payload = json!({ "job_id": job_id, "locale": DEFAULT_CONTENT_LOCALE });
        if let Some(session_id) = session_id {
            payload["session_id"] = json!(session_id);
        }
        self.request_required(
            "/api/recommendations/",
            RequestOptions::post().json(&payload)?,
        )
        .await
    }

    // -- Auth ---------------------------------------------------------------

    /// Registers a new account.
    pub async fn register(&self, request: &SignUpRequest) -> Result<UserProfile> {
        self.request_required("/api/auth/register/", RequestOptions::post().json(request)?)
            .await
    }

    /// Signs in with username and password.
    pub async fn login(&self, request: &SignInRequest) -> Result<UserProfile> {
        self.request_required("/api/auth/login/", RequestOptions::post().json(request)?)
            .await
    }

    /// Signs out the current session.
    pub async fn logout(&self) -> Result<()> {
        self.request_unit("/api/auth/logout/", RequestOptions::post())
            .await
    }

    /// Looks up the currently authenticated user.
    pub async fn fetch_current_user(&self) -> Result<UserProfile> {
        self.request_required("/api/auth/me/", RequestOptions::get())
            .await
    }

    /// Ensures the CSRF cookie is present before a burst of mutating calls.
    pub async fn prime_csrf_token(&self) {
        let _ = self.csrf().ensure_token().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usable_base_id_filters_synthetic_ids() {
        assert_eq!(usable_base_id(Some("12")), Some("12"));
        assert_eq!(usable_base_id(Some("__default__")), None);
        assert_eq!(usable_base_id(Some("")), None);
        assert_eq!(usable_base_id(None), None);
    }

    #[test]
    fn test_encode_path_segment() {
        assert_eq!(encode_path_segment("doc-1_a.b~c"), "doc-1_a.b~c");
        assert_eq!(encode_path_segment("a/b c"), "a%2Fb%20c");
        assert_eq!(encode_path_segment("号"), "%E5%8F%B7");
    }
}
