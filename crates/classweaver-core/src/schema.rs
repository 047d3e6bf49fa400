//! Wire types for the ClassWeaver HTTP API.
//!
//! Each type mirrors one JSON request or response body. Response types lean
//! on `#[serde(default)]` so a newer backend adding fields, or an older one
//! omitting optional ones, never breaks deserialization.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Prestudy (document ingestion) pipeline
// ---------------------------------------------------------------------------

/// Ticket returned when a prestudy job is created or polled.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrestudyJobTicket {
    pub id: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_wait_sec: Option<u64>,
}

/// One model invocation recorded while a job ran.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ModelTraceSegment {
    #[serde(default)]
    pub orchestrator: String,
    #[serde(default)]
    pub step: String,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub latency_ms: f64,
    #[serde(default)]
    pub input_chars: u64,
    #[serde(default)]
    pub output_chars: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KnowledgePoint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryItem {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintablePracticeItem {
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

/// Print-ready material assembled from a completed job.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PrintablePayload {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub knowledge_points: Vec<KnowledgePoint>,
    #[serde(default)]
    pub glossary: Vec<GlossaryItem>,
    #[serde(default)]
    pub quiz: Vec<Value>,
    #[serde(default)]
    pub practice: Vec<PrintablePracticeItem>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonPlanSummary {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub structure: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Full payload of a finished (or failed) prestudy job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrestudyResponse {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub planner_json: Value,
    #[serde(default)]
    pub final_json: Value,
    #[serde(default)]
    pub model_trace: Vec<ModelTraceSegment>,
    #[serde(default)]
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub printable: Option<PrintablePayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lesson_plan: Option<LessonPlanSummary>,
}

// ---------------------------------------------------------------------------
// Quiz lifecycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub question: String,
    #[serde(default)]
    pub options: HashMap<String, String>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_variant: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kp_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizStartResponse {
    pub session_id: String,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

/// One submitted answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizAnswer {
    pub id: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmitDetail {
    pub id: String,
    pub correct: bool,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub user_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ReviewCard {
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub focus: Vec<String>,
    #[serde(default)]
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSubmitResponse {
    pub score: f64,
    #[serde(default)]
    pub detail: Vec<QuizSubmitDetail>,
    #[serde(default)]
    pub diagnostics: Value,
    #[serde(default)]
    pub review_card: ReviewCard,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_questions: Option<Vec<QuizQuestion>>,
}

// ---------------------------------------------------------------------------
// Knowledge search and document management
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSearchRef {
    pub doc_id: String,
    pub chunk_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeSearchResult {
    pub text: String,
    pub score: f64,
    #[serde(default)]
    pub refs: Vec<KnowledgeSearchRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KnowledgeSearchResponse {
    #[serde(default)]
    pub results: Vec<KnowledgeSearchResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeQaResponse {
    pub answer: String,
    #[serde(default)]
    pub contexts: Vec<KnowledgeSearchResult>,
}

/// Retrieval request against one knowledge base (or all of them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagSearchRequest {
    pub query: String,
    pub top_k: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocumentSummary {
    pub doc_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KnowledgeDocumentListResponse {
    #[serde(default)]
    pub documents: Vec<KnowledgeDocumentSummary>,
}

/// A named knowledge base record as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeBase {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct KnowledgeBaseListResponse {
    #[serde(default)]
    pub bases: Vec<KnowledgeBase>,
}

/// Result of a document upload batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeUploadResponse {
    pub docs_created: u64,
    pub chunks: u64,
    #[serde(default)]
    pub backend: String,
    #[serde(default)]
    pub dim: u64,
    #[serde(default)]
    pub documents: Vec<KnowledgeDocumentSummary>,
}

/// Deletion count returned by document removal endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedCount {
    pub deleted: u64,
}

// ---------------------------------------------------------------------------
// Lesson timeline
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonEventEntry {
    pub id: i64,
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default)]
    pub occurred_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonTimelinePayload {
    pub plan: LessonPlanSummary,
    #[serde(default)]
    pub events: Vec<LessonEventEntry>,
}

/// Event posted onto a lesson plan's timeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonEventRequest {
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Recommendations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationSuggestion {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kp_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationPayload {
    #[serde(default)]
    pub generated_at: String,
    pub job_id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<RecommendationSuggestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationTaskResponse {
    pub id: String,
    pub status: String,
    pub output: RecommendationPayload,
}
