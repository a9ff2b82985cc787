//! Catalog store backed by Supabase's PostgREST interface.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use super::CatalogStore;
use crate::domain::{
    Chapter, Course, Exam, GeneratedQuestion, Part, ReferenceQuestion, Slot, Subject, Topic, Unit,
};
use crate::error::StoreError;

const REFERENCE_COLUMNS: &str = "question_statement,options,answer,solution,question_type";

#[derive(Clone)]
pub struct SupabaseCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl SupabaseCatalog {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(api_key)
            .map_err(|e| StoreError::Decode(format!("invalid Supabase key: {e}")))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| StoreError::Decode(format!("invalid Supabase key: {e}")))?;
        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(20))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, table)
    }

    #[instrument(level = "debug", skip_all, fields(%table))]
    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, StoreError> {
        let res = self.client.get(self.table_url(table)).query(query).send().await?;
        let rows: Vec<T> = decode(res).await?;
        debug!(target: "question_maker", %table, rows = rows.len(), "Catalog select");
        Ok(rows)
    }

    async fn select_one<T: DeserializeOwned>(&self, table: &str, id: &str) -> Result<Option<T>, StoreError> {
        let rows = self
            .select(table, &[("select", "*".into()), eq("id", id), ("limit", "1".into())])
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn children<T: DeserializeOwned>(
        &self,
        table: &str,
        parent_column: &str,
        parent_id: &str,
    ) -> Result<Vec<T>, StoreError> {
        self.select(table, &[("select", "*".into()), eq(parent_column, parent_id)]).await
    }
}

/// PostgREST equality filter, e.g. `topic_id=eq.<id>`.
fn eq<'a>(column: &'a str, value: &str) -> (&'a str, String) {
    (column, format!("eq.{value}"))
}

async fn decode<T: DeserializeOwned>(res: reqwest::Response) -> Result<T, StoreError> {
    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(StoreError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = res.bytes().await?;
    decode_body(&bytes)
}

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    serde_json::from_slice(bytes).map_err(|e| StoreError::Decode(e.to_string()))
}

#[async_trait]
impl CatalogStore for SupabaseCatalog {
    async fn list_exams(&self) -> Result<Vec<Exam>, StoreError> {
        self.select("exams", &[("select", "*".into())]).await
    }

    async fn list_courses(&self, exam_id: &str) -> Result<Vec<Course>, StoreError> {
        self.children("courses", "exam_id", exam_id).await
    }

    async fn list_subjects(&self, course_id: &str) -> Result<Vec<Subject>, StoreError> {
        self.children("subjects", "course_id", course_id).await
    }

    async fn list_units(&self, subject_id: &str) -> Result<Vec<Unit>, StoreError> {
        self.children("units", "subject_id", subject_id).await
    }

    async fn list_chapters(&self, unit_id: &str) -> Result<Vec<Chapter>, StoreError> {
        self.children("chapters", "unit_id", unit_id).await
    }

    async fn list_topics(&self, chapter_id: &str) -> Result<Vec<Topic>, StoreError> {
        self.children("topics", "chapter_id", chapter_id).await
    }

    async fn list_parts(&self, course_id: &str) -> Result<Vec<Part>, StoreError> {
        self.children("parts", "course_id", course_id).await
    }

    async fn list_slots(&self, course_id: &str) -> Result<Vec<Slot>, StoreError> {
        self.children("slots", "course_id", course_id).await
    }

    async fn get_topic(&self, id: &str) -> Result<Option<Topic>, StoreError> {
        self.select_one("topics", id).await
    }

    async fn get_chapter(&self, id: &str) -> Result<Option<Chapter>, StoreError> {
        self.select_one("chapters", id).await
    }

    async fn list_reference_questions(
        &self,
        topic_id: &str,
        limit: usize,
    ) -> Result<Vec<ReferenceQuestion>, StoreError> {
        self.select(
            "questions_topic_wise",
            &[
                ("select", REFERENCE_COLUMNS.into()),
                eq("topic_id", topic_id),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    async fn list_generated_questions(
        &self,
        topic_id: &str,
        limit: usize,
    ) -> Result<Vec<GeneratedQuestion>, StoreError> {
        self.select(
            "new_questions",
            &[
                ("select", "*".into()),
                eq("topic_id", topic_id),
                ("order", "created_at.desc".into()),
                ("limit", limit.to_string()),
            ],
        )
        .await
    }

    #[instrument(level = "debug", skip(self, question), fields(id = %question.id))]
    async fn insert_generated_question(&self, question: &GeneratedQuestion) -> Result<bool, StoreError> {
        let res = self
            .client
            .post(self.table_url("new_questions"))
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return=representation")
            .json(question)
            .send()
            .await?;
        let rows: Vec<serde_json::Value> = decode(res).await?;
        Ok(!rows.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Difficulty;

    #[test]
    fn test_table_url() {
        let c = SupabaseCatalog::new("https://abc.supabase.co/", "anon").unwrap();
        assert_eq!(c.table_url("topics"), "https://abc.supabase.co/rest/v1/topics");
    }

    #[test]
    fn test_eq_filter() {
        assert_eq!(eq("topic_id", "t-1"), ("topic_id", "eq.t-1".to_string()));
    }

    #[test]
    fn test_decodes_rows_with_loose_stored_values() {
        let body = br#"[
            {"id":"q1","topic_id":"t1","topic_name":"Optics","question_statement":"Q1","question_type":"NAT",
             "answer":"1.5","solution":"S","difficulty_level":"Hard","part_id":null,"slot_id":null,
             "created_at":"2024-05-01T10:00:00Z","updated_at":"2024-05-01T10:00:00Z"},
            {"id":"q2","topic_id":"t1","topic_name":"Optics","question_statement":"Q2","question_type":"MCQ",
             "options":["a","b","c","d"],"answer":"0","solution":"S","difficulty_level":"hard",
             "created_at":"2024-05-02T10:00:00Z","updated_at":"2024-05-02T10:00:00Z"},
            {"id":"q3","topic_id":"t1","topic_name":"Optics","question_statement":"Q3","question_type":"SUB",
             "answer":"text","solution":"S","difficulty_level":null,
             "created_at":"2024-05-03T10:00:00Z","updated_at":"2024-05-03T10:00:00Z"}
        ]"#;
        let rows: Vec<GeneratedQuestion> = decode_body(body).unwrap();
        let levels: Vec<Difficulty> = rows.iter().map(|q| q.difficulty_level).collect();
        assert_eq!(levels, vec![Difficulty::Hard, Difficulty::Hard, Difficulty::Medium]);

        let body = br#"[
            {"question_statement":"Lens formula?","options":null,"answer":"1/f","solution":null,"question_type":"SUB"},
            {"question_statement":null,"options":["x"],"answer":0,"solution":"S","question_type":"MCQ"}
        ]"#;
        let rows: Vec<ReferenceQuestion> = decode_body(body).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].question_statement.as_deref(), Some("Lens formula?"));
        assert!(rows[1].question_statement.is_none());
    }

    #[test]
    fn test_rejects_header_unsafe_key() {
        assert!(SupabaseCatalog::new("https://abc.supabase.co", "bad\nkey").is_err());
    }
}
