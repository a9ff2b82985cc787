//! Catalog store: read access to the taxonomy and question tables, plus the
//! single write the generator performs.

use async_trait::async_trait;

use crate::domain::{
    Chapter, Course, Exam, GeneratedQuestion, Part, ReferenceQuestion, Slot, Subject, Topic, Unit,
};
use crate::error::StoreError;

#[cfg(test)]
pub mod memory;
pub mod supabase;

pub use supabase::SupabaseCatalog;

/// Reference questions served by the existing-questions endpoint.
pub const REFERENCE_QUESTION_LIMIT: usize = 5;
/// Previously generated questions considered per topic.
pub const GENERATED_QUESTION_LIMIT: usize = 10;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_exams(&self) -> Result<Vec<Exam>, StoreError>;
    async fn list_courses(&self, exam_id: &str) -> Result<Vec<Course>, StoreError>;
    async fn list_subjects(&self, course_id: &str) -> Result<Vec<Subject>, StoreError>;
    async fn list_units(&self, subject_id: &str) -> Result<Vec<Unit>, StoreError>;
    async fn list_chapters(&self, unit_id: &str) -> Result<Vec<Chapter>, StoreError>;
    async fn list_topics(&self, chapter_id: &str) -> Result<Vec<Topic>, StoreError>;
    async fn list_parts(&self, course_id: &str) -> Result<Vec<Part>, StoreError>;
    async fn list_slots(&self, course_id: &str) -> Result<Vec<Slot>, StoreError>;

    async fn get_topic(&self, id: &str) -> Result<Option<Topic>, StoreError>;
    async fn get_chapter(&self, id: &str) -> Result<Option<Chapter>, StoreError>;

    async fn list_reference_questions(
        &self,
        topic_id: &str,
        limit: usize,
    ) -> Result<Vec<ReferenceQuestion>, StoreError>;

    /// Newest first.
    async fn list_generated_questions(
        &self,
        topic_id: &str,
        limit: usize,
    ) -> Result<Vec<GeneratedQuestion>, StoreError>;

    /// Returns whether a row was actually inserted.
    async fn insert_generated_question(&self, question: &GeneratedQuestion) -> Result<bool, StoreError>;
}
