//! In-memory catalog used by tests in place of Supabase.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CatalogStore;
use crate::domain::{
    Chapter, Course, Exam, GeneratedQuestion, Part, ReferenceQuestion, Slot, Subject, Topic, Unit,
};
use crate::error::StoreError;

#[derive(Default)]
pub struct MemoryCatalog {
    pub exams: Vec<Exam>,
    pub courses: Vec<Course>,
    pub subjects: Vec<Subject>,
    pub units: Vec<Unit>,
    pub chapters: Vec<Chapter>,
    pub topics: Vec<Topic>,
    pub parts: Vec<Part>,
    pub slots: Vec<Slot>,
    /// (topic_id, question)
    pub reference: Vec<(String, ReferenceQuestion)>,
    pub generated: RwLock<Vec<GeneratedQuestion>>,
    /// When set, inserts report that no row was written.
    pub reject_inserts: AtomicBool,
    /// When set, every read fails with a transport-style error.
    pub fail_reads: AtomicBool,
    /// Per-method read failures; topic lookups keep working.
    pub fail_chapter: AtomicBool,
    pub fail_reference: AtomicBool,
    pub fail_generated: AtomicBool,
}

impl MemoryCatalog {
    /// One exam/course/subject/unit/chapter/topic chain: `t1` under `ch1`.
    pub fn seeded() -> Self {
        Self {
            exams: vec![Exam { id: "e1".into(), name: "JEE".into(), description: None }],
            courses: vec![
                Course { id: "c1".into(), exam_id: "e1".into(), name: "Physics".into(), description: None },
                Course { id: "c2".into(), exam_id: "e2".into(), name: "Biology".into(), description: None },
            ],
            subjects: vec![Subject { id: "s1".into(), course_id: "c1".into(), name: "Mechanics".into(), description: None }],
            units: vec![Unit { id: "u1".into(), subject_id: "s1".into(), name: "Motion".into(), description: None }],
            chapters: vec![Chapter {
                id: "ch1".into(),
                unit_id: "u1".into(),
                name: "Kinematics".into(),
                description: None,
            }],
            topics: vec![Topic {
                id: "t1".into(),
                chapter_id: "ch1".into(),
                name: "Uniform acceleration".into(),
                description: Some("Motion with constant acceleration".into()),
                weightage: Some(2.5),
            }],
            parts: vec![Part { id: "p1".into(), part_name: "Part A".into(), course_id: "c1".into() }],
            slots: vec![Slot { id: "sl1".into(), slot_name: "Morning".into(), course_id: "c1".into() }],
            reference: (1..=4)
                .map(|i| {
                    (
                        "t1".to_string(),
                        ReferenceQuestion {
                            question_statement: Some(format!("Reference question {i}")),
                            options: None,
                            answer: None,
                            solution: None,
                            question_type: Some("NAT".into()),
                        },
                    )
                })
                .collect(),
            ..Self::default()
        }
    }

    pub async fn stored(&self) -> Vec<GeneratedQuestion> {
        self.generated.read().await.clone()
    }

    fn check_reads(&self) -> Result<(), StoreError> {
        self.check(&self.fail_reads)
    }

    fn check(&self, switch: &AtomicBool) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) || switch.load(Ordering::SeqCst) {
            return Err(StoreError::Status { status: 503, body: "unavailable".into() });
        }
        Ok(())
    }
}

fn filtered<T: Clone>(rows: &[T], keep: impl Fn(&T) -> bool) -> Vec<T> {
    rows.iter().filter(|r| keep(r)).cloned().collect()
}

#[async_trait]
impl CatalogStore for MemoryCatalog {
    async fn list_exams(&self) -> Result<Vec<Exam>, StoreError> {
        self.check_reads()?;
        Ok(self.exams.clone())
    }

    async fn list_courses(&self, exam_id: &str) -> Result<Vec<Course>, StoreError> {
        self.check_reads()?;
        Ok(filtered(&self.courses, |c| c.exam_id == exam_id))
    }

    async fn list_subjects(&self, course_id: &str) -> Result<Vec<Subject>, StoreError> {
        self.check_reads()?;
        Ok(filtered(&self.subjects, |s| s.course_id == course_id))
    }

    async fn list_units(&self, subject_id: &str) -> Result<Vec<Unit>, StoreError> {
        self.check_reads()?;
        Ok(filtered(&self.units, |u| u.subject_id == subject_id))
    }

    async fn list_chapters(&self, unit_id: &str) -> Result<Vec<Chapter>, StoreError> {
        self.check_reads()?;
        Ok(filtered(&self.chapters, |c| c.unit_id == unit_id))
    }

    async fn list_topics(&self, chapter_id: &str) -> Result<Vec<Topic>, StoreError> {
        self.check_reads()?;
        Ok(filtered(&self.topics, |t| t.chapter_id == chapter_id))
    }

    async fn list_parts(&self, course_id: &str) -> Result<Vec<Part>, StoreError> {
        self.check_reads()?;
        Ok(filtered(&self.parts, |p| p.course_id == course_id))
    }

    async fn list_slots(&self, course_id: &str) -> Result<Vec<Slot>, StoreError> {
        self.check_reads()?;
        Ok(filtered(&self.slots, |s| s.course_id == course_id))
    }

    async fn get_topic(&self, id: &str) -> Result<Option<Topic>, StoreError> {
        self.check_reads()?;
        Ok(self.topics.iter().find(|t| t.id == id).cloned())
    }

    async fn get_chapter(&self, id: &str) -> Result<Option<Chapter>, StoreError> {
        self.check(&self.fail_chapter)?;
        Ok(self.chapters.iter().find(|c| c.id == id).cloned())
    }

    async fn list_reference_questions(
        &self,
        topic_id: &str,
        limit: usize,
    ) -> Result<Vec<ReferenceQuestion>, StoreError> {
        self.check(&self.fail_reference)?;
        Ok(self
            .reference
            .iter()
            .filter(|(t, _)| t == topic_id)
            .map(|(_, q)| q.clone())
            .take(limit)
            .collect())
    }

    async fn list_generated_questions(
        &self,
        topic_id: &str,
        limit: usize,
    ) -> Result<Vec<GeneratedQuestion>, StoreError> {
        self.check(&self.fail_generated)?;
        let mut rows: Vec<GeneratedQuestion> = self
            .generated
            .read()
            .await
            .iter()
            .filter(|q| q.topic_id == topic_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn insert_generated_question(&self, question: &GeneratedQuestion) -> Result<bool, StoreError> {
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.generated.write().await.push(question.clone());
        Ok(true)
    }
}
