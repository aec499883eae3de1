// SPDX-License-Identifier: Apache-2.0

//! Generated-content rows: quizzes, quiz attempts, teaching plans and
//! learning recommendations. Question/answer payloads are stored as JSON
//! text, same as the upstream column type.

use crate::{decode, Store, StoreError};
use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use tutorhub_model::{
    LearningRecommendation, Quiz, QuizAttempt, QuizQuestion, TeachingPlan, UserId,
};

impl Store {
    pub fn insert_quiz(
        &self,
        title: &str,
        subject_id: &str,
        questions: &[QuizQuestion],
        created_by: &UserId,
        ai_generated: bool,
    ) -> Result<Quiz, StoreError> {
        let conn = self.conn()?;
        let id = Self::new_id();
        let created_at = Self::now_rfc3339();
        let payload = serde_json::to_string(questions)
            .map_err(|e| decode::bad_row("questions", &e.to_string()))?;
        conn.execute(
            "INSERT INTO quizzes
                 (id, title, subject_id, questions, created_by, ai_generated, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                title,
                subject_id,
                payload,
                created_by.as_str(),
                ai_generated,
                created_at,
            ],
        )?;
        Ok(Quiz {
            id,
            title: title.to_string(),
            subject_id: subject_id.to_string(),
            questions: questions.to_vec(),
            created_by: created_by.clone(),
            ai_generated,
            created_at: decode::datetime(&created_at)?,
        })
    }

    pub fn get_quiz(&self, id: &str) -> Result<Option<Quiz>, StoreError> {
        let conn = self.conn()?;
        let raw = conn
            .query_row(
                "SELECT id, title, subject_id, questions, created_by, ai_generated, created_at
                 FROM quizzes WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, bool>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()?;
        let Some((id, title, subject_id, questions, created_by, ai_generated, created_at)) = raw
        else {
            return Ok(None);
        };
        Ok(Some(Quiz {
            id,
            title,
            subject_id,
            questions: serde_json::from_str(&questions)
                .map_err(|_| decode::bad_row("questions", &questions))?,
            created_by: decode::user_id(&created_by)?,
            ai_generated,
            created_at: decode::datetime(&created_at)?,
        }))
    }

    pub fn record_quiz_attempt(
        &self,
        quiz_id: &str,
        student_id: &UserId,
        answers: &Value,
        score: Option<i64>,
        max_score: Option<i64>,
        completed: bool,
    ) -> Result<QuizAttempt, StoreError> {
        let conn = self.conn()?;
        let id = Self::new_id();
        let completed_at = completed.then(Self::now_rfc3339);
        conn.execute(
            "INSERT INTO quiz_attempts
                 (id, quiz_id, student_id, answers, score, max_score, completed,
                  completed_at, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id,
                quiz_id,
                student_id.as_str(),
                answers.to_string(),
                score,
                max_score,
                completed,
                completed_at,
                Self::now_rfc3339(),
            ],
        )?;
        Ok(QuizAttempt {
            id,
            quiz_id: quiz_id.to_string(),
            student_id: student_id.clone(),
            answers: answers.clone(),
            score,
            max_score,
            completed,
            completed_at: decode::opt_datetime(completed_at)?,
        })
    }

    pub fn insert_teaching_plan(
        &self,
        title: &str,
        subject_id: &str,
        content: &str,
        student_level: Option<&str>,
        created_by: &UserId,
        ai_generated: bool,
    ) -> Result<TeachingPlan, StoreError> {
        let conn = self.conn()?;
        let id = Self::new_id();
        let created_at = Self::now_rfc3339();
        conn.execute(
            "INSERT INTO teaching_plans
                 (id, title, subject_id, content, student_level, created_by,
                  ai_generated, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                id,
                title,
                subject_id,
                content,
                student_level,
                created_by.as_str(),
                ai_generated,
                created_at,
            ],
        )?;
        Ok(TeachingPlan {
            id,
            title: title.to_string(),
            subject_id: subject_id.to_string(),
            content: content.to_string(),
            student_level: student_level.map(str::to_string),
            created_by: created_by.clone(),
            ai_generated,
            created_at: decode::datetime(&created_at)?,
        })
    }

    /// Persists a generated recommendation batch and returns it with ids
    /// assigned.
    pub fn insert_recommendations(
        &self,
        recommendations: &[LearningRecommendation],
    ) -> Result<Vec<LearningRecommendation>, StoreError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Self::now_rfc3339();
        let mut out = Vec::with_capacity(recommendations.len());
        for rec in recommendations {
            let id = Self::new_id();
            tx.execute(
                "INSERT INTO learning_recommendations
                     (id, student_id, subject_id, title, resource_type, resource_url,
                      description, viewed, completed, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    id,
                    rec.student_id.as_str(),
                    rec.subject_id,
                    rec.title,
                    rec.resource_type,
                    rec.resource_url,
                    rec.description,
                    rec.viewed,
                    rec.completed,
                    now,
                ],
            )?;
            out.push(LearningRecommendation {
                id,
                ..rec.clone()
            });
        }
        tx.commit()?;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NewUser;
    use tutorhub_model::{QuizQuestionOption, Role};

    fn seed_tutor(store: &Store) -> UserId {
        store
            .create_user(NewUser {
                id: None,
                name: None,
                full_name: None,
                email: None,
                role: Role::Tutor,
                token_identifier: "tok-tutor".to_string(),
            })
            .expect("tutor")
            .id
    }

    #[test]
    fn quiz_round_trips_questions_json() {
        let store = Store::open_in_memory().expect("open");
        let tutor = seed_tutor(&store);
        let questions = vec![
            QuizQuestion::MultipleChoice {
                id: "mc-0".to_string(),
                text: "Question 1 about Algebra".to_string(),
                options: vec![QuizQuestionOption {
                    id: "a".to_string(),
                    text: "Answer option A".to_string(),
                }],
                correct_answer: "b".to_string(),
            },
            QuizQuestion::ShortAnswer {
                id: "sa-0".to_string(),
                text: "Explain Algebra".to_string(),
                sample_answer: "A sample answer".to_string(),
            },
        ];
        let quiz = store
            .insert_quiz("Algebra Quiz", "math", &questions, &tutor, true)
            .expect("insert");
        let fetched = store.get_quiz(&quiz.id).expect("get").expect("some");
        assert_eq!(fetched.questions, questions);
        assert!(fetched.ai_generated);
    }

    #[test]
    fn attempt_marks_completion_time() {
        let store = Store::open_in_memory().expect("open");
        let tutor = seed_tutor(&store);
        let student = store
            .create_user(NewUser {
                id: None,
                name: None,
                full_name: None,
                email: None,
                role: Role::Student,
                token_identifier: "tok-student".to_string(),
            })
            .expect("student")
            .id;
        let quiz = store
            .insert_quiz("Quiz", "math", &[], &tutor, false)
            .expect("quiz");
        let attempt = store
            .record_quiz_attempt(
                &quiz.id,
                &student,
                &serde_json::json!({"mc-0": "b"}),
                Some(1),
                Some(1),
                true,
            )
            .expect("attempt");
        assert!(attempt.completed);
        assert!(attempt.completed_at.is_some());
    }

    #[test]
    fn recommendations_get_ids_assigned() {
        let store = Store::open_in_memory().expect("open");
        let tutor = seed_tutor(&store);
        let batch = vec![LearningRecommendation {
            id: String::new(),
            student_id: tutor.clone(),
            subject_id: "math".to_string(),
            title: "Khan Academy Algebra".to_string(),
            resource_type: "video".to_string(),
            resource_url: Some("https://example.com".to_string()),
            description: None,
            viewed: false,
            completed: false,
        }];
        let stored = store.insert_recommendations(&batch).expect("insert");
        assert_eq!(stored.len(), 1);
        assert!(!stored[0].id.is_empty());
    }
}
