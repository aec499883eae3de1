// SPDX-License-Identifier: Apache-2.0

//! Mock content generators. These stand in for a real AI backend and keep
//! the upstream output shapes: fixed option lists, `b` as the correct
//! answer, a markdown plan template and a four-item recommendation list.

use tutorhub_model::{LearningRecommendation, QuizQuestion, QuizQuestionOption, UserId};

const OPTION_IDS: [&str; 4] = ["a", "b", "c", "d"];
pub(crate) const MOCK_CORRECT_ANSWER: &str = "b";

/// Splits `count` questions into ceil(count/2) multiple-choice and the
/// remainder short-answer when both types are enabled; a single enabled
/// type takes the whole count. Callers reject the both-disabled case
/// before getting here.
pub(crate) fn quiz_question_split(
    count: u32,
    include_multiple_choice: bool,
    include_short_answer: bool,
) -> (u32, u32) {
    match (include_multiple_choice, include_short_answer) {
        (true, true) => {
            let mc = count.div_ceil(2);
            (mc, count - mc)
        }
        (true, false) => (count, 0),
        (false, true) => (0, count),
        (false, false) => (0, 0),
    }
}

pub(crate) fn generate_quiz_questions(
    topic: &str,
    count: u32,
    include_multiple_choice: bool,
    include_short_answer: bool,
) -> Vec<QuizQuestion> {
    let (mc_count, sa_count) =
        quiz_question_split(count, include_multiple_choice, include_short_answer);
    let mut questions = Vec::with_capacity((mc_count + sa_count) as usize);
    for i in 0..mc_count {
        questions.push(QuizQuestion::MultipleChoice {
            id: format!("mc-{i}"),
            text: format!("Sample multiple choice question about {topic} (#{})", i + 1),
            options: OPTION_IDS
                .iter()
                .map(|id| QuizQuestionOption {
                    id: (*id).to_string(),
                    text: format!("Answer option {}", id.to_uppercase()),
                })
                .collect(),
            correct_answer: MOCK_CORRECT_ANSWER.to_string(),
        });
    }
    for i in 0..sa_count {
        questions.push(QuizQuestion::ShortAnswer {
            id: format!("sa-{i}"),
            text: format!("Sample short answer question about {topic} (#{})", i + 1),
            sample_answer: format!("This is a sample answer for the question about {topic}."),
        });
    }
    questions
}

pub(crate) fn teaching_plan_markdown(topic: &str) -> String {
    format!(
        "# {topic} - Teaching Plan\n\n\
         ## Learning Objectives\n\
         - Understand key concepts of {topic}\n\
         - Apply {topic} principles to solve problems\n\
         - Analyze and evaluate {topic} scenarios\n\n\
         ## Lesson Structure (60 minutes)\n\
         1. Introduction (10 min)\n   - Brief overview of {topic}\n   - Connect to previous knowledge\n\n\
         2. Main Concepts (20 min)\n   - Explanation of core principles\n   - Visual aids and examples\n\n\
         3. Guided Practice (15 min)\n   - Worked examples\n   - Step-by-step problem solving\n\n\
         4. Independent Practice (10 min)\n   - Student exercises\n   - Application problems\n\n\
         5. Assessment & Conclusion (5 min)\n   - Quick check for understanding\n   - Summary of key points\n\n\
         ## Resources\n\
         - Interactive simulations\n\
         - Practice worksheets\n\
         - Visual aids\n\n\
         ## Differentiation Strategies\n\
         - For struggling students: Simplified examples, additional visual aids\n\
         - For advanced students: Challenge problems, extension activities"
    )
}

pub(crate) fn generate_recommendations(
    student_id: &UserId,
    subject_id: &str,
) -> Vec<LearningRecommendation> {
    let items: [(&str, &str, &str, &str); 4] = [
        (
            "Introduction to Calculus",
            "video",
            "A comprehensive video series covering the basics of calculus",
            "https://example.com/calculus-intro",
        ),
        (
            "Advanced Problem Solving Techniques",
            "practice",
            "Interactive exercises to improve problem-solving skills",
            "https://example.com/problem-solving",
        ),
        (
            "Mathematical Thinking: A Comprehensive Guide",
            "book",
            "An e-book that develops mathematical reasoning skills",
            "https://example.com/math-thinking",
        ),
        (
            "Real-world Applications of Mathematics",
            "article",
            "Learn how mathematical concepts apply to everyday situations",
            "https://example.com/math-applications",
        ),
    ];
    items
        .iter()
        .map(|(title, resource_type, description, url)| LearningRecommendation {
            id: String::new(),
            student_id: student_id.clone(),
            subject_id: subject_id.to_string(),
            title: (*title).to_string(),
            resource_type: (*resource_type).to_string(),
            resource_url: Some((*url).to_string()),
            description: Some((*description).to_string()),
            viewed: false,
            completed: false,
        })
        .collect()
}
