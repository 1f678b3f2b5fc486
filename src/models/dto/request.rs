use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateClassRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    #[validate(length(max = 500))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EnrollStudentRequest {
    #[validate(length(min = 1, max = 100))]
    pub student_id: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct LevelInput {
    #[validate(range(min = 1))]
    pub level_number: i32,

    #[validate(range(min = 1))]
    pub number_of_questions: i32,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateTestRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub class_id: Option<String>,

    #[validate(length(min = 1), nested)]
    pub levels: Vec<LevelInput>,

    #[validate(range(min = 1))]
    pub hearts_per_attempt: Option<i32>,

    #[validate(range(min = 0))]
    pub hints_per_attempt: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct CreateQuestionInput {
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,

    /// At least two options; four or more are expected when hints are in
    /// play, since a hint eliminates two incorrect options.
    #[validate(length(min = 2, max = 10))]
    pub options: Vec<String>,

    #[validate(length(min = 1))]
    pub correct_answer: String,

    pub explanation: Option<String>,

    #[validate(range(min = 1))]
    pub points: Option<i32>,

    pub options_images: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AddQuestionsRequest {
    #[validate(length(min = 1), nested)]
    pub questions: Vec<CreateQuestionInput>,
}

/// Settings update with one explicit optional per mutable field; absent
/// fields are left untouched.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdateTestSettingsRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(max = 1000))]
    pub description: Option<String>,

    pub is_active: Option<bool>,

    pub is_public: Option<bool>,

    #[validate(range(min = 1))]
    pub hearts_per_attempt: Option<i32>,

    #[validate(range(min = 0))]
    pub hints_per_attempt: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AnswerRequest {
    #[validate(length(min = 1))]
    pub answer: String,
}
