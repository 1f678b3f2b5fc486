use crate::models::domain::{test::Level, Question, Test, TestAttempt};
