pub mod attempt_handler;
pub mod class_handler;
pub mod health_handler;
pub mod report_handler;
pub mod test_handler;

pub use attempt_handler::{
    answer_question, available_tests, detailed_result, my_results, start_test, use_hint,
};
pub use class_handler::{
    create_class, delete_class, enroll_student, list_classes, list_students,
};
pub use health_handler::{health_check, health_check_live, health_check_ready};
pub use report_handler::{overview_statistics, student_report, test_report};
pub use test_handler::{
    add_questions, create_test, delete_test, get_test, list_admin_tests, list_class_tests,
    update_test_settings,
};
