pub mod attempt_engine;
pub mod attempt_service;
pub mod class_service;
pub mod content_service;
pub mod report_service;
pub mod test_service;

pub use attempt_service::AttemptService;
pub use class_service::ClassService;
pub use content_service::ContentService;
pub use report_service::ReportService;
pub use test_service::TestService;
