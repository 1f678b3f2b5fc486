pub mod class_group;
pub mod question;
pub mod test_attempt;

pub use class_group::ClassGroup;
pub use question::Question;
pub use test::{Level, Test};
pub use test_attempt::TestAttempt;
