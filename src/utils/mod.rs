pub mod identity_cache;
pub mod report;
pub mod student_history;
