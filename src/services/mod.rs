pub(crate) mod analyzer;
pub(crate) mod attempt_start;
pub(crate) mod attempt_submit;
pub(crate) mod availability;
pub(crate) mod grading;
pub(crate) mod mark_sync;
