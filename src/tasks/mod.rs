pub(crate) mod marks_sync;
pub(crate) mod scheduler;
