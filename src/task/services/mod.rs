//! Application services for task lifecycle orchestration.

mod lifecycle;

pub use lifecycle::{
    CreateTaskRequest, ErrorKind, ErrorResponse, PageRequest, Pagination, TaskFilter,
    TaskLifecycleError, TaskLifecycleResult, TaskLifecycleService, TaskPage, TransitionDetails,
};
