mod in_memory_test;
mod tokio_postgres;

pub use self::in_memory_test::{
    FailureStage, InMemoryTestHandle, InMemoryTestResponseBuilder, RecordedQuery,
};
pub use self::tokio_postgres::TokioPostgresHandle;
