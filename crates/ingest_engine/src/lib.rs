//! Ingest engine: HTTP/SSE client for the ingestion service and effect execution.
mod api;
mod detail;
mod engine;
mod persist;
mod settings;
mod types;

pub use api::{IngestApi, ProgressSink, ReqwestApi};
pub use detail::parse_error_detail;
pub use engine::EngineHandle;
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use settings::ClientSettings;
pub use types::{
    Answer, ApiError, EngineEvent, EngineStopped, FailureKind, TaskTicket, UploadReceipt,
};
