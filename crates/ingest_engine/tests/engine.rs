use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ingest_engine::{
    Answer, ApiError, EngineEvent, EngineHandle, EngineStopped, IngestApi, ProgressSink, TaskTicket,
    UploadReceipt,
};
use pretty_assertions::assert_eq;

const WAIT: Duration = Duration::from_secs(5);

/// Streams named `slow-*` emit one frame and then hang until cancelled.
struct FakeApi;

#[async_trait::async_trait]
impl IngestApi for FakeApi {
    async fn login(&self, email: &str, _password: &str) -> Result<String, ApiError> {
        Ok(format!("token-for-{email}"))
    }

    async fn signup(&self, _email: &str, _username: &str, _password: &str) -> Result<(), ApiError> {
        Ok(())
    }

    async fn upload(&self, path: &Path, _token: &str) -> Result<UploadReceipt, ApiError> {
        Ok(UploadReceipt {
            file_name: path.file_name().map(|n| n.to_string_lossy().into_owned()),
            chunks_created: Some(2),
            ..UploadReceipt::default()
        })
    }

    async fn scrape(&self, url: &str, _token: &str) -> Result<TaskTicket, ApiError> {
        Ok(TaskTicket {
            task_id: format!("task:{url}"),
            status: None,
        })
    }

    async fn ask(&self, question: &str, _collection: &str) -> Result<Answer, ApiError> {
        Ok(Answer {
            response: question.to_uppercase(),
            conversation_id: None,
        })
    }

    async fn stream_status(&self, task_id: &str, sink: &dyn ProgressSink) -> Result<(), ApiError> {
        sink.emit(EngineEvent::StatusFrame {
            task_id: task_id.to_string(),
            data: "{}".to_string(),
        });
        if task_id.starts_with("slow") {
            tokio::time::sleep(Duration::from_secs(60)).await;
        }
        Ok(())
    }
}

fn engine() -> EngineHandle {
    ingest_logging::initialize_for_tests();
    EngineHandle::with_api(Arc::new(FakeApi)).unwrap()
}

fn frame(task_id: &str) -> EngineEvent {
    EngineEvent::StatusFrame {
        task_id: task_id.to_string(),
        data: "{}".to_string(),
    }
}

#[test]
fn one_shot_requests_report_back() {
    let engine = engine();
    engine.login("a@b.co", "pw");
    assert_eq!(
        engine.recv_timeout(WAIT),
        Ok(Some(EngineEvent::LoginCompleted(Ok("token-for-a@b.co".into()))))
    );

    engine.scrape("https://example.com", "tok");
    match engine.recv_timeout(WAIT) {
        Ok(Some(EngineEvent::ScrapeCompleted(Ok(ticket)))) => {
            assert_eq!(ticket.task_id, "task:https://example.com")
        }
        other => panic!("unexpected {other:?}"),
    }

    engine.upload("/tmp/report.pdf", "tok");
    match engine.recv_timeout(WAIT) {
        Ok(Some(EngineEvent::UploadCompleted(Ok(receipt)))) => {
            assert_eq!(receipt.file_name.as_deref(), Some("report.pdf"))
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn finished_stream_reports_end() {
    let engine = engine();
    engine.subscribe("fast");
    assert_eq!(engine.recv_timeout(WAIT), Ok(Some(frame("fast"))));
    assert_eq!(
        engine.recv_timeout(WAIT),
        Ok(Some(EngineEvent::StreamEnded {
            task_id: "fast".into()
        }))
    );
}

#[test]
fn subscribing_again_cancels_previous_stream() {
    let engine = engine();
    engine.subscribe("slow-1");
    assert_eq!(engine.recv_timeout(WAIT), Ok(Some(frame("slow-1"))));

    engine.subscribe("fast");
    assert_eq!(engine.recv_timeout(WAIT), Ok(Some(frame("fast"))));
    assert_eq!(
        engine.recv_timeout(WAIT),
        Ok(Some(EngineEvent::StreamEnded {
            task_id: "fast".into()
        }))
    );
    // The cancelled stream never reports an end or a failure.
    assert_eq!(engine.recv_timeout(Duration::from_millis(200)), Ok(None));
}

#[test]
fn unsubscribe_only_closes_matching_stream() {
    let engine = engine();
    engine.subscribe("slow-1");
    assert_eq!(engine.recv_timeout(WAIT), Ok(Some(frame("slow-1"))));

    engine.unsubscribe("other");
    engine.unsubscribe("slow-1");
    assert_eq!(engine.recv_timeout(Duration::from_millis(200)), Ok(None));

    engine.ask("hi", "c");
    assert_eq!(
        engine.recv_timeout(WAIT),
        Ok(Some(EngineEvent::AskCompleted(Ok(Answer {
            response: "HI".into(),
            conversation_id: None,
        }))))
    );
}

#[test]
fn stopped_engine_reports_disconnect_instead_of_timing_out() {
    let engine = engine();
    engine.subscribe("slow-1");
    assert_eq!(engine.recv_timeout(WAIT), Ok(Some(frame("slow-1"))));

    engine.shutdown();
    assert_eq!(engine.recv_timeout(WAIT), Err(EngineStopped));
    // Commands after shutdown are dropped without panicking.
    engine.login("a@b.co", "pw");
    assert_eq!(engine.recv_timeout(WAIT), Err(EngineStopped));
}
