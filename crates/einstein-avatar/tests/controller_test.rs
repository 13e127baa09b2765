//! Integration tests for the avatar session controller, driven by a
//! scripted in-process transport (no network).

use einstein_avatar::{
    AvatarController, AvatarError, AvatarProfile, AvatarResult, CreateSessionRequest, Envelope,
    NewSessionData, PollConfig, SessionStatus, StreamingApi, TaskData, TaskStatus, TaskStatusData,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

fn instant_poll() -> PollConfig {
    PollConfig {
        max_attempts: 10,
        interval: Duration::ZERO,
    }
}

fn envelope<T>(code: i64, data: Option<T>) -> Envelope<T> {
    Envelope {
        code: Some(code),
        message: None,
        data,
    }
}

/// Scripted transport: records calls and plays back a fixed sequence of
/// task statuses.
struct ScriptedApi {
    create_data: Option<NewSessionData>,
    statuses: Mutex<Vec<&'static str>>,
    create_calls: AtomicUsize,
    start_calls: AtomicUsize,
    task_calls: AtomicUsize,
    status_calls: AtomicUsize,
    stop_calls: AtomicUsize,
    last_task_text: Mutex<Option<String>>,
}

impl ScriptedApi {
    fn new(statuses: Vec<&'static str>) -> Self {
        Self {
            create_data: Some(NewSessionData {
                session_id: Some("sess-1".to_string()),
                access_token: Some("tok-1".to_string()),
                url: Some("wss://stream.example/sess-1".to_string()),
            }),
            statuses: Mutex::new(statuses),
            create_calls: AtomicUsize::new(0),
            start_calls: AtomicUsize::new(0),
            task_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            stop_calls: AtomicUsize::new(0),
            last_task_text: Mutex::new(None),
        }
    }

    fn with_create_data(mut self, data: Option<NewSessionData>) -> Self {
        self.create_data = data;
        self
    }
}

/// Local handle so the foreign trait can be implemented over an `Arc`d
/// fake that the test keeps a counting reference to.
struct Shared(Arc<ScriptedApi>);

#[async_trait::async_trait]
impl StreamingApi for Shared {
    async fn create_session(
        &self,
        _request: &CreateSessionRequest,
    ) -> AvatarResult<Envelope<NewSessionData>> {
        self.0.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(envelope(100, self.0.create_data.clone()))
    }

    async fn start_session(&self, _session_id: &str) -> AvatarResult<Envelope<serde_json::Value>> {
        self.0.start_calls.fetch_add(1, Ordering::SeqCst);
        Ok(envelope(100, None))
    }

    async fn send_task(&self, _session_id: &str, text: &str) -> AvatarResult<Envelope<TaskData>> {
        self.0.task_calls.fetch_add(1, Ordering::SeqCst);
        *self.0.last_task_text.lock().unwrap() = Some(text.to_string());
        Ok(envelope(
            100,
            Some(TaskData {
                task_id: Some("task-1".to_string()),
            }),
        ))
    }

    async fn task_status(
        &self,
        _session_id: &str,
        _task_id: &str,
    ) -> AvatarResult<Envelope<TaskStatusData>> {
        self.0.status_calls.fetch_add(1, Ordering::SeqCst);
        let mut statuses = self.0.statuses.lock().unwrap();
        let status = if statuses.is_empty() {
            "processing"
        } else {
            statuses.remove(0)
        };
        Ok(envelope(
            100,
            Some(TaskStatusData {
                status: Some(status.to_string()),
            }),
        ))
    }

    async fn stop_session(&self, _session_id: &str) -> AvatarResult<Envelope<serde_json::Value>> {
        self.0.stop_calls.fetch_add(1, Ordering::SeqCst);
        Ok(envelope(100, None))
    }
}

fn controller(api: Arc<ScriptedApi>) -> AvatarController {
    AvatarController::new(
        Box::new(Shared(api)),
        AvatarProfile::default(),
        instant_poll(),
    )
}

#[tokio::test]
async fn lifecycle_create_start_speak_stop() {
    let api = Arc::new(ScriptedApi::new(vec!["complete"]));
    let mut ctl = controller(Arc::clone(&api));
    assert_eq!(ctl.status(), SessionStatus::Absent);

    let session = ctl.create().await.unwrap();
    assert_eq!(session.session_id, "sess-1");
    assert_eq!(session.stream_url, "wss://stream.example/sess-1");
    assert_eq!(ctl.status(), SessionStatus::Created);

    ctl.start().await.unwrap();
    assert_eq!(ctl.status(), SessionStatus::Started);

    let task = ctl.speak("The sky scatters blue light...").await.unwrap();
    assert_eq!(task.status, TaskStatus::Complete);
    assert_eq!(
        api.last_task_text.lock().unwrap().as_deref(),
        Some("The sky scatters blue light...")
    );

    ctl.stop().await.unwrap();
    assert_eq!(ctl.status(), SessionStatus::Absent);
    assert!(ctl.session().is_none());
    assert_eq!(api.stop_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn speak_polls_exactly_n_plus_one_times() {
    // processing x3 then complete: 4 status calls, no more.
    let api = Arc::new(ScriptedApi::new(vec![
        "processing",
        "processing",
        "processing",
        "complete",
    ]));
    let mut ctl = controller(Arc::clone(&api));
    ctl.create().await.unwrap();
    ctl.start().await.unwrap();

    ctl.speak("hello").await.unwrap();
    assert_eq!(api.status_calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn speak_times_out_at_attempt_budget() {
    // Never reaches a terminal state: exactly max_attempts checks, then Timeout.
    let api = Arc::new(ScriptedApi::new(vec!["processing"; 20]));
    let mut ctl = controller(Arc::clone(&api));
    ctl.create().await.unwrap();
    ctl.start().await.unwrap();

    let err = ctl.speak("hello").await.unwrap_err();
    assert!(matches!(err, AvatarError::Timeout { attempts: 10 }));
    assert_eq!(api.status_calls.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn speak_maps_failed_status() {
    let api = Arc::new(ScriptedApi::new(vec!["processing", "failed"]));
    let mut ctl = controller(Arc::clone(&api));
    ctl.create().await.unwrap();
    ctl.start().await.unwrap();

    let err = ctl.speak("hello").await.unwrap_err();
    assert!(matches!(err, AvatarError::TaskFailed));
}

#[tokio::test]
async fn speak_rejected_before_start_without_remote_call() {
    let api = Arc::new(ScriptedApi::new(vec![]));
    let mut ctl = controller(Arc::clone(&api));

    let err = ctl.speak("hello").await.unwrap_err();
    assert!(matches!(err, AvatarError::NotStarted));

    ctl.create().await.unwrap();
    let err = ctl.speak("hello").await.unwrap_err();
    assert!(matches!(err, AvatarError::NotStarted));

    assert_eq!(api.task_calls.load(Ordering::SeqCst), 0);
    assert_eq!(api.status_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn create_with_missing_session_id_is_config_error() {
    let api = Arc::new(
        ScriptedApi::new(vec![]).with_create_data(Some(NewSessionData {
            session_id: None,
            access_token: Some("tok".to_string()),
            url: Some("wss://stream.example".to_string()),
        })),
    );
    let mut ctl = controller(Arc::clone(&api));

    let err = ctl.create().await.unwrap_err();
    assert!(matches!(err, AvatarError::Config(_)));
    assert_eq!(ctl.status(), SessionStatus::Absent);
    assert!(ctl.session().is_none());
}

#[tokio::test]
async fn create_with_no_data_is_config_error() {
    let api = Arc::new(ScriptedApi::new(vec![]).with_create_data(None));
    let mut ctl = controller(Arc::clone(&api));

    let err = ctl.create().await.unwrap_err();
    assert!(matches!(err, AvatarError::Config(_)));
    assert_eq!(ctl.status(), SessionStatus::Absent);
}

#[tokio::test]
async fn double_start_rejected_locally() {
    let api = Arc::new(ScriptedApi::new(vec![]));
    let mut ctl = controller(Arc::clone(&api));
    ctl.create().await.unwrap();
    ctl.start().await.unwrap();

    let err = ctl.start().await.unwrap_err();
    assert!(matches!(err, AvatarError::NotCreated));
    assert_eq!(api.start_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stop_returns_controller_to_absent() {
    let api = Arc::new(ScriptedApi::new(vec![]));
    let mut ctl = controller(Arc::clone(&api));
    ctl.create().await.unwrap();
    ctl.start().await.unwrap();
    ctl.stop().await.unwrap();
    assert_eq!(ctl.status(), SessionStatus::Absent);

    // Back at the initial state, a fresh session can be created.
    ctl.create().await.unwrap();
    assert_eq!(ctl.status(), SessionStatus::Created);
    assert_eq!(api.create_calls.load(Ordering::SeqCst), 2);
}
