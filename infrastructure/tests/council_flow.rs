//! End-to-end council flows over a real session directory: file-backed
//! transcript, polling cursors, broadcaster and reactors wired together
//! with in-memory chat backends.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use conclave_application::ports::chat_backend::{BackendError, ChatBackend, StaticBackend};
use conclave_application::ports::display::CouncilDisplay;
use conclave_application::ports::host_process::{HostError, HostProcess};
use conclave_application::ports::mirror::NoMirror;
use conclave_application::ports::transcript::TranscriptReader;
use conclave_application::{
    BroadcastHandle, Broadcaster, BroadcasterConfig, HostMirror, Orchestrator, ParticipantReactor,
    ReactorConfig,
};
use conclave_domain::{codec, HistoryMessage, Message, SessionLayout};
use conclave_infrastructure::{JsonlMirror, JsonlTranscriptStore, PollingCursor};
use tokio_util::sync::CancellationToken;

const TICK: Duration = Duration::from_millis(10);

struct CountingBackend {
    calls: Arc<AtomicUsize>,
    reply: String,
}

#[async_trait]
impl ChatBackend for CountingBackend {
    async fn complete(
        &self,
        _history: &[HistoryMessage],
        _deadline: Duration,
    ) -> Result<String, BackendError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reply.clone())
    }
}

/// A council over a temp session directory, without a host process.
struct Fabric {
    session: SessionLayout,
    store: Arc<JsonlTranscriptStore>,
    handle: BroadcastHandle,
    cancel: CancellationToken,
    _dir: tempfile::TempDir,
}

impl Fabric {
    fn start() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let session = SessionLayout::new(dir.path());
        let store = Arc::new(JsonlTranscriptStore::open(session.transcript_path()).unwrap());
        let cancel = CancellationToken::new();
        let (broadcaster, handle) =
            Broadcaster::new(store.clone(), BroadcasterConfig::default());
        tokio::spawn(broadcaster.run(cancel.clone()));
        Self {
            session,
            store,
            handle,
            cancel,
            _dir: dir,
        }
    }

    /// Seat a participant with its own cursor and mirror log.
    fn seat(&self, id: &str, backend: Box<dyn ChatBackend>) {
        let tail = Box::new(
            PollingCursor::new(self.session.transcript_path(), self.cancel.clone())
                .with_interval(TICK),
        );
        let mirror = match JsonlMirror::open(self.session.mirror_path(id)) {
            Some(mirror) => Arc::new(mirror) as Arc<dyn conclave_application::MirrorWriter>,
            None => Arc::new(NoMirror),
        };
        let reactor = ParticipantReactor::new(
            id.into(),
            backend,
            tail,
            self.store.clone(),
            mirror,
            self.handle.clone(),
            ReactorConfig::default(),
        );
        tokio::spawn(reactor.run(self.cancel.clone()));
    }

    /// Wait until the transcript holds at least `count` records.
    async fn wait_for_records(&self, count: usize) -> Vec<Message> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let records = self.store.read_all().unwrap();
            if records.len() >= count {
                return records;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {} records, have {}",
                count,
                records.len()
            );
            tokio::time::sleep(TICK).await;
        }
    }

    /// Let any in-flight reactions settle.
    async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(150)).await;
    }
}

#[tokio::test]
async fn user_turn_fans_out_to_every_participant() {
    let fabric = Fabric::start();
    fabric.seat("a", Box::new(StaticBackend::new("a1")));
    fabric.seat("b", Box::new(StaticBackend::new("b1")));

    let user_turn = Message::user("hello");
    let user_id = user_turn.id.clone();
    fabric.handle.submit(user_turn).await.unwrap();

    fabric.wait_for_records(3).await;
    fabric.settle().await;
    let records = fabric.store.read_all().unwrap();

    // The user turn leads; exactly one reply per participant follows
    assert_eq!(records[0].id, user_id);
    assert_eq!(records.iter().filter(|m| m.from == "user").count(), 1);
    let from_a: Vec<_> = records.iter().filter(|m| m.from == "a").collect();
    let from_b: Vec<_> = records.iter().filter(|m| m.from == "b").collect();
    assert_eq!(from_a.len(), 1);
    assert_eq!(from_b.len(), 1);
    assert_eq!(from_a[0].content, "a1");
    assert_eq!(from_b[0].content, "b1");
    assert_eq!(from_a[0].reply_to.as_deref(), Some(user_id.as_str()));
    assert_eq!(from_b[0].reply_to.as_deref(), Some(user_id.as_str()));

    // No participant replied to its own record
    for record in &records {
        if let Some(target) = &record.reply_to {
            let trigger = records.iter().find(|m| &m.id == target).unwrap();
            assert_ne!(trigger.from, record.from, "self-reply in the transcript");
        }
    }
    assert_eq!(records.len(), 3);

    // The mirror holds exactly the participant's own reply
    let mirror = std::fs::read_to_string(fabric.session.mirror_path("a")).unwrap();
    let mirrored: Vec<Message> = mirror
        .lines()
        .map(|line| codec::decode(line).unwrap())
        .collect();
    assert_eq!(mirrored.len(), 1);
    assert_eq!(mirrored[0].id, from_a[0].id);

    fabric.cancel.cancel();
}

#[tokio::test]
async fn mention_triggers_only_the_named_participant() {
    let fabric = Fabric::start();
    let a_calls = Arc::new(AtomicUsize::new(0));
    let b_calls = Arc::new(AtomicUsize::new(0));
    fabric.seat(
        "a",
        Box::new(CountingBackend {
            calls: a_calls.clone(),
            reply: "from a".to_string(),
        }),
    );
    fabric.seat(
        "b",
        Box::new(CountingBackend {
            calls: b_calls.clone(),
            reply: "from b".to_string(),
        }),
    );

    // A host turn addressing one participant by name
    fabric
        .handle
        .submit(Message::assistant("host", "@a only"))
        .await
        .unwrap();

    fabric.wait_for_records(2).await;
    fabric.settle().await;

    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 0);
    fabric.cancel.cancel();
}

#[tokio::test]
async fn own_mention_does_not_self_trigger() {
    let fabric = Fabric::start();
    let calls = Arc::new(AtomicUsize::new(0));
    fabric.seat(
        "a",
        Box::new(CountingBackend {
            calls: calls.clone(),
            reply: "echo".to_string(),
        }),
    );

    fabric
        .handle
        .submit(Message::assistant("a", "@a again"))
        .await
        .unwrap();

    fabric.wait_for_records(1).await;
    fabric.settle().await;

    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(fabric.store.read_all().unwrap().len(), 1);
    fabric.cancel.cancel();
}

#[tokio::test]
async fn directed_reply_reaches_the_original_author() {
    let fabric = Fabric::start();
    let calls = Arc::new(AtomicUsize::new(0));
    fabric.seat(
        "a",
        Box::new(CountingBackend {
            calls: calls.clone(),
            reply: "thanks".to_string(),
        }),
    );

    // First a user turn so `a` publishes something
    fabric.handle.submit(Message::user("hello")).await.unwrap();
    let records = fabric.wait_for_records(2).await;
    let a_reply = records.iter().find(|m| m.from == "a").unwrap().clone();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // The host answers `a` directly: that demands one more response
    fabric
        .handle
        .submit(Message::assistant("host", "interesting").in_reply_to(a_reply.id.clone()))
        .await
        .unwrap();
    fabric.wait_for_records(4).await;
    fabric.settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // A reply aimed at someone else's message is ignored
    fabric
        .handle
        .submit(Message::assistant("host", "aside").in_reply_to("not-a-message-of-a"))
        .await
        .unwrap();
    fabric.settle().await;
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    fabric.cancel.cancel();
}

/// Stand-in host front-end: appends the user's turn straight to the
/// transcript (as the real host binary does), then waits for the
/// council's replies before exiting.
struct ScriptedHost {
    transcript: PathBuf,
}

#[async_trait]
impl HostProcess for ScriptedHost {
    async fn run(&mut self, cancel: CancellationToken) -> Result<i32, HostError> {
        let msg = Message::user("hello council");
        let line = codec::encode(&msg).expect("encode user turn");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.transcript)?;
        file.write_all(line.as_bytes())?;
        file.flush()?;

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        loop {
            if cancel.is_cancelled() {
                return Ok(0);
            }
            let content = std::fs::read_to_string(&self.transcript).unwrap_or_default();
            if content.lines().count() >= 3 {
                return Ok(0);
            }
            if tokio::time::Instant::now() > deadline {
                return Ok(1);
            }
            tokio::time::sleep(TICK).await;
        }
    }
}

#[derive(Default)]
struct RecordingDisplay {
    shown: Mutex<Vec<Message>>,
}

impl CouncilDisplay for RecordingDisplay {
    fn show_reply(&self, msg: &Message) {
        self.shown.lock().unwrap().push(msg.clone());
    }
}

#[tokio::test]
async fn orchestrated_session_runs_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let session = SessionLayout::new(dir.path());
    let store = Arc::new(JsonlTranscriptStore::open(session.transcript_path()).unwrap());
    let cancel = CancellationToken::new();

    let (broadcaster, submissions) = Broadcaster::new(store.clone(), BroadcasterConfig::default());

    let mut reactors = Vec::new();
    for (id, reply) in [("a", "a1"), ("b", "b1")] {
        let tail = Box::new(
            PollingCursor::new(session.transcript_path(), cancel.clone()).with_interval(TICK),
        );
        reactors.push(ParticipantReactor::new(
            id.into(),
            Box::new(StaticBackend::new(reply)),
            tail,
            store.clone(),
            Arc::new(NoMirror),
            submissions.clone(),
            ReactorConfig::default(),
        ));
    }
    drop(submissions);

    let display = Arc::new(RecordingDisplay::default());
    let host_mirror = HostMirror::new(
        "host",
        Box::new(
            PollingCursor::new(session.transcript_path(), cancel.clone()).with_interval(TICK),
        ),
        display.clone(),
    );
    let host = Box::new(ScriptedHost {
        transcript: session.transcript_path(),
    });

    let orchestrator = Orchestrator::new(
        session.root().to_path_buf(),
        broadcaster,
        reactors,
        host_mirror,
        host,
    );
    let council = orchestrator.handle();

    let code = orchestrator.run(cancel).await.unwrap();
    assert_eq!(code, 0);

    // Both participants answered the host-authored user turn
    let records = store.read_all().unwrap();
    assert!(records.len() >= 3, "transcript: {:?}", records);
    assert_eq!(records[0].from, "user");
    assert!(records.iter().any(|m| m.from == "a" && m.content == "a1"));
    assert!(records.iter().any(|m| m.from == "b" && m.content == "b1"));

    // The host display saw the participants' replies but not the user turn
    let shown = display.shown.lock().unwrap();
    assert!(shown.iter().all(|m| m.from != "user" && m.from != "host"));

    // Every reactor wound down
    assert_eq!(council.snapshot().running, 0);
}
