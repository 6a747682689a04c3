//! Orchestrator lifecycle integration tests.
//!
//! These tests drive complete runs through the orchestrator with a scripted
//! session and a local HTTP server standing in for the video CDN:
//! pending -> submitted -> generating -> downloaded -> marked completed

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::extract::Path as UrlPath;
use axum::routing::get;
use axum::Router;
use tempfile::TempDir;
use tokio::sync::mpsc;

use framecast_core::{
    ledger::{Cell, LedgerTable},
    orchestrator::ItemStage,
    testing::{fixtures, ScriptStep, ScriptedSession},
    Config, LedgerStore, RunEvent, TaskOrchestrator,
};

const MARKER: &str = "已生成视频";

/// Test helper holding the root directory, the session and the CDN.
struct TestHarness {
    root: TempDir,
    session: ScriptedSession,
    cdn_url: String,
}

impl TestHarness {
    async fn new() -> Self {
        let app = Router::new().route(
            "/videos/{size}",
            get(|UrlPath(size): UrlPath<usize>| async move { fixtures::mp4_payload(size) }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind CDN listener");
        let addr = listener.local_addr().expect("Failed to read CDN address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("CDN server failed");
        });

        Self {
            root: TempDir::new().expect("Failed to create temp dir"),
            session: ScriptedSession::new(),
            cdn_url: format!("http://{}", addr),
        }
    }

    fn video_url(&self, size: usize) -> String {
        format!("{}/videos/{}", self.cdn_url, size)
    }

    fn group_dir(&self, name: &str) -> PathBuf {
        self.root.path().join(name)
    }

    fn orchestrator(&self, config: Config) -> TaskOrchestrator {
        TaskOrchestrator::new(config, Arc::new(self.session.clone()))
            .expect("Failed to create orchestrator")
    }

    fn status_of(&self, ledger: &Path, row: usize) -> String {
        LedgerTable::load(ledger)
            .expect("Failed to load ledger")
            .cell(row, 4)
            .to_string()
    }
}

#[tokio::test]
async fn test_run_completes_pending_row_once() {
    let harness = TestHarness::new().await;
    let group = harness.group_dir("batch1");
    let ledger = group.join("tasks.csv");
    fixtures::write_csv_ledger_with_status(&ledger, &[("a red fox", ""), ("a blue bird", MARKER)])
        .unwrap();
    fixtures::touch_image(&group.join("1_a.png")).unwrap();
    fixtures::touch_image(&group.join("2_b.png")).unwrap();

    harness
        .session
        .push_script(vec![
            ScriptStep::awaiting(),
            ScriptStep::in_progress(),
            ScriptStep::succeeded(harness.video_url(4096)),
        ])
        .await;

    let stats = harness
        .orchestrator(fixtures::fast_config())
        .run(harness.root.path())
        .await
        .unwrap();

    assert_eq!(
        (stats.attempted, stats.completed, stats.failed),
        (1, 1, 0)
    );
    assert_eq!(stats.ledger_write_errors, 0);
    assert_eq!(harness.status_of(&ledger, 0), MARKER);
    assert_eq!(harness.status_of(&ledger, 1), MARKER);

    let video = group.join("1_a_red_fox.mp4");
    assert_eq!(std::fs::metadata(&video).unwrap().len(), 4096);

    let submissions = harness.session.recorded_submissions().await;
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].request.prompt, "a red fox");
    assert_eq!(submissions[0].request.asset_path, group.join("1_a.png"));

    // A second run finds nothing left to do
    let stats = harness
        .orchestrator(fixtures::fast_config())
        .run(harness.root.path())
        .await
        .unwrap();
    assert_eq!(stats.attempted, 0);
    assert_eq!(harness.session.submission_count().await, 1);

    let store = LedgerStore::new(Config::default().ledger);
    let groups = framecast_core::discover_groups(harness.root.path());
    assert!(store.pending_items(&groups[0]).is_empty());
}

#[tokio::test]
async fn test_row_without_prompt_is_skipped() {
    let harness = TestHarness::new().await;
    let group = harness.group_dir("batch1");
    let ledger = group.join("tasks.csv");
    fixtures::write_csv_ledger_with_status(&ledger, &[("a", ""), ("", "")]).unwrap();
    fixtures::touch_image(&group.join("1_a.png")).unwrap();
    fixtures::touch_image(&group.join("2_b.png")).unwrap();

    let store = LedgerStore::new(Config::default().ledger);
    let groups = framecast_core::discover_groups(harness.root.path());
    let pending: Vec<(usize, u32)> = store
        .pending_items(&groups[0])
        .iter()
        .map(|item| (item.row, item.sequence))
        .collect();
    assert_eq!(pending, vec![(0, 1)]);

    harness
        .session
        .push_script(vec![
            ScriptStep::in_progress(),
            ScriptStep::succeeded(harness.video_url(2048)),
        ])
        .await;

    let stats = harness
        .orchestrator(fixtures::fast_config())
        .run(harness.root.path())
        .await
        .unwrap();

    assert_eq!(
        (stats.attempted, stats.completed, stats.failed),
        (1, 1, 0)
    );
    assert_eq!(harness.status_of(&ledger, 0), MARKER);
    assert!(harness.status_of(&ledger, 1).is_empty());
    assert!(group.join("1_a.mp4").exists());
    assert_eq!(harness.session.submission_count().await, 1);
}

#[tokio::test]
async fn test_stale_locator_is_not_reused() {
    let harness = TestHarness::new().await;
    let group = harness.group_dir("batch1");
    let ledger = group.join("tasks.csv");
    fixtures::write_csv_ledger(&ledger, &["first", "second"]).unwrap();
    fixtures::touch_image(&group.join("1_a.png")).unwrap();
    fixtures::touch_image(&group.join("2_b.png")).unwrap();

    let first = harness.video_url(2048);
    let second = harness.video_url(3072);
    harness
        .session
        .push_script(vec![ScriptStep::succeeded(first.clone())])
        .await;
    // the page still shows the first video for a moment
    harness
        .session
        .push_script(vec![
            ScriptStep::succeeded(first),
            ScriptStep::in_progress(),
            ScriptStep::succeeded(second),
        ])
        .await;

    let stats = harness
        .orchestrator(fixtures::fast_config())
        .run(harness.root.path())
        .await
        .unwrap();

    assert_eq!(stats.completed, 2);
    assert_eq!(std::fs::metadata(group.join("1_first.mp4")).unwrap().len(), 2048);
    assert_eq!(std::fs::metadata(group.join("2_second.mp4")).unwrap().len(), 3072);
}

#[tokio::test]
async fn test_groups_run_in_name_order_with_xlsx_ledger() {
    let harness = TestHarness::new().await;

    let xlsx_group = harness.group_dir("a_sheet");
    std::fs::create_dir_all(&xlsx_group).unwrap();
    let header = ["id", "name", "prompt", "notes", "status"]
        .into_iter()
        .map(Cell::from_text)
        .collect();
    let rows = vec![vec![
        Cell::Number(1.0),
        Cell::from_text("x"),
        Cell::from_text("sunset"),
    ]];
    LedgerTable::new(header, rows)
        .save(&xlsx_group.join("tasks.xlsx"))
        .unwrap();
    fixtures::touch_image(&xlsx_group.join("1_sun.jpg")).unwrap();

    let csv_group = harness.group_dir("b_csv");
    fixtures::write_csv_ledger(&csv_group.join("tasks.csv"), &["moon"]).unwrap();
    fixtures::touch_image(&csv_group.join("1_moon.jpg")).unwrap();

    harness
        .session
        .push_script(vec![ScriptStep::succeeded(harness.video_url(1500))])
        .await;
    harness
        .session
        .push_script(vec![ScriptStep::succeeded(harness.video_url(1600))])
        .await;

    let stats = harness
        .orchestrator(fixtures::fast_config())
        .run(harness.root.path())
        .await
        .unwrap();
    assert_eq!(stats.groups, 2);
    assert_eq!(stats.completed, 2);

    let prompts: Vec<String> = harness
        .session
        .recorded_submissions()
        .await
        .into_iter()
        .map(|s| s.request.prompt)
        .collect();
    assert_eq!(prompts, vec!["sunset", "moon"]);
    assert_eq!(
        harness.status_of(&xlsx_group.join("tasks.xlsx"), 0),
        MARKER
    );
    assert!(xlsx_group.join("1_sunset.mp4").exists());
}

#[tokio::test]
async fn test_spawned_run_can_be_cancelled() {
    let harness = TestHarness::new().await;
    let group = harness.group_dir("batch1");
    let ledger = group.join("tasks.csv");
    fixtures::write_csv_ledger(&ledger, &["slow one", "never started"]).unwrap();
    fixtures::touch_image(&group.join("1_a.png")).unwrap();
    fixtures::touch_image(&group.join("2_b.png")).unwrap();

    // generation never finishes
    harness
        .session
        .push_script(vec![ScriptStep::in_progress()])
        .await;

    let mut config = fixtures::fast_config();
    config.poller.generation_timeout_ms = 60_000;

    let mut handle = harness
        .orchestrator(config)
        .spawn(harness.root.path().to_path_buf());
    let mut events = handle.events().expect("event receiver");

    while let Some(event) = events.recv().await {
        if let RunEvent::ItemProgress {
            stage: ItemStage::Generating,
            ..
        } = event
        {
            handle.cancel();
            break;
        }
    }
    // keep draining so the run never blocks on a full channel
    let drain = tokio::spawn(async move { while events.recv().await.is_some() {} });

    let stats = handle.join().await.unwrap();
    drain.await.unwrap();

    assert_eq!(stats.attempted, 1);
    assert_eq!(stats.cancelled, 1);
    assert_eq!(harness.session.submission_count().await, 1);
    assert_eq!(harness.session.close_count().await, 1);
    assert!(harness.status_of(&ledger, 0).is_empty());
    assert!(harness.status_of(&ledger, 1).is_empty());
}

#[tokio::test]
async fn test_event_stream_order() {
    let harness = TestHarness::new().await;
    let group = harness.group_dir("batch1");
    fixtures::write_csv_ledger(&group.join("tasks.csv"), &["only"]).unwrap();
    fixtures::touch_image(&group.join("1_a.png")).unwrap();
    harness
        .session
        .push_script(vec![ScriptStep::succeeded(harness.video_url(2000))])
        .await;

    let (tx, mut rx) = mpsc::channel(64);
    harness
        .orchestrator(fixtures::fast_config())
        .with_events(tx)
        .run(harness.root.path())
        .await
        .unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        kinds.push(match event {
            RunEvent::RunStarted { .. } => "run_started".to_string(),
            RunEvent::GroupStarted { pending, .. } => format!("group_started:{}", pending),
            RunEvent::ItemStarted { .. } => "item_started".to_string(),
            RunEvent::ItemProgress { stage, .. } => format!("progress:{:?}", stage),
            RunEvent::ItemFinished { outcome, .. } => {
                format!("item_finished:{}", outcome.is_completed())
            }
            RunEvent::GroupFinished { completed, .. } => format!("group_finished:{}", completed),
            RunEvent::RunFinished { .. } => "run_finished".to_string(),
        });
    }

    assert_eq!(
        kinds,
        vec![
            "run_started",
            "group_started:1",
            "item_started",
            "progress:Submitting",
            "progress:Generating",
            "progress:Downloading",
            "progress:RecordingLedger",
            "item_finished:true",
            "group_finished:1",
            "run_finished",
        ]
    );
}

#[tokio::test]
async fn test_generation_timeout_leaves_row_pending() {
    let harness = TestHarness::new().await;
    let group = harness.group_dir("batch1");
    let ledger = group.join("tasks.csv");
    fixtures::write_csv_ledger(&ledger, &["stuck"]).unwrap();
    fixtures::touch_image(&group.join("1_a.png")).unwrap();
    harness
        .session
        .push_script(vec![ScriptStep::in_progress()])
        .await;

    let mut config = fixtures::fast_config();
    config.poller.generation_timeout_ms = 100;

    let stats = harness
        .orchestrator(config)
        .run(harness.root.path())
        .await
        .unwrap();

    assert_eq!(stats.failed, 1);
    assert_eq!(stats.generation_failures, 1);
    assert_eq!(stats.cancelled, 0);
    assert!(harness.status_of(&ledger, 0).is_empty());
}
