use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeSet;
use std::net::TcpListener;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize)]
struct Habit {
    id: String,
    name: String,
    days: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ToggleResponse {
    date: String,
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct CompletedOn {
    habit_ids: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
struct Summary {
    total: u32,
    completed: u32,
    pending: u32,
    expected: u32,
    percentage: u32,
}

#[derive(Debug, Deserialize)]
struct Labels {
    mode: String,
    labels: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct View {
    mode: String,
    index: usize,
    labels: Vec<String>,
    key: String,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_dir() -> String {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("habit_tracker_http_{}_{}", std::process::id(), nanos));
    path.to_string_lossy().to_string()
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/habits")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server() -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_habit_tracker"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", unique_data_dir())
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server().await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn create_habit(client: &Client, base_url: &str, body: serde_json::Value) -> Habit {
    let response = client
        .post(format!("{base_url}/api/habits"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    response.json().await.unwrap()
}

async fn toggle(client: &Client, base_url: &str, habit_id: &str, date: &str) -> ToggleResponse {
    client
        .post(format!("{base_url}/api/completions/toggle"))
        .json(&json!({ "habit_id": habit_id, "date": date }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn summary(client: &Client, base_url: &str, mode: &str, key: &str) -> Summary {
    client
        .get(format!("{base_url}/api/summary?mode={mode}&key={key}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_habit_crud_round_trip() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let habit = create_habit(
        &client,
        &server.base_url,
        json!({ "name": "  Journal ", "days": ["Friday", "Monday"] }),
    )
    .await;
    assert!(!habit.id.is_empty());
    assert_eq!(habit.name, "Journal");
    assert_eq!(habit.days, ["Monday", "Friday"]);

    let updated: Habit = client
        .put(format!("{}/api/habits/{}", server.base_url, habit.id))
        .json(&json!({ "name": "Journal", "every_day": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(updated.id, habit.id);
    assert_eq!(updated.days.len(), 7);

    let deleted = client
        .delete(format!("{}/api/habits/{}", server.base_url, habit.id))
        .send()
        .await
        .unwrap();
    assert!(deleted.status().is_success());

    let missing = client
        .get(format!("{}/api/habits/{}", server.base_url, habit.id))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_rejects_invalid_input() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let blank = client
        .post(format!("{}/api/habits", server.base_url))
        .json(&json!({ "name": "   ", "days": ["Monday"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let duplicate_days = client
        .post(format!("{}/api/habits", server.base_url))
        .json(&json!({ "name": "Run", "days": ["Monday", "Monday"] }))
        .send()
        .await
        .unwrap();
    assert_eq!(duplicate_days.status(), StatusCode::BAD_REQUEST);

    let bad_mode = client
        .get(format!("{}/api/summary?mode=yearly", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_mode.status(), StatusCode::BAD_REQUEST);

    let bad_date = client
        .get(format!("{}/api/completions/2025-13-01", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(bad_date.status(), StatusCode::BAD_REQUEST);

    let unknown = client
        .post(format!("{}/api/completions/toggle", server.base_url))
        .json(&json!({ "habit_id": "no-such-habit", "date": "2025-06-02" }))
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn http_toggle_is_reversible_and_delete_cascades() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let habit = create_habit(
        &client,
        &server.base_url,
        json!({ "name": "Floss", "days": ["Sunday"] }),
    )
    .await;

    let first = toggle(&client, &server.base_url, &habit.id, "2024-03-03").await;
    assert!(first.completed);
    assert_eq!(first.date, "2024-03-03");
    let second = toggle(&client, &server.base_url, &habit.id, "2024-03-03").await;
    assert!(!second.completed);

    toggle(&client, &server.base_url, &habit.id, "2024-03-10").await;
    let on_date: CompletedOn = client
        .get(format!("{}/api/completions/2024-03-10", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(on_date.habit_ids.contains(&habit.id));

    client
        .delete(format!("{}/api/habits/{}", server.base_url, habit.id))
        .send()
        .await
        .unwrap();
    let ledger: serde_json::Map<String, serde_json::Value> = client
        .get(format!("{}/api/completions", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    for ids in ledger.values() {
        assert!(!ids.as_array().unwrap().iter().any(|id| id == &json!(habit.id)));
    }
}

#[tokio::test]
async fn http_labels_and_view_selection() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let labels: Labels = client
        .get(format!("{}/api/labels?mode=weekly&count=4", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(labels.mode, "weekly");
    assert_eq!(labels.labels.len(), 4);
    assert!(labels.labels.windows(2).all(|pair| pair[0] > pair[1]));

    let view: View = client
        .post(format!("{}/api/view", server.base_url))
        .json(&json!({ "index": 2 }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view.index, 2);
    assert_eq!(view.key, view.labels[2]);

    let view: View = client
        .post(format!("{}/api/view", server.base_url))
        .json(&json!({ "mode": "monthly" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view.mode, "monthly");
    assert_eq!(view.index, 0);
    assert!(view.key.ends_with("-01"));

    let out_of_range = client
        .post(format!("{}/api/view", server.base_url))
        .json(&json!({ "index": 99 }))
        .send()
        .await
        .unwrap();
    assert_eq!(out_of_range.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn http_summary_matches_water_scenario() {
    // dedicated server so other tests' habits do not change the totals
    let server = spawn_server().await;
    let client = Client::new();

    let habit = create_habit(
        &client,
        &server.base_url,
        json!({ "id": "1", "name": "Water", "days": ["Monday", "Wednesday"] }),
    )
    .await;
    assert_eq!(habit.id, "1");

    assert!(toggle(&client, &server.base_url, "1", "2025-06-02").await.completed);

    let monday = summary(&client, &server.base_url, "daily", "2025-06-02").await;
    assert_eq!(
        (monday.total, monday.completed, monday.pending, monday.percentage),
        (1, 1, 0, 100)
    );

    let tuesday = summary(&client, &server.base_url, "daily", "2025-06-03").await;
    assert_eq!(
        (tuesday.total, tuesday.completed, tuesday.pending, tuesday.percentage),
        (0, 0, 0, 0)
    );

    let week = summary(&client, &server.base_url, "weekly", "2025-06-01").await;
    assert_eq!((week.total, week.expected, week.completed), (1, 2, 1));
    assert_eq!(week.pending, 1);
    assert_eq!(week.percentage, 50);

    let month = summary(&client, &server.base_url, "monthly", "2025-06-01").await;
    assert_eq!(month.expected, 9);
    assert_eq!(month.completed + month.pending, month.expected);
}
