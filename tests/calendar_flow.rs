use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use dayPlanner::clients::on_this_day::{OnThisDayClient, WikimediaClient};
use dayPlanner::clients::planner_client::{LocalPlannerBackend, PlannerBackend};
use dayPlanner::error::ClientError;
use dayPlanner::models::date_key::DateKey;
use dayPlanner::models::day::{DayEntry, DayRecord, HistoricalFact, Note, NoteId};
use dayPlanner::service::day_service::DayService;
use dayPlanner::store::DayStore;
use dayPlanner::view::controller::{CalendarController, GENERIC_ERROR};
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout, Duration};
use warp::Filter;

struct DownBackend;

#[async_trait]
impl PlannerBackend for DownBackend {
    async fn get_day_data(&self, _date: &DateKey) -> Result<Option<DayRecord>, ClientError> {
        Err(ClientError::Status { status: 503, body: "down".to_string() })
    }

    async fn get_month_data(&self, _year: i32, _month: u32) -> Result<Vec<DayEntry>, ClientError> {
        Err(ClientError::Status { status: 503, body: "down".to_string() })
    }

    async fn add_note(&self, _date: &DateKey, _content: &str) -> Result<Note, ClientError> {
        Err(ClientError::Status { status: 503, body: "down".to_string() })
    }

    async fn complete_note(&self, _date: &DateKey, _note_id: NoteId) -> Result<(), ClientError> {
        Err(ClientError::Status { status: 503, body: "down".to_string() })
    }

    async fn store_on_this_day(
        &self,
        _date: &DateKey,
        _fact: &HistoricalFact,
    ) -> Result<(), ClientError> {
        Err(ClientError::Status { status: 503, body: "down".to_string() })
    }
}

struct CountingFacts {
    calls: Mutex<Vec<(u32, u32)>>,
    fact: Option<HistoricalFact>,
}

#[async_trait]
impl OnThisDayClient for CountingFacts {
    async fn fetch_fact(&self, month: u32, day: u32) -> Result<Option<HistoricalFact>, ClientError> {
        self.calls.lock().await.push((month, day));
        Ok(self.fact.clone())
    }
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, 10).unwrap()
}

async fn spawn_feed() -> String {
    let feed = warp::path!("selected" / String / String).map(|month: String, day: String| {
        warp::reply::json(&serde_json::json!({
            "selected": [{
                "text": format!("event {}/{}", month, day),
                "year": 1969,
                "pages": [{
                    "content_urls": {
                        "desktop": { "page": "https://en.wikipedia.org/wiki/Apollo_11" }
                    }
                }]
            }]
        }))
    });
    let empty = warp::path!("empty" / String / String)
        .map(|_: String, _: String| warp::reply::json(&serde_json::json!({ "selected": [] })));
    let broken = warp::path!("broken" / String / String).map(|_: String, _: String| {
        warp::reply::with_status("upstream error", warp::http::StatusCode::BAD_GATEWAY)
    });

    let addr: SocketAddr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    tokio::spawn(warp::serve(feed.or(empty).or(broken)).run(addr));
    timeout(Duration::from_secs(5), async {
        loop {
            if tokio::net::TcpStream::connect(addr).await.is_ok() {
                break;
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("feed did not start");
    format!("http://{}", addr)
}

#[tokio::test]
async fn backend_failures_surface_generic_message() {
    let facts = Arc::new(CountingFacts { calls: Mutex::new(Vec::new()), fact: None });
    let mut ctl = CalendarController::new(Arc::new(DownBackend), facts, today());

    ctl.load_month().await;
    assert_eq!(ctl.state().message.as_deref(), Some(GENERIC_ERROR));

    ctl.select_day(15).await;
    assert_eq!(ctl.state().message.as_deref(), Some(GENERIC_ERROR));
    ctl.add_note("n1").await;
    assert_eq!(ctl.state().message.as_deref(), Some(GENERIC_ERROR));
    assert!(ctl.render().contains(GENERIC_ERROR));
}

#[tokio::test]
async fn request_fact_uses_selected_month_and_day() {
    let facts = Arc::new(CountingFacts {
        calls: Mutex::new(Vec::new()),
        fact: None,
    });
    let backend = LocalPlannerBackend::new(DayService::new(DayStore::in_memory()));
    let mut ctl = CalendarController::new(Arc::new(backend.clone()), facts.clone(), today());

    ctl.select_day(15).await;
    ctl.request_fact().await;
    ctl.request_fact().await;

    assert_eq!(*facts.calls.lock().await, vec![(3, 15), (3, 15)]);
    // Empty feed stores nothing, so the day stays absent.
    assert!(backend
        .get_day_data(&"2024-3-15".parse().unwrap())
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn wikimedia_client_reads_first_selected_item() {
    let base = spawn_feed().await;
    let client = WikimediaClient::new(&format!("{}/selected", base));
    let fact = client.fetch_fact(3, 5).await.unwrap().expect("fact expected");
    assert_eq!(fact.title, "event 03/05");
    assert_eq!(fact.year, 1969);
    assert_eq!(fact.wiki_link, "https://en.wikipedia.org/wiki/Apollo_11");
}

#[tokio::test]
async fn wikimedia_client_handles_empty_and_failed_feeds() {
    let base = spawn_feed().await;
    let empty = WikimediaClient::new(&format!("{}/empty", base));
    assert!(empty.fetch_fact(3, 5).await.unwrap().is_none());

    let broken = WikimediaClient::new(&format!("{}/broken", base));
    assert!(matches!(
        broken.fetch_fact(3, 5).await,
        Err(ClientError::Status { status: 502, .. })
    ));
}

#[tokio::test]
async fn calendar_over_real_feed_stores_and_renders_fact() {
    let base = spawn_feed().await;
    let facts = Arc::new(WikimediaClient::new(&format!("{}/selected", base)));
    let backend = LocalPlannerBackend::new(DayService::new(DayStore::in_memory()));
    let mut ctl = CalendarController::new(Arc::new(backend), facts, today());

    ctl.select_day(20).await;
    assert!(ctl.render().contains("[request data]"));
    ctl.request_fact().await;

    let text = ctl.render();
    assert!(text.contains("event 03/20 (1969)"));
    assert!(text.contains("Read more: https://en.wikipedia.org/wiki/Apollo_11"));
    assert!(!text.contains("[request data]"));
}
