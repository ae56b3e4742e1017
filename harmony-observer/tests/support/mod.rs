#![allow(dead_code)]

use async_trait::async_trait;
use harmony_client::{Method, Transport, TransportError};
use harmony_core::domain::channel::ChannelId;
use harmony_observer::{Config, JobObserver};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const CHANNEL: &str = "979554513021177909";

#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: Method,
    pub endpoint: String,
    pub body: Option<Value>,
}

#[derive(Default)]
struct State {
    stage: i64,
    progress: i64,
    stage_script: VecDeque<i64>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    slow_failures: HashMap<String, VecDeque<Duration>>,
    requests: Vec<Recorded>,
    in_flight: HashMap<String, usize>,
    max_in_flight: HashMap<String, usize>,
}

/// In-memory stand-in for the analysis server
///
/// `start` moves a not-started job to stage 1 and `stop` resets it to 0.
#[derive(Default)]
pub struct FakeServer {
    state: Mutex<State>,
}

struct InFlight<'a> {
    server: &'a FakeServer,
    endpoint: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.server.state.lock().unwrap();
        if let Some(count) = state.in_flight.get_mut(&self.endpoint) {
            *count -= 1;
        }
    }
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_stage(&self, stage: i64) {
        self.state.lock().unwrap().stage = stage;
    }

    pub fn set_progress(&self, progress: i64) {
        self.state.lock().unwrap().progress = progress;
    }

    /// Stage values returned by successive GETs; the last one sticks
    pub fn script_stages(&self, stages: impl IntoIterator<Item = i64>) {
        self.state.lock().unwrap().stage_script.extend(stages);
    }

    pub fn fail(&self, endpoint: &str, failing: bool) {
        let mut state = self.state.lock().unwrap();
        if failing {
            state.failing.insert(endpoint.to_string());
        } else {
            state.failing.remove(endpoint);
        }
    }

    pub fn delay(&self, endpoint: &str, delay: Duration) {
        self.state
            .lock()
            .unwrap()
            .delays
            .insert(endpoint.to_string(), delay);
    }

    /// The next request to `endpoint` waits `after`, then fails
    pub fn fail_next(&self, endpoint: &str, after: Duration) {
        self.state
            .lock()
            .unwrap()
            .slow_failures
            .entry(endpoint.to_string())
            .or_default()
            .push_back(after);
    }

    pub fn requests_to(&self, endpoint: &str) -> Vec<Recorded> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.endpoint == endpoint)
            .cloned()
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.state.lock().unwrap().requests.len()
    }

    pub fn max_in_flight(&self, endpoint: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .max_in_flight
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, TransportError> {
        let expected_prefix = format!("/api/channel/{CHANNEL}/");
        let endpoint = path
            .strip_prefix(&expected_prefix)
            .ok_or_else(|| TransportError::api_error(404, path))?
            .to_string();

        let (delay, fails) = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(Recorded {
                method,
                endpoint: endpoint.clone(),
                body: body.cloned(),
            });
            let count = state.in_flight.entry(endpoint.clone()).or_insert(0);
            *count += 1;
            let current = *count;
            let max = state.max_in_flight.entry(endpoint.clone()).or_insert(0);
            *max = (*max).max(current);
            let slow_failure = state
                .slow_failures
                .get_mut(&endpoint)
                .and_then(VecDeque::pop_front);
            match slow_failure {
                Some(after) => (Some(after), true),
                None => (state.delays.get(&endpoint).copied(), false),
            }
        };

        let _in_flight = InFlight {
            server: self,
            endpoint: endpoint.clone(),
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        if fails || state.failing.contains(&endpoint) {
            return Err(TransportError::api_error(503, "unavailable"));
        }

        match (method, endpoint.as_str()) {
            (Method::Get, "pog") => Ok(json!({ "progress": state.progress })),
            (Method::Get, "stage") => {
                if let Some(next) = state.stage_script.pop_front() {
                    state.stage = next;
                }
                Ok(json!({ "stage": state.stage }))
            }
            (Method::Put, "start") => {
                if state.stage == 0 {
                    state.stage = 1;
                }
                Ok(Value::Null)
            }
            (Method::Put, "stop") => {
                state.stage = 0;
                state.progress = 0;
                Ok(Value::Null)
            }
            (Method::Put, "limit") => Ok(Value::Null),
            _ => Err(TransportError::api_error(405, "method not allowed")),
        }
    }
}

pub fn config() -> Config {
    Config::new(
        "http://localhost:5000".to_string(),
        ChannelId::parse(CHANNEL).unwrap(),
    )
}

pub fn observer_for(server: &Arc<FakeServer>, config: Config) -> JobObserver {
    JobObserver::with_transport(config, Arc::clone(server) as Arc<dyn Transport>).unwrap()
}
