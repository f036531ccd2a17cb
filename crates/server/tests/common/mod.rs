//! Shared fixtures: a scripted engine, a recording renderer, a mock data
//! provider and a session harness.

// Each test binary uses a different subset of these fixtures.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use kairos_channel::BoundedChannel;
use kairos_core::{
    Action, Bar, DataReply, Feed, InfoRecord, Message, RenderMode, RenderPayload, SampleStats,
    StepSnapshot, StrategyStats, TrialSample,
};
use kairos_data::DataAcquisition;
use kairos_ports::{Engine, EngineError, EngineRun, Observer, Renderer, TickHook, TickView};
use kairos_server::config::SEND_TIMEOUT;
use kairos_server::{Session, SessionConfig, SessionError};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

pub fn bars(n: usize) -> Vec<Bar> {
    (0..n)
        .map(|i| Bar {
            time: Utc
                .with_ymd_and_hms(2020, 1, 1, i as u32 / 60, i as u32 % 60, 0)
                .unwrap(),
            open: dec!(100),
            high: dec!(101),
            low: dec!(99),
            close: dec!(100) + Decimal::from(i as u64),
            volume: dec!(1),
        })
        .collect()
}

/// Scripted backtesting engine: one tick per feed bar, deterministic
/// state and reward, shared logs so tests can inspect what the runner
/// injected into each per-episode copy.
#[derive(Clone)]
pub struct SimEngine {
    observers: Vec<Observer>,
    feed: Option<Feed>,
    pub observer_log: Arc<Mutex<Vec<Observer>>>,
    pub stats_seen: Arc<Mutex<Option<StrategyStats>>>,
}

impl SimEngine {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            feed: None,
            observer_log: Arc::new(Mutex::new(Vec::new())),
            stats_seen: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observers.push(observer);
        self
    }
}

struct SimView {
    tick: u64,
    done: bool,
    action: Action,
    halted: bool,
}

impl TickView for SimView {
    fn is_done(&self) -> bool {
        self.done
    }

    fn info(&self) -> InfoRecord {
        InfoRecord {
            tick: self.tick,
            action: self.action,
            reward: self.reward(),
            broker_value: dec!(1000),
            broker_message: "-".to_string(),
        }
    }

    fn raw_state(&self) -> serde_json::Value {
        json!({ "raw": true, "tick": self.tick })
    }

    fn state(&self) -> serde_json::Value {
        json!({ "tick": self.tick })
    }

    fn reward(&self) -> f64 {
        self.tick as f64 * 0.5
    }

    fn set_action(&mut self, action: Action) {
        self.action = action;
    }

    fn halt(&mut self) {
        self.halted = true;
    }
}

#[async_trait]
impl Engine for SimEngine {
    fn add_feed(&mut self, feed: Feed) {
        self.feed = Some(feed);
    }

    fn observers(&self) -> &[Observer] {
        &self.observers
    }

    fn add_observer(&mut self, observer: Observer) {
        self.observer_log.lock().unwrap().push(observer);
        self.observers.push(observer);
    }

    fn set_strategy_stats(&mut self, stats: StrategyStats) {
        *self.stats_seen.lock().unwrap() = Some(stats);
    }

    async fn run(&mut self, hook: &mut dyn TickHook) -> Result<EngineRun, EngineError> {
        let total = self.feed.as_ref().map(|f| f.len() as u64).unwrap_or(0);
        if total == 0 {
            return Err(EngineError::Fault("no data feed".to_string()));
        }
        let mut view = SimView {
            tick: 0,
            done: false,
            action: Action::Hold,
            halted: false,
        };
        let mut ran = 0u64;
        loop {
            view.done = view.tick + 1 >= total;
            hook.on_tick(&mut view).await?;
            ran += 1;
            if view.halted || view.tick + 1 >= total {
                break;
            }
            view.tick += 1;
        }
        let mut analyzers = BTreeMap::new();
        analyzers.insert("drawdown".to_string(), json!({ "max": 0.05 }));
        if self.observers.contains(&Observer::NormPnl) {
            analyzers.insert("norm_pnl".to_string(), json!({ "final": 0.0 }));
        }
        Ok(EngineRun {
            length: ran,
            analyzers,
        })
    }
}

#[derive(Debug, Clone)]
pub struct RenderCall {
    pub modes: Vec<RenderMode>,
    pub transmit: bool,
    /// Size of the info batch in the step snapshot the call saw, if any.
    pub info_len: Option<usize>,
}

/// Renderer that records every call and returns one frame per mode.
#[derive(Clone)]
pub struct RecordingRenderer {
    enabled: bool,
    pub calls: Arc<Mutex<Vec<RenderCall>>>,
}

impl RecordingRenderer {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Renderer for RecordingRenderer {
    fn enabled(&self) -> bool {
        self.enabled
    }

    fn modes(&self) -> Vec<RenderMode> {
        vec![RenderMode::Human, RenderMode::Agent, RenderMode::Episode]
    }

    fn render(
        &mut self,
        modes: &[RenderMode],
        step: Option<&StepSnapshot>,
        transmit: bool,
    ) -> RenderPayload {
        self.calls.lock().unwrap().push(RenderCall {
            modes: modes.to_vec(),
            transmit,
            info_len: step.map(|s| s.info.len()),
        });
        let mut payload = RenderPayload::empty();
        for mode in modes {
            let tick = step.and_then(|s| s.info.last()).map(|i| i.tick);
            payload.insert(*mode, json!({ "tick": tick }));
        }
        payload
    }
}

/// Mock data provider serving one trial, optionally "not ready" first.
pub fn spawn_provider(
    mut channel: BoundedChannel,
    trial_rows: usize,
    not_ready: usize,
    seen: Arc<Mutex<Vec<Message>>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut remaining = not_ready;
        loop {
            let request = match channel.receive().await {
                Ok(m) => m,
                Err(_) => break,
            };
            seen.lock().unwrap().push(request.clone());
            let reply = match request {
                Message::Ping => Message::Status("data provider ready".to_string()),
                Message::GetData { .. } if remaining > 0 => {
                    remaining -= 1;
                    Message::Data(DataReply::not_ready())
                }
                Message::GetData { .. } => Message::Data(DataReply::ready(
                    TrialSample::new("trial-0", bars(trial_rows)),
                    SampleStats::default(),
                )),
                Message::Stop => {
                    let _ = channel.send(Message::Status("exiting".to_string())).await;
                    break;
                }
                _ => Message::Status("unsupported".to_string()),
            };
            if channel.send(reply).await.is_err() {
                break;
            }
        }
    })
}

pub struct Harness {
    pub controller: BoundedChannel,
    pub session: JoinHandle<Result<(), SessionError>>,
    pub provider_seen: Arc<Mutex<Vec<Message>>>,
    pub render_calls: Arc<Mutex<Vec<RenderCall>>>,
    pub engine: SimEngine,
}

pub fn start_session(skip_frame: u64, trial_rows: usize, render_enabled: bool) -> Harness {
    start_session_with(SimEngine::new(), skip_frame, trial_rows, render_enabled)
}

pub fn start_session_with(
    engine: SimEngine,
    skip_frame: u64,
    trial_rows: usize,
    render_enabled: bool,
) -> Harness {
    let _ = env_logger::builder().is_test(true).try_init();

    let (controller, server_end) = BoundedChannel::duplex(8);
    let server_end = server_end
        .with_timeouts(Some(SEND_TIMEOUT), None)
        .unwrap();

    let (data_end, provider_end) = BoundedChannel::duplex(8);

    let provider_seen = Arc::new(Mutex::new(Vec::new()));
    spawn_provider(provider_end, trial_rows, 0, provider_seen.clone());

    let renderer = RecordingRenderer::new(render_enabled);
    let render_calls = renderer.calls.clone();

    let config = SessionConfig {
        skip_frame,
        ..Default::default()
    };
    let session = Session::new(
        config,
        server_end,
        DataAcquisition::new(data_end).unwrap(),
        engine.clone(),
        renderer,
    );
    let session = tokio::spawn(session.run());

    Harness {
        controller,
        session,
        provider_seen,
        render_calls,
        engine,
    }
}

/// One request/reply turn from the controller's side.
pub async fn request(channel: &mut BoundedChannel, message: Message) -> Message {
    channel.send(message).await.expect("controller send");
    channel.receive().await.expect("controller receive")
}
