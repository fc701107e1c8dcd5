//! In-memory sources and store for driving whole passes in tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use calsync_core::error::{SyncError, SyncResult};
use calsync_core::event::{Event, Side};
use calsync_core::identity::IdGenerator;
use calsync_core::source::{EventSource, EventStore, SyncWindow};
use chrono::{DateTime, TimeZone, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FakeOp {
    List,
    Create,
    Update,
    Delete,
}

#[derive(Debug, Clone)]
struct FailRule {
    op: FakeOp,
    title: Option<String>,
    remaining: Option<usize>,
}

#[derive(Default)]
struct SourceState {
    events: BTreeMap<String, Event>,
    next_native: usize,
    rules: Vec<FailRule>,
    calls: Vec<(FakeOp, String)>,
    delay: Option<Duration>,
}

impl SourceState {
    fn check(&mut self, op: FakeOp, title: &str) -> SyncResult<()> {
        let hit = self.rules.iter_mut().find(|rule| {
            rule.op == op
                && rule.title.as_deref().is_none_or(|t| t == title)
                && rule.remaining != Some(0)
        });

        match hit {
            Some(rule) => {
                if let Some(n) = rule.remaining.as_mut() {
                    *n -= 1;
                }
                Err(SyncError::Provider(format!("injected {:?} failure", op)))
            }
            None => Ok(()),
        }
    }
}

/// One side's calendar. Clones share state so tests can keep a handle
/// after moving a copy into the reconciler.
#[derive(Clone)]
pub struct FakeSource {
    side: Side,
    prefix: &'static str,
    state: Arc<Mutex<SourceState>>,
}

impl FakeSource {
    pub fn tasks() -> Self {
        FakeSource {
            side: Side::Tasks,
            prefix: "page",
            state: Arc::default(),
        }
    }

    pub fn schedule() -> Self {
        FakeSource {
            side: Side::Schedule,
            prefix: "gcal",
            state: Arc::default(),
        }
    }

    fn mint(&self, state: &mut SourceState) -> String {
        state.next_native += 1;
        format!("{}-{}", self.prefix, state.next_native)
    }

    /// A user creates an event directly in this source.
    pub fn add_untracked(&self, title: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
        let mut state = self.state.lock().unwrap();
        let native_id = self.mint(&mut state);
        let mut event = Event {
            id: None,
            title: title.to_string(),
            start,
            end,
            all_day: false,
            description: String::new(),
            color: None,
            created: Some(at(0, 0)),
            updated: Some(at(0, 0)),
            tasks_id: None,
            schedule_id: None,
        };
        event.set_native_id(self.side, native_id.clone());
        state.events.insert(native_id.clone(), event);
        native_id
    }

    /// A user edits an event directly in this source.
    pub fn edit(&self, native_id: &str, change: impl FnOnce(&mut Event)) {
        let mut state = self.state.lock().unwrap();
        let event = state.events.get_mut(native_id).unwrap();
        change(event);
    }

    /// A user deletes an event directly in this source.
    pub fn remove(&self, native_id: &str) {
        self.state.lock().unwrap().events.remove(native_id);
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().unwrap().events.values().cloned().collect()
    }

    pub fn get(&self, native_id: &str) -> Option<Event> {
        self.state.lock().unwrap().events.get(native_id).cloned()
    }

    pub fn find(&self, id: &str) -> Option<Event> {
        self.events()
            .into_iter()
            .find(|e| e.id.as_deref() == Some(id))
    }

    /// Fail `op` the next `times` times.
    pub fn fail_times(&self, op: FakeOp, times: usize) {
        self.state.lock().unwrap().rules.push(FailRule {
            op,
            title: None,
            remaining: Some(times),
        });
    }

    /// Fail `op` on the event titled `title` until cleared.
    pub fn fail_for(&self, op: FakeOp, title: &str) {
        self.state.lock().unwrap().rules.push(FailRule {
            op,
            title: Some(title.to_string()),
            remaining: None,
        });
    }

    pub fn clear_failures(&self) {
        self.state.lock().unwrap().rules.clear();
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn calls(&self) -> Vec<(FakeOp, String)> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn writes(&self) -> usize {
        self.calls()
            .iter()
            .filter(|(op, _)| *op != FakeOp::List)
            .count()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// What this source keeps of an event written to it. The tasks side
    /// never takes a color from a write; the schedule side keeps its own
    /// color when a write carries none.
    fn view(&self, event: &Event, native_id: String, existing: Option<&Event>) -> Event {
        let color = match (self.side, event.color.clone()) {
            (Side::Tasks, _) | (Side::Schedule, None) => existing.and_then(|e| e.color.clone()),
            (Side::Schedule, color) => color,
        };
        let mut view = Event {
            color,
            created: existing.map_or(Some(Utc::now()), |e| e.created),
            updated: Some(Utc::now()),
            ..event.clone()
        };
        view.set_native_id(self.side, native_id);
        view
    }
}

impl EventSource for FakeSource {
    fn side(&self) -> Side {
        self.side
    }

    async fn list_upcoming(&self, window: &SyncWindow) -> SyncResult<Vec<Event>> {
        let delay = self.state.lock().unwrap().delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock().unwrap();
        state.calls.push((FakeOp::List, String::new()));
        state.check(FakeOp::List, "")?;
        Ok(state
            .events
            .values()
            .filter(|e| e.end >= window.from)
            .cloned()
            .collect())
    }

    async fn create(&self, event: &Event) -> SyncResult<String> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((FakeOp::Create, event.title.clone()));
        state.check(FakeOp::Create, &event.title)?;

        let native_id = self.mint(&mut state);
        let view = self.view(event, native_id.clone(), None);
        state.events.insert(native_id.clone(), view);
        Ok(native_id)
    }

    async fn update(&self, event: &Event) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((FakeOp::Update, event.title.clone()));
        state.check(FakeOp::Update, &event.title)?;

        let native_id = event
            .native_id(self.side)
            .ok_or_else(|| SyncError::InvalidEvent("no native id".into()))?
            .to_string();
        let view = match state.events.get(&native_id) {
            Some(existing) => self.view(event, native_id.clone(), Some(existing)),
            None => return Err(SyncError::Provider(format!("{} not found", native_id))),
        };
        state.events.insert(native_id, view);
        Ok(())
    }

    async fn delete(&self, event: &Event) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push((FakeOp::Delete, event.title.clone()));
        state.check(FakeOp::Delete, &event.title)?;

        let native_id = event
            .native_id(self.side)
            .ok_or_else(|| SyncError::InvalidEvent("no native id".into()))?;
        match state.events.remove(native_id) {
            Some(_) => Ok(()),
            None => Err(SyncError::Provider(format!("{} not found", native_id))),
        }
    }
}

#[derive(Default)]
struct StoreState {
    records: BTreeMap<String, Event>,
    failing_puts: usize,
    writes: usize,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn records(&self) -> Vec<Event> {
        self.state.lock().unwrap().records.values().cloned().collect()
    }

    pub fn record(&self, id: &str) -> Option<Event> {
        self.state.lock().unwrap().records.get(id).cloned()
    }

    pub fn insert(&self, event: Event) {
        let id = event.id.clone().unwrap();
        self.state.lock().unwrap().records.insert(id, event);
    }

    pub fn fail_puts(&self, times: usize) {
        self.state.lock().unwrap().failing_puts = times;
    }

    pub fn writes(&self) -> usize {
        self.state.lock().unwrap().writes
    }
}

impl EventStore for MemoryStore {
    async fn list_all(&self) -> SyncResult<Vec<Event>> {
        Ok(self.records())
    }

    async fn get(&self, id: &str) -> SyncResult<Option<Event>> {
        Ok(self.record(id))
    }

    async fn put(&self, event: &Event) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.failing_puts > 0 {
            state.failing_puts -= 1;
            return Err(SyncError::Store("injected put failure".into()));
        }
        let id = event
            .id
            .clone()
            .ok_or_else(|| SyncError::Store("no id".into()))?;
        state.writes += 1;
        state.records.insert(id, event.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> SyncResult<()> {
        let mut state = self.state.lock().unwrap();
        state.writes += 1;
        state.records.remove(id);
        Ok(())
    }
}

/// Deterministic ids: evt-1, evt-2, ...
#[derive(Default)]
pub struct SequentialIds(AtomicUsize);

impl IdGenerator for SequentialIds {
    fn generate(&self) -> SyncResult<String> {
        let n = self.0.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("evt-{}", n))
    }
}

/// A time on the test day, 2030-01-07.
pub fn at(hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 7, hour, min, 0).unwrap()
}

/// A window opening well before the test day.
pub fn window() -> SyncWindow {
    SyncWindow {
        from: Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
    }
}
