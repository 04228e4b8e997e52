//! Companion data-channel contract.
//!
//! The paired handheld and the watch exchange state through a pub/sub
//! key-value channel: data items are published on string paths and change
//! notifications fan out to listeners. This module models exactly the slice
//! of that contract the watch-face consumes: change events with a small
//! key-value payload, and a fire-and-forget put used to request a resync.
//!
//! Transport is out of scope. The [`Connection`] trait is implemented by the
//! simulator and by test doubles; on a real device it would wrap the
//! platform connectivity API.

use core::fmt;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};
use thiserror_no_std::Error;

/// Capacity of the inbound change-event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Global channel the connectivity side pushes change events into.
///
/// Drained by the render loop on the same thread that draws, so listeners
/// never observe a half-applied payload.
pub static DATA_EVENTS: Channel<CriticalSectionRawMutex, DataEvent, EVENT_CHANNEL_CAPACITY> =
    Channel::new();

/// Maximum number of entries in one payload.
const MAP_CAPACITY: usize = 8;

/// A single payload value. The wire contract only carries strings and ints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String<36>),
    Int(i32),
}

/// Small key-value payload attached to a data item.
///
/// Insertion replaces an existing key. Lookups are typed: a key holding an
/// int is invisible to [`DataMap::get_str`] and vice versa, mirroring the
/// typed getters of the platform data-map API.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataMap {
    entries: Vec<(String<24>, Value), MAP_CAPACITY>,
}

impl DataMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_str(&mut self, key: &str, value: &str) {
        self.insert(key, Value::Str(bounded(value)));
    }

    pub fn insert_int(&mut self, key: &str, value: i32) {
        self.insert(key, Value::Int(value));
    }

    fn insert(&mut self, key: &str, value: Value) {
        if let Some(slot) = self.entries.iter_mut().find(|(k, _)| k.as_str() == key) {
            slot.1 = value;
            return;
        }
        // Payloads on this contract are tiny; overflow means a misbehaving
        // peer and the extra entry is dropped.
        self.entries.push((bounded(key), value)).ok();
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.get(key) {
            Some(Value::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.get(key) {
            Some(Value::Int(v)) => Some(*v),
            _ => None,
        }
    }

    fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_str() == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Copy as much of `s` as fits into a bounded string.
fn bounded<const N: usize>(s: &str) -> String<N> {
    let mut out = String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// What happened to the data item behind a change notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Changed,
    Deleted,
}

/// One change notification delivered by the connectivity layer.
///
/// Ephemeral: consumed by the listener and dropped, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataEvent {
    pub kind: EventKind,
    pub path: String<48>,
    pub payload: DataMap,
}

impl DataEvent {
    pub fn changed(path: &str, payload: DataMap) -> Self {
        Self {
            kind: EventKind::Changed,
            path: bounded(path),
            payload,
        }
    }

    pub fn deleted(path: &str) -> Self {
        Self {
            kind: EventKind::Deleted,
            path: bounded(path),
            payload: DataMap::new(),
        }
    }
}

/// An outbound put of a data item, submitted fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutRequest {
    pub path: &'static str,
    pub payload: DataMap,
}

#[derive(Error, Debug)]
pub enum ChannelError {
    #[error("channel not connected")]
    NotConnected,
    #[error("connect failed: {0}")]
    Connect(String<64>),
    #[error("put rejected: {0}")]
    Put(String<64>),
}

impl ChannelError {
    pub fn connect(reason: &str) -> Self {
        Self::Connect(bounded(reason))
    }

    pub fn put(reason: &str) -> Self {
        Self::Put(bounded(reason))
    }
}

/// Handle to the companion data channel.
///
/// `put_data_item` models the asynchronous put: `Ok` means the request was
/// submitted, not that the peer stored it. Completion failures surface as an
/// `Err` from the transport when it learns of them and are only ever logged
/// by callers. There is no retry and no user-visible indication.
pub trait Connection {
    fn connect(&mut self) -> Result<(), ChannelError>;
    fn disconnect(&mut self);
    fn is_connected(&self) -> bool;
    fn put_data_item(&mut self, request: PutRequest) -> Result<(), ChannelError>;
}

/// Session-id source for resync requests.
///
/// splitmix64 over a runtime-provided seed: plenty for ids whose only job is
/// to make consecutive puts distinct so each one forces a change event.
pub struct SessionIdGen {
    state: u64,
}

impl SessionIdGen {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    pub fn next_id(&mut self) -> SessionId {
        SessionId {
            hi: self.next_u64(),
            lo: self.next_u64(),
        }
    }
}

/// 128-bit session identifier, rendered as 32 hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionId {
    hi: u64,
    lo: u64,
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}{:016x}", self.hi, self.lo)
    }
}
