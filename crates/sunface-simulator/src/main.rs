//! Scripted host driver for the sunface watch-face engine.
//!
//! Plays a deterministic scenario against a virtual clock: the face becomes
//! visible, ticks once a second on drift-corrected boundaries, receives
//! partial and full weather payloads from a simulated handheld, dips in and
//! out of ambient mode, survives a timezone change, and is hidden and shown
//! again. Frames render into the core framebuffer and the flushed dirty
//! regions are logged in place of a hardware panel.
//!
//! Run with `RUST_LOG=debug` for the engine's own logging.

use std::time::{SystemTime, UNIX_EPOCH};

use embassy_time::Instant;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use env_logger::Env;
use log::info;

use sunface_core::clock::Clock;
use sunface_core::config::{
    DeviceShape, KEY_HIGH, KEY_LOW, KEY_WEATHER_ID, PATH_WEATHER, PATH_WEATHER_INFO,
};
use sunface_core::datalayer::{
    ChannelError, Connection, DATA_EVENTS, DataEvent, DataMap, PutRequest,
};
use sunface_core::engine::WatchEngine;
use sunface_core::framebuffer::FrameBuffer;
use sunface_core::scheduler::TimerAction;
use sunface_core::ui::HourStyle;

/// Number of redraw ticks the scenario runs for.
const SCENARIO_TICKS: u32 = 12;

/// Virtual start time, deliberately off a second boundary so the first
/// aligned delay is visible in the log.
const START_MS: u64 = 437;

/// Simulated handheld on the far side of the data channel.
///
/// Every resync request on the weather path is answered with a weather-info
/// payload pushed into the inbound event channel, the same way the platform
/// delivers change notifications. The first reply is deliberately partial to
/// exercise the face's weather suppression.
struct HandheldLink {
    connected: bool,
    replies: u32,
}

impl HandheldLink {
    fn new() -> Self {
        Self {
            connected: false,
            replies: 0,
        }
    }

    fn weather_reply(&self) -> DataMap {
        let mut payload = DataMap::new();
        if self.replies == 1 {
            // First sync: the handheld had no condition id yet
            payload.insert_str(KEY_HIGH, "25\u{b0}");
            payload.insert_str(KEY_LOW, "16\u{b0}");
        } else {
            let high = 24 + self.replies as i32;
            payload.insert_str(KEY_HIGH, &format!("{high}\u{b0}"));
            payload.insert_str(KEY_LOW, "16\u{b0}");
            payload.insert_int(KEY_WEATHER_ID, 800);
        }
        payload
    }
}

impl Connection for HandheldLink {
    fn connect(&mut self) -> Result<(), ChannelError> {
        self.connected = true;
        info!("handheld link up");
        Ok(())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        info!("handheld link down");
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn put_data_item(&mut self, request: PutRequest) -> Result<(), ChannelError> {
        if !self.connected {
            return Err(ChannelError::NotConnected);
        }
        info!("put {} ({} entries)", request.path, request.payload.len());
        if request.path == PATH_WEATHER {
            self.replies += 1;
            DATA_EVENTS
                .try_send(DataEvent::changed(PATH_WEATHER_INFO, self.weather_reply()))
                .ok();
        }
        Ok(())
    }
}

/// Pending-tick bookkeeping the engine's timer actions drive.
struct VirtualTimer {
    next_tick_ms: Option<u64>,
}

impl VirtualTimer {
    fn apply(&mut self, action: TimerAction, now_ms: u64) {
        match action {
            TimerAction::Cancel => self.next_tick_ms = None,
            TimerAction::Restart => self.next_tick_ms = Some(now_ms),
        }
    }
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let boot = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let clock = Clock::new(boot.as_secs() as i64, Instant::from_millis(START_MS), 0);

    let mut engine = WatchEngine::new(
        HandheldLink::new(),
        DeviceShape::Round,
        HourStyle::H12,
        clock,
        boot.as_nanos() as u64,
    );
    let mut fb = FrameBuffer::default();
    let mut panel = FrameBuffer::default();
    let mut timer = VirtualTimer { next_tick_ms: None };
    let mut now_ms = START_MS;

    info!("face visible, starting scenario");
    let action = engine.on_visibility_changed(true);
    timer.apply(action, now_ms);
    engine.on_connected();

    let mut ticks = 0u32;
    while ticks < SCENARIO_TICKS {
        // Deliver the pending tick, if any, advancing virtual time to it
        if let Some(at) = timer.next_tick_ms {
            now_ms = now_ms.max(at);
            timer.next_tick_ms = engine
                .on_tick(Instant::from_millis(now_ms))
                .map(|delay| now_ms + delay.as_millis());
            ticks += 1;
            if let Some(next) = timer.next_tick_ms {
                info!("tick {ticks} at {now_ms}ms, next in {}ms", next - now_ms);
            }
        }

        script_step(&mut engine, &mut timer, ticks, now_ms);

        // Drain change notifications the handheld pushed
        let mut events = Vec::new();
        while let Ok(event) = DATA_EVENTS.try_receive() {
            events.push(event);
        }
        if !events.is_empty() {
            engine.on_data_changed(&events);
        }

        if engine.needs_redraw() {
            engine
                .render(Instant::from_millis(now_ms), &mut fb)
                .unwrap();
            if let Some(area) = fb.dirty_region() {
                info!(
                    "frame at {now_ms}ms: {}x{} pixels changed at ({}, {})",
                    area.size.width, area.size.height, area.top_left.x, area.top_left.y
                );
            }
            fb.flush(&mut panel).unwrap();
        }

        if timer.next_tick_ms.is_none() && ticks < SCENARIO_TICKS {
            // Timer stopped mid-scenario (ambient/hidden); the script must
            // restart it, otherwise nothing remains to wait for
            break;
        }
    }

    let weather = engine.weather();
    info!(
        "scenario done after {ticks} ticks: high={:?} low={:?} condition={:?}",
        weather.high(),
        weather.low(),
        weather.condition()
    );
    info!(
        "panel: {} lit pixels, {} white",
        panel.size().width * panel.size().height - panel.count_pixels(Rgb565::BLACK) as u32,
        panel.count_pixels(Rgb565::WHITE)
    );
}

/// Inject scripted lifecycle events at fixed points in the tick timeline.
fn script_step(
    engine: &mut WatchEngine<HandheldLink>,
    timer: &mut VirtualTimer,
    ticks: u32,
    now_ms: u64,
) {
    match ticks {
        5 => {
            // Foreign traffic on the channel: must be ignored
            let mut payload = DataMap::new();
            payload.insert_int("steps", 4211);
            DATA_EVENTS
                .try_send(DataEvent::changed("/fitness", payload))
                .ok();
        }
        6 => {
            // The handheld signals new data via the trigger path
            DATA_EVENTS
                .try_send(DataEvent::changed(PATH_WEATHER, DataMap::new()))
                .ok();
        }
        7 => {
            info!("entering ambient mode");
            let action = engine.on_ambient_changed(true);
            timer.apply(action, now_ms);
            info!("leaving ambient mode");
            let action = engine.on_ambient_changed(false);
            timer.apply(action, now_ms);
        }
        9 => {
            info!("timezone change: +02:00");
            engine.on_timezone_changed(120);
        }
        10 => {
            info!("face hidden");
            let action = engine.on_visibility_changed(false);
            timer.apply(action, now_ms);
            info!("face visible again");
            let action = engine.on_visibility_changed(true);
            timer.apply(action, now_ms);
            engine.on_connected();
        }
        _ => {}
    }
}
