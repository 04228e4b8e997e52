//! The watch engine: a plain state holder behind the platform lifecycle.
//!
//! The runtime owns the actual surface, timer, and transport and forwards a
//! small capability set into the engine: visibility and ambient changes,
//! timer ticks, inbound data events, connection lifecycle, and timezone
//! broadcasts. The engine owns the weather snapshot, clock, redraw scheduler,
//! and the face, and hands timer actions back for the runtime to apply.
//!
//! Error posture: nothing in here is fatal. Connectivity failures and
//! malformed payloads are logged and the face simply renders whatever state
//! it has.

use core::fmt::Write;

use embassy_time::{Duration, Instant};
use heapless::String;
use log::{debug, warn};

use crate::clock::Clock;
use crate::config::{
    DeviceShape, KEY_HIGH, KEY_LOW, KEY_UUID, KEY_WEATHER_ID, PATH_WEATHER, PATH_WEATHER_INFO,
};
use crate::datalayer::{Connection, DataEvent, DataMap, EventKind, PutRequest, SessionIdGen};
use crate::faces::{DigitalFace, Face, FaceState};
use crate::scheduler::{RedrawScheduler, TimerAction};
use crate::ui::HourStyle;
use crate::weather::{WeatherCondition, WeatherSnapshot};

pub struct WatchEngine<C: Connection> {
    connection: C,
    scheduler: RedrawScheduler,
    clock: Clock,
    weather: WeatherSnapshot,
    face: DigitalFace,
    hour_style: HourStyle,
    ambient: bool,
    tz_observer_registered: bool,
    sessions: SessionIdGen,
}

impl<C: Connection> WatchEngine<C> {
    pub fn new(
        connection: C,
        shape: DeviceShape,
        hour_style: HourStyle,
        clock: Clock,
        session_seed: u64,
    ) -> Self {
        Self {
            connection,
            scheduler: RedrawScheduler::new(),
            clock,
            weather: WeatherSnapshot::new(),
            face: DigitalFace::new(shape),
            hour_style,
            ambient: false,
            tz_observer_registered: false,
            sessions: SessionIdGen::new(session_seed),
        }
    }

    /// The face became visible or was hidden.
    ///
    /// Becoming visible (re)establishes the channel handle and registers the
    /// timezone observer; hiding tears both down. Either way the redraw
    /// timer is updated and the returned action must be applied.
    pub fn on_visibility_changed(&mut self, visible: bool) -> TimerAction {
        if visible {
            if let Err(err) = self.connection.connect() {
                warn!("connect failed: {err}");
            }
            self.tz_observer_registered = true;
            self.invalidate();
        } else {
            self.tz_observer_registered = false;
            if self.connection.is_connected() {
                self.connection.disconnect();
            }
        }
        self.scheduler.set_visible(visible)
    }

    /// Ambient (low-power) mode toggled.
    pub fn on_ambient_changed(&mut self, ambient: bool) -> TimerAction {
        if self.ambient != ambient {
            self.ambient = ambient;
            self.invalidate();
        }
        self.scheduler.set_ambient(ambient)
    }

    /// The channel handle finished connecting. Start listening is implicit;
    /// kick off a weather resync so a fresh face does not stay empty.
    pub fn on_connected(&mut self) {
        debug!("data channel connected");
        self.request_weather_sync();
    }

    /// The channel handle failed to connect. Logged only; no retry.
    pub fn on_connection_failed(&mut self, reason: &str) {
        warn!("data channel connection failed: {reason}");
    }

    /// A redraw tick fired at monotonic time `now`.
    ///
    /// Returns the delay until the next tick the runtime must schedule, or
    /// `None` when the timer stops.
    pub fn on_tick(&mut self, now: Instant) -> Option<Duration> {
        self.invalidate();
        self.scheduler.on_tick(now)
    }

    /// A batch of change notifications arrived on the data channel.
    pub fn on_data_changed(&mut self, events: &[DataEvent]) {
        for event in events {
            if event.kind != EventKind::Changed {
                continue;
            }
            debug!("data changed on {}", event.path);
            if event.path.as_str() == PATH_WEATHER_INFO {
                self.apply_weather_payload(&event.payload);
            } else if event.path.as_str() == PATH_WEATHER {
                // Pure change trigger; the payload is never read
                self.request_weather_sync();
            }
            // Anything else on the channel is not ours; ignore silently
        }
    }

    /// Timezone-change broadcast. Only honored while the observer is
    /// registered, i.e. while the face is visible.
    pub fn on_timezone_changed(&mut self, offset_minutes: i32) {
        if !self.tz_observer_registered {
            return;
        }
        self.clock.set_timezone_offset(offset_minutes);
        self.invalidate();
    }

    /// Re-anchor the clock, e.g. from the handheld's time service.
    pub fn sync_time(&mut self, utc_epoch_seconds: i64, at: Instant) {
        self.clock.set_reference(utc_epoch_seconds, at);
        self.invalidate();
    }

    /// Display property: low-bit ambient rendering.
    pub fn set_low_bit_ambient(&mut self, low_bit: bool) {
        self.face.set_low_bit_ambient(low_bit);
    }

    /// Render the face for monotonic time `now` and clear the redraw flag.
    pub fn render<D>(&mut self, now: Instant, display: &mut D) -> Result<(), D::Error>
    where
        D: embedded_graphics::draw_target::DrawTarget<
            Color = embedded_graphics::pixelcolor::Rgb565,
        >,
    {
        let state = FaceState {
            time: self.clock.local_time(now),
            hour_style: self.hour_style,
            ambient: self.ambient,
            weather: &self.weather,
        };
        self.face.draw_face(&state, display)?;
        self.face.mark_clean();
        Ok(())
    }

    /// Whether anything changed since the last render.
    pub fn needs_redraw(&self) -> bool {
        self.face.is_dirty()
    }

    pub fn weather(&self) -> &WeatherSnapshot {
        &self.weather
    }

    pub fn scheduler(&self) -> &RedrawScheduler {
        &self.scheduler
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut C {
        &mut self.connection
    }

    fn invalidate(&mut self) {
        self.face.mark_dirty();
    }

    /// Apply one weather-info payload, field by field.
    ///
    /// Known keys overwrite their snapshot field; missing or malformed keys
    /// are logged and the previous value stays. There is deliberately no
    /// atomicity across the three fields.
    fn apply_weather_payload(&mut self, payload: &DataMap) {
        if let Some(high) = payload.get_str(KEY_HIGH) {
            debug!("high = {high}");
            self.weather.set_high(high);
        } else {
            debug!("weather payload without {KEY_HIGH}");
        }

        if let Some(low) = payload.get_str(KEY_LOW) {
            debug!("low = {low}");
            self.weather.set_low(low);
        } else {
            debug!("weather payload without {KEY_LOW}");
        }

        match payload.get_int(KEY_WEATHER_ID) {
            Some(id) => match WeatherCondition::from_id(id) {
                Some(condition) => {
                    debug!("condition id {id} -> {condition:?}");
                    self.weather.set_condition(condition);
                }
                None => warn!("unrecognized condition id {id}"),
            },
            None => debug!("weather payload without {KEY_WEATHER_ID}"),
        }

        self.invalidate();
    }

    /// Fire-and-forget resync request tagged with a fresh session id.
    ///
    /// Failures are logged and dropped; overlapping requests are possible
    /// and unguarded.
    fn request_weather_sync(&mut self) {
        let id = self.sessions.next_id();
        let mut text = String::<36>::new();
        write!(text, "{id}").ok();

        let mut payload = DataMap::new();
        payload.insert_str(KEY_UUID, &text);

        match self.connection.put_data_item(PutRequest {
            path: PATH_WEATHER,
            payload,
        }) {
            Ok(()) => debug!("weather sync requested"),
            Err(err) => warn!("weather sync request failed: {err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate alloc;

    use alloc::vec::Vec;

    use embassy_time::Instant;

    use super::*;
    use crate::datalayer::ChannelError;
    use crate::framebuffer::FrameBuffer;
    use crate::weather::WeatherCondition;

    #[derive(Default)]
    struct RecordingConnection {
        connected: bool,
        fail_connect: bool,
        fail_put: bool,
        puts: Vec<PutRequest>,
    }

    impl Connection for RecordingConnection {
        fn connect(&mut self) -> Result<(), ChannelError> {
            if self.fail_connect {
                return Err(ChannelError::connect("no peer"));
            }
            self.connected = true;
            Ok(())
        }

        fn disconnect(&mut self) {
            self.connected = false;
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn put_data_item(&mut self, request: PutRequest) -> Result<(), ChannelError> {
            if self.fail_put {
                return Err(ChannelError::put("peer gone"));
            }
            self.puts.push(request);
            Ok(())
        }
    }

    fn engine() -> WatchEngine<RecordingConnection> {
        let clock = Clock::new(1_500_027_630, Instant::from_millis(0), 0);
        WatchEngine::new(
            RecordingConnection::default(),
            DeviceShape::Round,
            HourStyle::H24,
            clock,
            42,
        )
    }

    /// Render once so the initial dirty flag does not mask later checks.
    fn settle(engine: &mut WatchEngine<RecordingConnection>) {
        let mut fb = FrameBuffer::default();
        engine.render(Instant::from_millis(0), &mut fb).unwrap();
        assert!(!engine.needs_redraw());
    }

    fn weather_info(entries: &[(&str, Value)]) -> DataEvent {
        let mut payload = DataMap::new();
        for (key, value) in entries {
            match value {
                Value::S(s) => payload.insert_str(key, s),
                Value::I(i) => payload.insert_int(key, *i),
            }
        }
        DataEvent::changed(PATH_WEATHER_INFO, payload)
    }

    enum Value {
        S(&'static str),
        I(i32),
    }

    #[test]
    fn test_unrecognized_paths_cause_no_mutation_and_no_request() {
        let mut engine = engine();
        settle(&mut engine);

        let mut payload = DataMap::new();
        payload.insert_str(KEY_HIGH, "25\u{b0}");
        engine.on_data_changed(&[
            DataEvent::changed("/settings", payload),
            DataEvent::changed("/weather-info/extra", DataMap::new()),
        ]);

        assert_eq!(engine.weather(), &WeatherSnapshot::new());
        assert!(engine.connection().puts.is_empty());
        assert!(!engine.needs_redraw());
    }

    #[test]
    fn test_deleted_events_are_ignored() {
        let mut engine = engine();
        settle(&mut engine);

        engine.on_data_changed(&[DataEvent::deleted(PATH_WEATHER_INFO)]);
        assert_eq!(engine.weather(), &WeatherSnapshot::new());
        assert!(!engine.needs_redraw());
    }

    #[test]
    fn test_partial_payload_updates_text_but_not_condition() {
        let mut engine = engine();
        settle(&mut engine);

        engine.on_data_changed(&[weather_info(&[
            (KEY_HIGH, Value::S("25\u{b0}")),
            (KEY_LOW, Value::S("16\u{b0}")),
        ])]);

        assert_eq!(engine.weather().high(), Some("25\u{b0}"));
        assert_eq!(engine.weather().low(), Some("16\u{b0}"));
        assert_eq!(engine.weather().condition(), None);
        assert!(!engine.weather().is_complete());
        assert!(engine.needs_redraw());
    }

    #[test]
    fn test_full_payload_updates_all_three_fields() {
        let mut engine = engine();

        engine.on_data_changed(&[weather_info(&[
            (KEY_HIGH, Value::S("25\u{b0}")),
            (KEY_LOW, Value::S("16\u{b0}")),
            (KEY_WEATHER_ID, Value::I(800)),
        ])]);

        assert!(engine.weather().is_complete());
        assert_eq!(engine.weather().condition(), Some(WeatherCondition::Clear));
    }

    #[test]
    fn test_unknown_condition_id_keeps_previous_condition() {
        let mut engine = engine();
        engine.on_data_changed(&[weather_info(&[(KEY_WEATHER_ID, Value::I(800))])]);
        engine.on_data_changed(&[weather_info(&[(KEY_WEATHER_ID, Value::I(999))])]);
        assert_eq!(engine.weather().condition(), Some(WeatherCondition::Clear));
    }

    #[test]
    fn test_weather_trigger_path_requests_resync_with_fresh_ids() {
        let mut engine = engine();

        let mut trigger = DataMap::new();
        trigger.insert_str(KEY_UUID, "ignored-by-receiver");
        engine.on_data_changed(&[DataEvent::changed(PATH_WEATHER, trigger.clone())]);
        engine.on_data_changed(&[DataEvent::changed(PATH_WEATHER, trigger)]);

        let puts = &engine.connection().puts;
        assert_eq!(puts.len(), 2);
        for put in puts {
            assert_eq!(put.path, PATH_WEATHER);
            assert!(put.payload.contains_key(KEY_UUID));
        }
        assert_ne!(
            puts[0].payload.get_str(KEY_UUID),
            puts[1].payload.get_str(KEY_UUID)
        );
        // The trigger itself never mutates weather state
        assert_eq!(engine.weather(), &WeatherSnapshot::new());
    }

    #[test]
    fn test_visibility_drives_connection_and_timer() {
        let mut engine = engine();

        assert_eq!(engine.on_visibility_changed(true), TimerAction::Restart);
        assert!(engine.connection().is_connected());
        assert!(engine.scheduler().has_pending_tick());

        assert_eq!(engine.on_visibility_changed(false), TimerAction::Cancel);
        assert!(!engine.connection().is_connected());
        assert!(!engine.scheduler().has_pending_tick());

        assert_eq!(engine.on_visibility_changed(true), TimerAction::Restart);
        assert!(engine.scheduler().has_pending_tick());
    }

    #[test]
    fn test_connect_failure_is_not_fatal() {
        let mut engine = engine();
        engine.connection_mut().fail_connect = true;

        assert_eq!(engine.on_visibility_changed(true), TimerAction::Restart);
        assert!(!engine.connection().is_connected());
        engine.on_connection_failed("no peer");
        // The face still ticks and renders without a channel
        assert!(engine.on_tick(Instant::from_millis(123)).is_some());
    }

    #[test]
    fn test_put_failure_is_logged_and_dropped() {
        let mut engine = engine();
        engine.connection_mut().fail_put = true;
        engine.on_data_changed(&[DataEvent::changed(PATH_WEATHER, DataMap::new())]);
        assert!(engine.connection().puts.is_empty());
    }

    #[test]
    fn test_connected_callback_requests_initial_sync() {
        let mut engine = engine();
        engine.on_visibility_changed(true);
        engine.on_connected();

        let puts = &engine.connection().puts;
        assert_eq!(puts.len(), 1);
        assert_eq!(puts[0].path, PATH_WEATHER);
    }

    #[test]
    fn test_timezone_broadcast_only_applies_while_registered() {
        let mut engine = engine();
        settle(&mut engine);

        // Not visible yet: the observer is not registered
        engine.on_timezone_changed(120);
        assert!(!engine.needs_redraw());

        engine.on_visibility_changed(true);
        settle(&mut engine);
        engine.on_timezone_changed(120);
        assert!(engine.needs_redraw());

        // Hidden again: broadcasts are ignored
        engine.on_visibility_changed(false);
        settle(&mut engine);
        engine.on_timezone_changed(-60);
        assert!(!engine.needs_redraw());
    }

    #[test]
    fn test_tick_invalidates_and_schedules_aligned_delay() {
        let mut engine = engine();
        engine.on_visibility_changed(true);
        settle(&mut engine);

        let delay = engine.on_tick(Instant::from_millis(12_345)).unwrap();
        assert_eq!(delay.as_millis(), 655);
        assert!(engine.needs_redraw());
    }
}
