//! Fake media resource shared by the integration tests
//!
//! Records every call the binding makes and lets a test fire synthetic
//! lifecycle events, the way a browser would queue them.

#![allow(dead_code)]

use sonority_playback::{
    MediaEvent, MediaEventSink, MediaResource, PlayerConfig, ResourceError, Track,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Once;

static INIT: Once = Once::new();

/// Route library logs to the test output once per test binary
pub fn init_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

/// Resource call, in the order the binding issued it
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Subscribe(u64),
    SetSource(Option<String>),
    Load,
    Play,
    Pause,
    Seek(f64),
    SetVolume(f64),
    SetRate(f64),
}

#[derive(Default)]
struct FakeState {
    calls: Vec<Call>,
    sink: Option<MediaEventSink>,
    src: Option<String>,
    position: f64,
    volume: f64,
    rate: f64,
    playing: bool,

    /// Next play() call fails immediately with this error
    refuse_next_play: Option<ResourceError>,

    /// Sinks captured at play() time, for late rejections
    pending_plays: Vec<MediaEventSink>,

    /// Emitted synchronously from inside the next play() call
    emit_during_play: Option<MediaEvent>,

    configs: Vec<PlayerConfig>,
    created: usize,
    dropped: usize,
}

/// Test-side controller of the fake resource(s) a factory hands out
#[derive(Clone, Default)]
pub struct FakeMedia {
    state: Rc<RefCell<FakeState>>,
}

impl FakeMedia {
    pub fn new() -> Self {
        init_logging();
        Self::default()
    }

    /// Factory to pass to `PlayerInstance::new`
    pub fn factory(
        &self,
    ) -> impl Fn(&PlayerConfig) -> Result<Box<dyn MediaResource>, ResourceError> {
        let state = Rc::clone(&self.state);
        move |config: &PlayerConfig| {
            let mut inner = state.borrow_mut();
            inner.configs.push(config.clone());
            inner.created += 1;
            inner.volume = 1.0;
            inner.rate = 1.0;
            drop(inner);
            Ok(Box::new(FakeResource {
                state: Rc::clone(&state),
            }) as Box<dyn MediaResource>)
        }
    }

    /// Fire an event through the currently subscribed sink
    pub fn emit(&self, event: MediaEvent) {
        let sink = self.state.borrow().sink.clone();
        if let Some(sink) = sink {
            sink.emit(event);
        }
    }

    /// Reject the oldest outstanding play request
    pub fn reject_pending_play(&self, error: ResourceError) {
        let sink = {
            let mut inner = self.state.borrow_mut();
            if inner.pending_plays.is_empty() {
                None
            } else {
                Some(inner.pending_plays.remove(0))
            }
        };
        if let Some(sink) = sink {
            sink.emit(MediaEvent::PlayRejected(error));
        }
    }

    pub fn refuse_next_play(&self, error: ResourceError) {
        self.state.borrow_mut().refuse_next_play = Some(error);
    }

    pub fn emit_during_next_play(&self, event: MediaEvent) {
        self.state.borrow_mut().emit_during_play = Some(event);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.borrow().calls.clone()
    }

    /// Calls without the sink subscriptions
    pub fn transport_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| !matches!(call, Call::Subscribe(_)))
            .collect()
    }

    pub fn clear_calls(&self) {
        self.state.borrow_mut().calls.clear();
    }

    pub fn count(&self, call: &Call) -> usize {
        self.state.borrow().calls.iter().filter(|c| *c == call).count()
    }

    pub fn src(&self) -> Option<String> {
        self.state.borrow().src.clone()
    }

    pub fn set_position(&self, position: f64) {
        self.state.borrow_mut().position = position;
    }

    pub fn volume(&self) -> f64 {
        self.state.borrow().volume
    }

    pub fn rate(&self) -> f64 {
        self.state.borrow().rate
    }

    pub fn is_playing(&self) -> bool {
        self.state.borrow().playing
    }

    pub fn configs(&self) -> Vec<PlayerConfig> {
        self.state.borrow().configs.clone()
    }

    pub fn created(&self) -> usize {
        self.state.borrow().created
    }

    pub fn dropped(&self) -> usize {
        self.state.borrow().dropped
    }
}

struct FakeResource {
    state: Rc<RefCell<FakeState>>,
}

impl MediaResource for FakeResource {
    fn subscribe(&mut self, sink: MediaEventSink) {
        let mut inner = self.state.borrow_mut();
        inner.calls.push(Call::Subscribe(sink.generation()));
        inner.sink = Some(sink);
    }

    fn set_source(&mut self, src: Option<&str>) {
        let mut inner = self.state.borrow_mut();
        inner.calls.push(Call::SetSource(src.map(str::to_string)));
        inner.src = src.map(str::to_string);
        inner.position = 0.0;
        inner.playing = false;
    }

    fn load(&mut self) {
        self.state.borrow_mut().calls.push(Call::Load);
    }

    fn play(&mut self) -> Result<(), ResourceError> {
        let (sink, event) = {
            let mut inner = self.state.borrow_mut();
            inner.calls.push(Call::Play);
            if let Some(error) = inner.refuse_next_play.take() {
                return Err(error);
            }
            inner.playing = true;
            if let Some(sink) = inner.sink.clone() {
                inner.pending_plays.push(sink);
            }
            (inner.sink.clone(), inner.emit_during_play.take())
        };

        if let (Some(sink), Some(event)) = (sink, event) {
            sink.emit(event);
        }
        Ok(())
    }

    fn pause(&mut self) {
        let mut inner = self.state.borrow_mut();
        inner.calls.push(Call::Pause);
        inner.playing = false;
    }

    fn seek(&mut self, position: f64) {
        let mut inner = self.state.borrow_mut();
        inner.calls.push(Call::Seek(position));
        inner.position = position;
    }

    fn position(&self) -> f64 {
        self.state.borrow().position
    }

    fn set_volume(&mut self, volume: f64) {
        let mut inner = self.state.borrow_mut();
        inner.calls.push(Call::SetVolume(volume));
        inner.volume = volume;
    }

    fn set_playback_rate(&mut self, rate: f64) {
        let mut inner = self.state.borrow_mut();
        inner.calls.push(Call::SetRate(rate));
        inner.rate = rate;
    }
}

impl Drop for FakeResource {
    fn drop(&mut self) {
        let mut inner = self.state.borrow_mut();
        inner.dropped += 1;
        inner.sink = None;
    }
}

pub fn track(id: &str) -> Track {
    Track::new(id, format!("/music/{}.mp3", id))
}

pub fn tracks(ids: &[&str]) -> Vec<Track> {
    ids.iter().map(|id| track(id)).collect()
}
