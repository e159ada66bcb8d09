//! Player instance - one playback state, one binding, one media resource
//!
//! Everything that can change a player (caller intents, resource events,
//! forced pauses from the registry, direct resource operations) goes through
//! a per-player inbox and is applied one input at a time. An input arriving
//! while another is being applied (a resource emitting synchronously, a
//! listener dispatching) waits in the inbox and is handled before the outer
//! call returns.

use crate::binding::{BindingPhase, MediaBinding};
use crate::error::{PlaybackError, Result};
use crate::events::{MediaEvent, MediaEventSink};
use crate::intent::Intent;
use crate::registry::PlaybackRegistry;
use crate::resource::ResourceFactory;
use crate::shuffle::random_seed;
use crate::state::{transition, PlaybackState};
use crate::types::PlayerConfig;
use crate::volume::{clamp_volume, validate_position, validate_rate};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};
use tracing::{debug, info};

/// Identifier of a player within a registry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Fresh random id
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Token returned by [`PlayerInstance::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Rc<dyn Fn(&PlaybackState)>;

enum Input {
    Intent(Intent),
    Media { generation: u64, event: MediaEvent },
    ForcedPause,
    Seek(f64),
    ResourceVolume(f64),
    ResourceRate(f64),
    Unbind,
}

struct PlayerCore {
    state: Rc<PlaybackState>,
    binding: MediaBinding,
}

impl PlayerCore {
    fn handle(&mut self, input: Input) {
        match input {
            Input::Intent(intent) => self.apply_all(vec![intent]),
            Input::Media { generation, event } => {
                let followups = self.binding.handle_event(generation, event, &self.state);
                self.apply_all(followups);
            }
            Input::ForcedPause => {
                debug!("Forced pause from registry");
                self.apply_all(vec![Intent::Pause]);
            }
            Input::Seek(position) => {
                let target = if self.state.duration > 0.0 {
                    position.min(self.state.duration)
                } else {
                    position
                };
                if let Some(reported) = self.binding.seek(target) {
                    self.apply_all(vec![Intent::SetTime(reported)]);
                }
            }
            Input::ResourceVolume(volume) => {
                let volume = if self.state.is_muted { 0.0 } else { volume };
                self.binding.set_volume(volume);
            }
            Input::ResourceRate(rate) => self.binding.set_playback_rate(rate),
            Input::Unbind => self.binding.unbind(),
        }
    }

    /// Apply intents in order, including the follow-ups each one produces
    fn apply_all(&mut self, intents: Vec<Intent>) {
        let mut pending: VecDeque<Intent> = intents.into();
        while let Some(intent) = pending.pop_front() {
            let next = transition(&self.state, &intent);
            if next == *self.state {
                continue;
            }

            let prev = std::mem::replace(&mut self.state, Rc::new(next));
            pending.extend(self.binding.reconcile(&prev, &self.state));
        }
    }
}

struct Shared {
    id: PlayerId,
    registry: Rc<PlaybackRegistry>,
    core: RefCell<PlayerCore>,
    inbox: RefCell<VecDeque<Input>>,

    /// Last published state; what `state()` returns
    snapshot: RefCell<Rc<PlaybackState>>,
    phase: Cell<BindingPhase>,

    listeners: RefCell<Vec<(ListenerId, Listener)>>,
    next_listener: Cell<u64>,
    publishing: Cell<bool>,
    disposed: Cell<bool>,
}

impl Shared {
    fn ensure_live(&self) -> Result<()> {
        if self.disposed.get() {
            return Err(PlaybackError::PlayerDisposed {
                player_id: self.id.to_string(),
            });
        }
        Ok(())
    }

    fn deliver(&self, input: Input) {
        self.inbox.borrow_mut().push_back(input);
        self.pump();
    }

    /// Drain the inbox unless an outer call is already doing so
    fn pump(&self) {
        loop {
            let Ok(mut core) = self.core.try_borrow_mut() else {
                return;
            };
            let input = self.inbox.borrow_mut().pop_front();
            match input {
                Some(input) => core.handle(input),
                None => {
                    self.phase.set(core.binding.phase());
                    break;
                }
            }
        }
        self.publish();
    }

    /// Notify listeners until the published snapshot is current
    fn publish(&self) {
        if self.publishing.replace(true) {
            return;
        }

        loop {
            let current = match self.core.try_borrow() {
                Ok(core) => Rc::clone(&core.state),
                Err(_) => break,
            };
            if Rc::ptr_eq(&*self.snapshot.borrow(), &current) {
                break;
            }
            *self.snapshot.borrow_mut() = Rc::clone(&current);

            let listeners: Vec<Listener> = self
                .listeners
                .borrow()
                .iter()
                .map(|(_, listener)| Rc::clone(listener))
                .collect();
            for listener in listeners {
                listener(&current);
            }
        }

        self.publishing.set(false);
    }

    fn dispatch(&self, intent: Intent) -> Result<()> {
        self.ensure_live()?;
        let intent = intent.normalized()?;
        self.deliver(Input::Intent(intent));
        Ok(())
    }

    fn seek(&self, position: f64) -> Result<()> {
        self.ensure_live()?;
        let position = validate_position(position)?;
        self.deliver(Input::Seek(position));
        Ok(())
    }

    fn set_volume(&self, volume: f64) -> Result<()> {
        self.ensure_live()?;
        self.deliver(Input::ResourceVolume(clamp_volume(volume)));
        Ok(())
    }

    fn set_playback_rate(&self, rate: f64) -> Result<()> {
        self.ensure_live()?;
        let rate = validate_rate(rate)?;
        self.deliver(Input::ResourceRate(rate));
        Ok(())
    }

    fn state(&self) -> Rc<PlaybackState> {
        Rc::clone(&*self.snapshot.borrow())
    }
}

/// A mounted player
///
/// Dropping the instance disposes it: it leaves the registry and releases its
/// media resource.
pub struct PlayerInstance {
    shared: Rc<Shared>,
}

impl PlayerInstance {
    /// Create a player with a generated id
    pub fn new(
        registry: Rc<PlaybackRegistry>,
        factory: &dyn ResourceFactory,
        config: PlayerConfig,
    ) -> Result<Self> {
        Self::with_id(PlayerId::generate(), registry, factory, config)
    }

    /// Create a player with a caller-chosen id
    ///
    /// Fails if the id is already registered or the factory cannot create a
    /// resource; nothing is left registered in either case.
    pub fn with_id(
        id: impl Into<PlayerId>,
        registry: Rc<PlaybackRegistry>,
        factory: &dyn ResourceFactory,
        config: PlayerConfig,
    ) -> Result<Self> {
        let id = id.into();
        if registry.is_registered(id.as_str()) {
            return Err(PlaybackError::DuplicatePlayerId(id.to_string()));
        }

        let config = config.normalized();
        let seed = config.shuffle_seed.unwrap_or_else(random_seed);
        let state = Rc::new(PlaybackState::new(&config, seed));
        let resource = factory.create(&config)?;

        let shared = Rc::new_cyclic(|weak: &Weak<Shared>| {
            let sink_owner = weak.clone();
            let sink_factory = move |generation: u64| {
                let owner = sink_owner.clone();
                MediaEventSink::new(generation, move |generation, event| {
                    if let Some(shared) = owner.upgrade() {
                        shared.deliver(Input::Media { generation, event });
                    }
                })
            };

            let announcer = Rc::clone(&registry);
            let announce_id = id.clone();
            let announce_play = move || announcer.notify_play_started(announce_id.as_str());

            Shared {
                id: id.clone(),
                registry: Rc::clone(&registry),
                core: RefCell::new(PlayerCore {
                    state: Rc::clone(&state),
                    binding: MediaBinding::new(sink_factory, announce_play),
                }),
                inbox: RefCell::new(VecDeque::new()),
                snapshot: RefCell::new(Rc::clone(&state)),
                phase: Cell::new(BindingPhase::Idle),
                listeners: RefCell::new(Vec::new()),
                next_listener: Cell::new(0),
                publishing: Cell::new(false),
                disposed: Cell::new(false),
            }
        });

        let owner = Rc::downgrade(&shared);
        registry.register(id.as_str(), move || {
            if let Some(shared) = owner.upgrade() {
                shared.deliver(Input::ForcedPause);
            }
        })?;

        {
            let mut core = shared.core.borrow_mut();
            let state = Rc::clone(&core.state);
            let followups = core.binding.bind(resource, &state);
            core.apply_all(followups);
        }
        shared.pump();

        info!("Player {} mounted", id);
        Ok(Self { shared })
    }

    pub fn id(&self) -> &PlayerId {
        &self.shared.id
    }

    /// Latest state snapshot
    pub fn state(&self) -> Rc<PlaybackState> {
        self.shared.state()
    }

    /// Current binding phase
    pub fn phase(&self) -> BindingPhase {
        self.shared.phase.get()
    }

    pub fn registry(&self) -> &Rc<PlaybackRegistry> {
        &self.shared.registry
    }

    /// Apply an intent
    ///
    /// Volume is clamped; an invalid playback rate is rejected before it
    /// reaches the state.
    pub fn dispatch(&self, intent: Intent) -> Result<()> {
        self.shared.dispatch(intent)
    }

    /// Apply several intents in order; stops at the first invalid one
    pub fn dispatch_all(&self, intents: impl IntoIterator<Item = Intent>) -> Result<()> {
        for intent in intents {
            self.dispatch(intent)?;
        }
        Ok(())
    }

    /// Advance the repeat control: off -> all -> one -> off
    pub fn cycle_repeat(&self) -> Result<()> {
        let intents = self.state().repeat_cycle_intents();
        self.dispatch_all(intents)
    }

    /// Move the resource's position, then mirror the reported position
    ///
    /// The target is clamped to the known duration.
    pub fn seek(&self, position: f64) -> Result<()> {
        self.shared.seek(position)
    }

    /// Set the resource volume directly, bypassing the state
    ///
    /// The resource stays silent while the player is muted.
    pub fn set_volume(&self, volume: f64) -> Result<()> {
        self.shared.set_volume(volume)
    }

    /// Set the resource playback rate directly, bypassing the state
    pub fn set_playback_rate(&self, rate: f64) -> Result<()> {
        self.shared.set_playback_rate(rate)
    }

    /// Weak handle for code that must not keep the player alive
    pub fn handle(&self) -> PlayerHandle {
        PlayerHandle {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Call `listener` with every new state
    pub fn subscribe(&self, listener: impl Fn(&PlaybackState) + 'static) -> ListenerId {
        let id = ListenerId(self.shared.next_listener.get());
        self.shared.next_listener.set(id.0 + 1);
        let listener: Listener = Rc::new(listener);
        self.shared.listeners.borrow_mut().push((id, listener));
        id
    }

    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.shared.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    pub fn is_disposed(&self) -> bool {
        self.shared.disposed.get()
    }

    /// Leave the registry and release the media resource
    ///
    /// Later operations fail with [`PlaybackError::PlayerDisposed`].
    pub fn dispose(&self) {
        if self.shared.disposed.replace(true) {
            return;
        }

        self.shared.registry.unregister(self.shared.id.as_str());
        self.shared.deliver(Input::Unbind);
        self.shared.listeners.borrow_mut().clear();
        info!("Player {} disposed", self.shared.id);
    }
}

impl Drop for PlayerInstance {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for PlayerInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerInstance")
            .field("id", &self.shared.id)
            .field("phase", &self.shared.phase.get())
            .field("disposed", &self.shared.disposed.get())
            .finish_non_exhaustive()
    }
}

/// Non-owning access to a player
///
/// Every operation fails with [`PlaybackError::PlayerUnavailable`] once the
/// player instance is gone.
#[derive(Clone)]
pub struct PlayerHandle {
    shared: Weak<Shared>,
}

impl PlayerHandle {
    fn live(&self) -> Result<Rc<Shared>> {
        self.shared.upgrade().ok_or(PlaybackError::PlayerUnavailable)
    }

    pub fn id(&self) -> Result<PlayerId> {
        Ok(self.live()?.id.clone())
    }

    pub fn state(&self) -> Result<Rc<PlaybackState>> {
        let shared = self.live()?;
        shared.ensure_live()?;
        Ok(shared.state())
    }

    pub fn dispatch(&self, intent: Intent) -> Result<()> {
        self.live()?.dispatch(intent)
    }

    pub fn seek(&self, position: f64) -> Result<()> {
        self.live()?.seek(position)
    }

    pub fn set_volume(&self, volume: f64) -> Result<()> {
        self.live()?.set_volume(volume)
    }

    pub fn set_playback_rate(&self, rate: f64) -> Result<()> {
        self.live()?.set_playback_rate(rate)
    }

    pub fn is_available(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| !shared.disposed.get())
    }
}

impl fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("available", &self.is_available())
            .finish()
    }
}
