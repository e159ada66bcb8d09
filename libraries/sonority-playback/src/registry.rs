//! Single-active-player arbitration
//!
//! Several players can live on one page. Starting playback on one of them
//! pauses whichever other player was active, so at most one stream is audible
//! across a registry. The registry is constructed explicitly and handed to
//! every player that should take part.

use crate::error::{PlaybackError, Result};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use tracing::debug;

type ForcedPause = Rc<dyn Fn()>;

#[derive(Default)]
struct RegistryInner {
    active: Option<String>,
    players: HashMap<String, ForcedPause>,
}

/// Tracks which registered player is currently audible
#[derive(Default)]
pub struct PlaybackRegistry {
    inner: RefCell<RegistryInner>,
}

impl PlaybackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// New registry behind an `Rc`, ready to pass to players
    pub fn shared() -> Rc<Self> {
        Rc::new(Self::new())
    }

    /// Register a player with the callback used to pause it
    ///
    /// `on_forced_pause` must make that player dispatch `Pause`.
    pub fn register(&self, player_id: &str, on_forced_pause: impl Fn() + 'static) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.players.contains_key(player_id) {
            return Err(PlaybackError::DuplicatePlayerId(player_id.to_string()));
        }

        inner
            .players
            .insert(player_id.to_string(), Rc::new(on_forced_pause));
        debug!("Registered player {}", player_id);
        Ok(())
    }

    /// Remove a player; an active player is simply forgotten
    ///
    /// Returns whether the player was registered.
    pub fn unregister(&self, player_id: &str) -> bool {
        let mut inner = self.inner.borrow_mut();
        if inner.active.as_deref() == Some(player_id) {
            inner.active = None;
        }
        inner.players.remove(player_id).is_some()
    }

    /// Record `player_id` as the active player, pausing the previous one
    ///
    /// Unregistered ids are accepted; they become active with nothing to
    /// pause. Notifying for the already active player does nothing.
    pub fn notify_play_started(&self, player_id: &str) {
        let displaced = {
            let inner = self.inner.borrow();
            match inner.active.as_deref() {
                Some(active) if active != player_id => inner
                    .players
                    .get(active)
                    .map(|pause| (active.to_string(), Rc::clone(pause))),
                _ => None,
            }
        };

        // The borrow is released before calling out: the paused player runs
        // its own dispatch from inside the callback.
        if let Some((previous, pause)) = displaced {
            debug!("Player {} started, pausing {}", player_id, previous);
            pause();
        }

        self.inner.borrow_mut().active = Some(player_id.to_string());
    }

    /// Id of the currently active player
    pub fn active_player(&self) -> Option<String> {
        self.inner.borrow().active.clone()
    }

    pub fn is_registered(&self, player_id: &str) -> bool {
        self.inner.borrow().players.contains_key(player_id)
    }

    /// Number of registered players
    pub fn len(&self) -> usize {
        self.inner.borrow().players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for PlaybackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("PlaybackRegistry")
            .field("active", &inner.active)
            .field("players", &inner.players.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, impl Fn() + 'static) {
        let count = Rc::new(Cell::new(0));
        let handle = Rc::clone(&count);
        (count, move || handle.set(handle.get() + 1))
    }

    #[test]
    fn second_player_pauses_first() {
        let registry = PlaybackRegistry::new();
        let (a_paused, a_pause) = counter();
        let (b_paused, b_pause) = counter();
        registry.register("a", a_pause).unwrap();
        registry.register("b", b_pause).unwrap();

        registry.notify_play_started("a");
        registry.notify_play_started("b");

        assert_eq!(a_paused.get(), 1);
        assert_eq!(b_paused.get(), 0);
        assert_eq!(registry.active_player().as_deref(), Some("b"));
    }

    #[test]
    fn renotify_same_player_does_nothing() {
        let registry = PlaybackRegistry::new();
        let (paused, pause) = counter();
        registry.register("a", pause).unwrap();

        registry.notify_play_started("a");
        registry.notify_play_started("a");

        assert_eq!(paused.get(), 0);
        assert_eq!(registry.active_player().as_deref(), Some("a"));
    }

    #[test]
    fn duplicate_registration_fails() {
        let registry = PlaybackRegistry::new();
        registry.register("a", || {}).unwrap();
        assert!(matches!(
            registry.register("a", || {}),
            Err(PlaybackError::DuplicatePlayerId(id)) if id == "a"
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregistered_id_becomes_active() {
        let registry = PlaybackRegistry::new();
        registry.notify_play_started("ghost");
        assert_eq!(registry.active_player().as_deref(), Some("ghost"));
    }

    #[test]
    fn unregister_active_forgets_it() {
        let registry = PlaybackRegistry::new();
        let (a_paused, a_pause) = counter();
        registry.register("a", a_pause).unwrap();
        registry.register("b", || {}).unwrap();

        registry.notify_play_started("a");
        assert!(registry.unregister("a"));
        assert!(registry.active_player().is_none());

        registry.notify_play_started("b");
        assert_eq!(a_paused.get(), 0);
        assert!(!registry.unregister("a"));
        assert!(!registry.is_registered("a"));
    }

    #[test]
    fn callback_may_query_registry() {
        let registry = Rc::new(PlaybackRegistry::new());
        let seen = Rc::new(RefCell::new(None));

        let reg = Rc::clone(&registry);
        let log = Rc::clone(&seen);
        registry
            .register("a", move || {
                *log.borrow_mut() = reg.active_player();
            })
            .unwrap();

        registry.notify_play_started("a");
        registry.notify_play_started("b");

        // Callback runs before the new player is recorded
        assert_eq!(seen.borrow().as_deref(), Some("a"));
        assert_eq!(registry.active_player().as_deref(), Some("b"));
    }
}
