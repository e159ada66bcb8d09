//! JS-facing player and registry wrappers

use super::resource::HtmlMediaResource;
use crate::error::{PlaybackError, ResourceError};
use crate::intent::Intent;
use crate::registry::PlaybackRegistry;
use crate::resource::MediaResource;
use crate::state::PlaybackState;
use crate::types::PlayerConfig;
use crate::PlayerInstance;
use js_sys::Function;
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

/// Registry shared by the players of one page
#[wasm_bindgen]
pub struct WasmRegistry {
    inner: Rc<PlaybackRegistry>,
}

#[wasm_bindgen]
impl WasmRegistry {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            inner: PlaybackRegistry::shared(),
        }
    }

    /// Id of the player currently allowed to play
    #[wasm_bindgen(js_name = activePlayer)]
    pub fn active_player(&self) -> Option<String> {
        self.inner.active_player()
    }

    /// Number of mounted players
    #[wasm_bindgen(getter)]
    pub fn size(&self) -> usize {
        self.inner.len()
    }
}

impl Default for WasmRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// WASM-compatible player
///
/// Wraps a [`PlayerInstance`] driving its own `<audio>` element.
#[wasm_bindgen]
pub struct WasmPlayer {
    inner: PlayerInstance,
    on_state_change: Rc<RefCell<Option<Function>>>,
}

#[wasm_bindgen]
impl WasmPlayer {
    /// Mount a player; `config` is an optional `PlayerConfig` object
    #[wasm_bindgen(constructor)]
    pub fn new(registry: &WasmRegistry, config: JsValue) -> Result<WasmPlayer, JsValue> {
        console_error_panic_hook::set_once();

        let config: PlayerConfig = if config.is_undefined() || config.is_null() {
            PlayerConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config)
                .map_err(|e| JsValue::from_str(&format!("Failed to parse config: {}", e)))?
        };

        let factory = |config: &PlayerConfig| -> Result<Box<dyn MediaResource>, ResourceError> {
            Ok(Box::new(HtmlMediaResource::new(config)?))
        };
        let inner = PlayerInstance::new(Rc::clone(&registry.inner), &factory, config)
            .map_err(to_js)?;

        let on_state_change: Rc<RefCell<Option<Function>>> = Rc::new(RefCell::new(None));
        let callback = Rc::clone(&on_state_change);
        inner.subscribe(move |state| {
            let current = callback.borrow().clone();
            if let Some(cb) = current {
                if let Ok(value) = state_to_js(state) {
                    cb.call1(&JsValue::NULL, &value).ok();
                }
            }
        });

        Ok(Self {
            inner,
            on_state_change,
        })
    }

    #[wasm_bindgen(getter)]
    pub fn id(&self) -> String {
        self.inner.id().to_string()
    }

    /// Dispatch an intent object: `{ type: "SET_TRACK", payload: {...} }`
    pub fn dispatch(&self, intent: JsValue) -> Result<(), JsValue> {
        let intent: Intent = serde_wasm_bindgen::from_value(intent)
            .map_err(|e| JsValue::from_str(&format!("Failed to parse intent: {}", e)))?;
        self.inner.dispatch(intent).map_err(to_js)
    }

    /// Current state as a plain object
    #[wasm_bindgen(js_name = getState)]
    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        state_to_js(&self.inner.state())
    }

    /// Binding phase, e.g. `"readyPlaying"`
    #[wasm_bindgen(js_name = getPhase)]
    pub fn get_phase(&self) -> JsValue {
        serde_wasm_bindgen::to_value(&self.inner.phase()).unwrap_or(JsValue::NULL)
    }

    /// Seek to position in seconds
    pub fn seek(&self, position_secs: f64) -> Result<(), JsValue> {
        self.inner.seek(position_secs).map_err(to_js)
    }

    /// Set the element volume (0.0 - 1.0) without touching the state
    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: f64) -> Result<(), JsValue> {
        self.inner.set_volume(volume).map_err(to_js)
    }

    /// Set the element playback rate without touching the state
    #[wasm_bindgen(js_name = setPlaybackRate)]
    pub fn set_playback_rate(&self, rate: f64) -> Result<(), JsValue> {
        self.inner.set_playback_rate(rate).map_err(to_js)
    }

    /// Advance repeat: off -> all -> one -> off
    #[wasm_bindgen(js_name = cycleRepeat)]
    pub fn cycle_repeat(&self) -> Result<(), JsValue> {
        self.inner.cycle_repeat().map_err(to_js)
    }

    /// Register state change callback
    #[wasm_bindgen(js_name = onStateChange)]
    pub fn on_state_change(&self, callback: Function) {
        *self.on_state_change.borrow_mut() = Some(callback);
    }

    /// Unmount: leave the registry and release the element
    pub fn dispose(&self) {
        self.on_state_change.borrow_mut().take();
        self.inner.dispose();
    }
}

fn state_to_js(state: &PlaybackState) -> Result<JsValue, JsValue> {
    // Plain objects instead of `Map`s for the flattened track metadata
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    state
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&format!("Failed to serialize state: {}", e)))
}

fn to_js(error: PlaybackError) -> JsValue {
    JsValue::from_str(&error.to_string())
}
