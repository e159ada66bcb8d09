//! WASM bindings for sonority-playback
//!
//! A [`MediaResource`](crate::MediaResource) over `HTMLAudioElement` plus
//! JavaScript-friendly wrappers around the player and the registry.

pub mod player;
pub mod resource;

pub use player::{WasmPlayer, WasmRegistry};
pub use resource::HtmlMediaResource;
