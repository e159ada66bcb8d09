//! `HTMLAudioElement` media resource

use crate::error::{ResourceError, ResourceErrorKind};
use crate::events::{MediaEvent, MediaEventSink};
use crate::resource::MediaResource;
use crate::types::{CrossOrigin, PlayerConfig, Preload};
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, HtmlAudioElement, HtmlMediaElement};

type Listener = Closure<dyn FnMut(Event)>;

/// Media resource backed by a detached `<audio>` element
pub struct HtmlMediaResource {
    element: HtmlAudioElement,
    sink: Rc<RefCell<Option<MediaEventSink>>>,
    listeners: Vec<(&'static str, Listener)>,
}

impl HtmlMediaResource {
    /// Create the element, applying the preload and cross-origin options
    pub fn new(config: &PlayerConfig) -> Result<Self, ResourceError> {
        let element = HtmlAudioElement::new()
            .map_err(|e| js_error(ResourceErrorKind::NotSupported, &e))?;

        element.set_preload(match config.preload {
            Preload::None => "none",
            Preload::Metadata => "metadata",
            Preload::Auto => "auto",
        });
        element.set_cross_origin(config.cross_origin.map(|origin| match origin {
            CrossOrigin::Anonymous => "anonymous",
            CrossOrigin::UseCredentials => "use-credentials",
        }));

        let mut resource = Self {
            element,
            sink: Rc::new(RefCell::new(None)),
            listeners: Vec::new(),
        };

        resource.listen("loadedmetadata", |media| MediaEvent::MetadataLoaded {
            duration: media.duration(),
        })?;
        resource.listen("timeupdate", |media| MediaEvent::TimeUpdate {
            position: media.current_time(),
        })?;
        resource.listen("ended", |_| MediaEvent::Ended)?;
        resource.listen("error", |media| MediaEvent::Error(media_error(media)))?;

        Ok(resource)
    }

    /// Underlying element, e.g. for attaching an analyser
    pub fn element(&self) -> &HtmlAudioElement {
        &self.element
    }

    fn listen(
        &mut self,
        event: &'static str,
        map: impl Fn(&HtmlMediaElement) -> MediaEvent + 'static,
    ) -> Result<(), ResourceError> {
        let media: HtmlMediaElement = self.element.clone().into();
        let sink = Rc::clone(&self.sink);

        let listener = Listener::new(move |_event: Event| {
            // Cloned out so the player may resubscribe while handling the event.
            let current = sink.borrow().clone();
            if let Some(current) = current {
                current.emit(map(&media));
            }
        });

        self.element
            .add_event_listener_with_callback(event, listener.as_ref().unchecked_ref())
            .map_err(|e| js_error(ResourceErrorKind::Other, &e))?;
        self.listeners.push((event, listener));
        Ok(())
    }
}

impl MediaResource for HtmlMediaResource {
    fn subscribe(&mut self, sink: MediaEventSink) {
        *self.sink.borrow_mut() = Some(sink);
    }

    fn set_source(&mut self, src: Option<&str>) {
        match src {
            Some(src) => self.element.set_src(src),
            None => {
                // Removing the attribute aborts the fetch without an error event.
                let _ = self.element.remove_attribute("src");
                self.element.load();
            }
        }
    }

    fn load(&mut self) {
        self.element.load();
    }

    fn play(&mut self) -> Result<(), ResourceError> {
        let promise = self
            .element
            .play()
            .map_err(|e| js_error(ResourceErrorKind::NotSupported, &e))?;

        // Bound to the sink current at request time.
        let sink = self.sink.borrow().clone();
        let on_reject: Closure<dyn FnMut(JsValue)> = Closure::once(move |reason: JsValue| {
            if let Some(sink) = sink {
                sink.emit(MediaEvent::PlayRejected(rejection(&reason)));
            }
        });
        let _ = promise.catch(&on_reject);
        on_reject.forget();
        Ok(())
    }

    fn pause(&mut self) {
        let _ = self.element.pause();
    }

    fn seek(&mut self, position: f64) {
        self.element.set_current_time(position);
    }

    fn position(&self) -> f64 {
        self.element.current_time()
    }

    fn set_volume(&mut self, volume: f64) {
        self.element.set_volume(volume);
    }

    fn set_playback_rate(&mut self, rate: f64) {
        self.element.set_playback_rate(rate);
    }
}

impl Drop for HtmlMediaResource {
    fn drop(&mut self) {
        for (event, listener) in self.listeners.drain(..) {
            let _ = self
                .element
                .remove_event_listener_with_callback(event, listener.as_ref().unchecked_ref());
        }
        self.sink.borrow_mut().take();
    }
}

fn media_error(media: &HtmlMediaElement) -> ResourceError {
    match media.error() {
        Some(error) => {
            let kind = match error.code() {
                1 => ResourceErrorKind::Aborted,
                2 => ResourceErrorKind::Network,
                3 => ResourceErrorKind::Decode,
                4 => ResourceErrorKind::NotSupported,
                _ => ResourceErrorKind::Other,
            };
            ResourceError::new(kind, error.message())
        }
        None => ResourceError::new(ResourceErrorKind::Other, "unknown media error"),
    }
}

/// Map a `play()` rejection (a `DOMException`) to a resource error
fn rejection(reason: &JsValue) -> ResourceError {
    let name = js_string(reason, "name").unwrap_or_default();
    let kind = match name.as_str() {
        "NotAllowedError" => ResourceErrorKind::NotAllowed,
        "NotSupportedError" => ResourceErrorKind::NotSupported,
        "AbortError" => ResourceErrorKind::Aborted,
        _ => ResourceErrorKind::Other,
    };
    let message = js_string(reason, "message").unwrap_or(name);
    ResourceError::new(kind, message)
}

fn js_error(kind: ResourceErrorKind, value: &JsValue) -> ResourceError {
    let message = js_string(value, "message")
        .or_else(|| value.as_string())
        .unwrap_or_else(|| format!("{:?}", value));
    ResourceError::new(kind, message)
}

fn js_string(value: &JsValue, key: &str) -> Option<String> {
    js_sys::Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_string())
}
