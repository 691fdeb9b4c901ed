//! Location hash of the current browser window.

use super::{ChangeCallback, Delivery, FragmentIo, ListenerId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;

type HashChangeClosure = Closure<dyn FnMut(web_sys::HashChangeEvent)>;

/// [`FragmentIo`] backed by `window.location.hash` and the `hashchange` event.
pub struct BrowserFragment {
    window: web_sys::Window,
    listeners: HashMap<ListenerId, HashChangeClosure>,
}

impl BrowserFragment {
    /// Binds to the current window, or returns `None` outside a browsing context.
    pub fn new() -> Option<Self> {
        web_sys::window().map(|window| Self {
            window,
            listeners: HashMap::new(),
        })
    }
}

/// Reads and percent-decodes the hash; browsers may escape `|` as `%7C`.
fn read_hash(window: &web_sys::Window) -> String {
    let raw = window.location().hash().unwrap_or_default();
    let raw = raw.strip_prefix('#').unwrap_or(&raw).to_string();
    match js_sys::decode_uri_component(&raw) {
        Ok(decoded) => String::from(decoded),
        Err(_) => raw,
    }
}

/// Calls `callback` with the hash as it is now, rescheduling on the next
/// macrotask while it asks for a retry.
fn deliver(callback: &Rc<RefCell<ChangeCallback>>, window: &web_sys::Window) {
    let delivery = match callback.try_borrow_mut() {
        Ok(mut callback) => (*callback)(&read_hash(window)),
        Err(_) => Delivery::Retry,
    };
    if delivery == Delivery::Handled {
        return;
    }
    let retry_callback = Rc::clone(callback);
    let retry_window = window.clone();
    let retry = Closure::once_into_js(move || deliver(&retry_callback, &retry_window));
    if let Err(err) = window.set_timeout_with_callback(retry.unchecked_ref()) {
        log::error!("failed to schedule hashchange redelivery: {err:?}");
    }
}

impl FragmentIo for BrowserFragment {
    fn read(&self) -> String {
        read_hash(&self.window)
    }

    fn write(&mut self, fragment: &str) {
        if let Err(err) = self.window.location().set_hash(fragment) {
            log::error!("failed to set location hash: {err:?}");
        }
    }

    fn on_change(&mut self, callback: ChangeCallback) -> ListenerId {
        let id = ListenerId::new();
        let window = self.window.clone();
        let callback = Rc::new(RefCell::new(callback));
        // hashchange may arrive after several writes; read the hash as it is now.
        let closure: HashChangeClosure = Closure::new(move |_event: web_sys::HashChangeEvent| {
            deliver(&callback, &window);
        });
        if let Err(err) = self
            .window
            .add_event_listener_with_callback("hashchange", closure.as_ref().unchecked_ref())
        {
            log::error!("failed to register hashchange listener: {err:?}");
        }
        self.listeners.insert(id, closure);
        id
    }

    fn remove_listener(&mut self, id: ListenerId) -> bool {
        match self.listeners.remove(&id) {
            Some(closure) => {
                if let Err(err) = self.window.remove_event_listener_with_callback(
                    "hashchange",
                    closure.as_ref().unchecked_ref(),
                ) {
                    log::error!("failed to remove hashchange listener: {err:?}");
                }
                true
            }
            None => false,
        }
    }
}

impl Drop for BrowserFragment {
    fn drop(&mut self) {
        let ids: Vec<ListenerId> = self.listeners.keys().copied().collect();
        for id in ids {
            self.remove_listener(id);
        }
    }
}
