//! Browser document backed by `web-sys`

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{
    AddEventListenerOptions, Document, Element, EventTarget, HtmlElement, HtmlImageElement,
    HtmlInputElement, IntersectionObserver, IntersectionObserverEntry, IntersectionObserverInit,
    Node, NodeList, ScrollToOptions, Window,
};

use super::{
    Dom, Event, EventKind, Handler, IntersectionCallback, IntersectionEntry, IntersectionOptions,
    ListenOptions, ListenerId, ObserverId, PolicyId, ScrollBehavior, Target, Task, TimerId,
};
use crate::error::{Error, Result};

/// Fallback delay when `requestIdleCallback` is unavailable
const IDLE_FALLBACK_MS: i32 = 16;

const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

struct Listener {
    target: EventTarget,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

struct Observer {
    observer: IntersectionObserver,
    _closure: Closure<dyn FnMut(Array, IntersectionObserver)>,
}

struct Inner {
    window: Window,
    document: Document,
    next_handle: Cell<u64>,
    listeners: RefCell<HashMap<u64, Listener>>,
    observers: RefCell<HashMap<u64, Observer>>,
    policies: RefCell<HashMap<u64, (String, JsValue)>>,
}

/// The live browser document
#[derive(Clone)]
pub struct WebDom {
    inner: Rc<Inner>,
}

impl WebDom {
    /// Bind to the current window, or `None` outside a browser page
    pub fn new() -> Option<Self> {
        let window = web_sys::window()?;
        let document = window.document()?;
        Some(Self {
            inner: Rc::new(Inner {
                window,
                document,
                next_handle: Cell::new(1),
                listeners: RefCell::new(HashMap::new()),
                observers: RefCell::new(HashMap::new()),
                policies: RefCell::new(HashMap::new()),
            }),
        })
    }

    /// Whether the document is still being parsed
    pub fn is_loading(&self) -> bool {
        self.inner.document.ready_state() == "loading"
    }

    fn handle(&self) -> u64 {
        let id = self.inner.next_handle.get();
        self.inner.next_handle.set(id + 1);
        id
    }

    fn event_target(&self, target: Target<'_, Element>) -> EventTarget {
        match target {
            Target::Window => self.inner.window.clone().into(),
            Target::Document => self.inner.document.clone().into(),
            Target::Node(node) => node.clone().into(),
        }
    }

    fn trusted_types(&self) -> Option<JsValue> {
        Reflect::get(&self.inner.window, &JsValue::from_str("trustedTypes"))
            .ok()
            .filter(|tt| !tt.is_undefined() && !tt.is_null())
    }

    fn store_policy(&self, name: &str, policy: JsValue) -> PolicyId {
        let id = self.handle();
        self.inner
            .policies
            .borrow_mut()
            .insert(id, (name.to_string(), policy));
        PolicyId(id)
    }
}

/// Drop `listener` from a zero-delay timeout. A handler may remove its own
/// listener, and its closure must outlive that call.
fn release_later(window: &Window, listener: Listener) {
    let release = Closure::once_into_js(move || drop(listener));
    if let Err(e) = window
        .set_timeout_with_callback_and_timeout_and_arguments_0(release.unchecked_ref(), 0)
    {
        tracing::warn!("setTimeout failed, listener closure leaked: {}", describe(&e));
    }
}

/// Readable message for a thrown JavaScript value
fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{:?}", value))
}

fn dom_error(value: JsValue) -> Error {
    Error::Dom(describe(&value))
}

fn elements(list: NodeList) -> Vec<Element> {
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

fn method(object: &JsValue, name: &str) -> Option<Function> {
    Reflect::get(object, &JsValue::from_str(name))
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
}

impl Dom for WebDom {
    type Node = Element;

    fn element_by_id(&self, id: &str) -> Option<Element> {
        self.inner.document.get_element_by_id(id)
    }

    fn query_all(&self, selector: &str) -> Vec<Element> {
        match self.inner.document.query_selector_all(selector) {
            Ok(list) => elements(list),
            Err(e) => {
                tracing::warn!("Invalid selector {:?}: {}", selector, describe(&e));
                Vec::new()
            }
        }
    }

    fn query_within(&self, root: &Element, selector: &str) -> Vec<Element> {
        match root.query_selector_all(selector) {
            Ok(list) => elements(list),
            Err(e) => {
                tracing::warn!("Invalid selector {:?}: {}", selector, describe(&e));
                Vec::new()
            }
        }
    }

    fn body(&self) -> Option<Element> {
        self.inner.document.body().map(Into::into)
    }

    fn contains(&self, ancestor: &Element, node: &Element) -> bool {
        let node: &Node = node.as_ref();
        ancestor.contains(Some(node))
    }

    fn create_element(&self, tag: &str) -> Result<Element> {
        self.inner.document.create_element(tag).map_err(dom_error)
    }

    fn append_child(&self, parent: &Element, child: &Element) {
        if let Err(e) = parent.append_child(child) {
            tracing::warn!("appendChild failed: {}", describe(&e));
        }
    }

    /// Appends through a document fragment so the document is mutated once
    fn append_children(&self, parent: &Element, children: &[Element]) {
        let fragment = self.inner.document.create_document_fragment();
        for child in children {
            if let Err(e) = fragment.append_child(child) {
                tracing::warn!("appendChild failed: {}", describe(&e));
            }
        }
        if let Err(e) = parent.append_child(&fragment) {
            tracing::warn!("appendChild failed: {}", describe(&e));
        }
    }

    fn insert_after(&self, anchor: &Element, node: &Element) {
        if let Err(e) = anchor.after_with_node_1(node) {
            tracing::warn!("Element.after failed: {}", describe(&e));
        }
    }

    fn remove(&self, node: &Element) {
        node.remove();
    }

    fn is_connected(&self, node: &Element) -> bool {
        node.is_connected()
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) {
        if let Err(e) = node.set_attribute(name, value) {
            tracing::warn!("setAttribute({}) failed: {}", name, describe(&e));
        }
    }

    fn add_class(&self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().add_1(class) {
            tracing::warn!("classList.add({}) failed: {}", class, describe(&e));
        }
    }

    fn remove_class(&self, node: &Element, class: &str) {
        if let Err(e) = node.class_list().remove_1(class) {
            tracing::warn!("classList.remove({}) failed: {}", class, describe(&e));
        }
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn set_class_name(&self, node: &Element, value: &str) {
        node.set_class_name(value);
    }

    fn text(&self, node: &Element) -> String {
        node.text_content().unwrap_or_default()
    }

    fn set_text(&self, node: &Element, text: &str) {
        node.set_text_content(Some(text));
    }

    fn value(&self, node: &Element) -> String {
        node.dyn_ref::<HtmlInputElement>()
            .map(|input| input.value())
            .unwrap_or_default()
    }

    fn set_value(&self, node: &Element, value: &str) {
        if let Some(input) = node.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
        }
    }

    fn set_style(&self, node: &Element, property: &str, value: Option<&str>) {
        let Some(element) = node.dyn_ref::<HtmlElement>() else {
            return;
        };
        let style = element.style();
        let result = match value {
            Some(value) => style.set_property(property, value),
            None => style.remove_property(property).map(|_| ()),
        };
        if let Err(e) = result {
            tracing::warn!("Setting style {} failed: {}", property, describe(&e));
        }
    }

    fn image_complete(&self, node: &Element) -> bool {
        node.dyn_ref::<HtmlImageElement>()
            .map(|img| img.complete())
            .unwrap_or(false)
    }

    fn offset_height(&self, node: &Element) -> f64 {
        node.dyn_ref::<HtmlElement>()
            .map(|element| f64::from(element.offset_height()))
            .unwrap_or(0.0)
    }

    fn viewport_top(&self, node: &Element) -> f64 {
        node.get_bounding_client_rect().top()
    }

    fn scroll_y(&self) -> f64 {
        self.inner.window.scroll_y().unwrap_or(0.0)
    }

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior) {
        let options = ScrollToOptions::new();
        options.set_top(top);
        options.set_behavior(match behavior {
            ScrollBehavior::Auto => web_sys::ScrollBehavior::Auto,
            ScrollBehavior::Smooth => web_sys::ScrollBehavior::Smooth,
        });
        self.inner.window.scroll_to_with_scroll_to_options(&options);
    }

    fn prefers_reduced_motion(&self) -> bool {
        self.inner
            .window
            .match_media(REDUCED_MOTION_QUERY)
            .ok()
            .flatten()
            .map(|query| query.matches())
            .unwrap_or(false)
    }

    fn listen(
        &self,
        target: Target<'_, Element>,
        kind: EventKind,
        options: ListenOptions,
        mut handler: Handler<Element>,
    ) -> ListenerId {
        let id = self.handle();
        let target = self.event_target(target);
        let once = options.once;
        let weak = Rc::downgrade(&self.inner);

        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let element = event.target().and_then(|t| t.dyn_into::<Element>().ok());
            let wrapped = Event::new(element);
            handler(&wrapped);
            if wrapped.is_default_prevented() {
                event.prevent_default();
            }

            // The browser has already dropped a once listener; release ours
            if once {
                if let Some(inner) = weak.upgrade() {
                    let fired = inner.listeners.borrow_mut().remove(&id);
                    if let Some(listener) = fired {
                        release_later(&inner.window, listener);
                    }
                }
            }
        });

        let js_options = AddEventListenerOptions::new();
        js_options.set_once(once);
        js_options.set_passive(options.passive);
        if let Err(e) = target.add_event_listener_with_callback_and_add_event_listener_options(
            kind.as_str(),
            closure.as_ref().unchecked_ref(),
            &js_options,
        ) {
            tracing::warn!("addEventListener({}) failed: {}", kind.as_str(), describe(&e));
        }

        self.inner.listeners.borrow_mut().insert(
            id,
            Listener {
                target,
                kind: kind.as_str(),
                closure,
            },
        );
        ListenerId(id)
    }

    fn unlisten(&self, id: ListenerId) {
        let removed = self.inner.listeners.borrow_mut().remove(&id.0);
        let Some(listener) = removed else {
            return;
        };
        let function: &Function = listener.closure.as_ref().unchecked_ref();
        if let Err(e) = listener
            .target
            .remove_event_listener_with_callback(listener.kind, function)
        {
            tracing::warn!("removeEventListener failed: {}", describe(&e));
        }
        release_later(&self.inner.window, listener);
    }

    fn create_intersection_observer(
        &self,
        options: &IntersectionOptions,
        mut callback: IntersectionCallback<Element>,
    ) -> Option<ObserverId> {
        let supported = Reflect::has(&self.inner.window, &JsValue::from_str("IntersectionObserver"))
            .unwrap_or(false);
        if !supported {
            return None;
        }

        let id = ObserverId(self.handle());
        let closure = Closure::<dyn FnMut(Array, IntersectionObserver)>::new(
            move |entries: Array, _observer: IntersectionObserver| {
                let entries = entries
                    .iter()
                    .map(|entry| entry.unchecked_into::<IntersectionObserverEntry>())
                    .map(|entry| IntersectionEntry {
                        target: entry.target(),
                        is_intersecting: entry.is_intersecting(),
                    })
                    .collect();
                callback(id, entries);
            },
        );

        let init = IntersectionObserverInit::new();
        init.set_root_margin(&options.root_margin);
        init.set_threshold(&JsValue::from_f64(options.threshold));

        match IntersectionObserver::new_with_options(closure.as_ref().unchecked_ref(), &init) {
            Ok(observer) => {
                self.inner.observers.borrow_mut().insert(
                    id.0,
                    Observer {
                        observer,
                        _closure: closure,
                    },
                );
                Some(id)
            }
            Err(e) => {
                tracing::warn!("IntersectionObserver unavailable: {}", describe(&e));
                None
            }
        }
    }

    fn observe(&self, observer: ObserverId, node: &Element) {
        if let Some(entry) = self.inner.observers.borrow().get(&observer.0) {
            entry.observer.observe(node);
        }
    }

    fn unobserve(&self, observer: ObserverId, node: &Element) {
        if let Some(entry) = self.inner.observers.borrow().get(&observer.0) {
            entry.observer.unobserve(node);
        }
    }

    fn request_animation_frame(&self, task: Task) {
        let callback = Closure::once_into_js(move || task());
        if let Err(e) = self
            .inner
            .window
            .request_animation_frame(callback.unchecked_ref())
        {
            tracing::warn!("requestAnimationFrame failed: {}", describe(&e));
        }
    }

    fn request_idle(&self, task: Task) {
        let callback = Closure::once_into_js(move || task());
        let window = &self.inner.window;

        if let Some(request) = method(window, "requestIdleCallback") {
            if request.call1(window, &callback).is_ok() {
                return;
            }
        }
        if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            IDLE_FALLBACK_MS,
        ) {
            tracing::warn!("setTimeout failed: {}", describe(&e));
        }
    }

    fn set_timeout(&self, delay_ms: u32, task: Task) -> TimerId {
        let callback = Closure::once_into_js(move || task());
        let delay = i32::try_from(delay_ms).unwrap_or(i32::MAX);
        if let Err(e) = self
            .inner
            .window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), delay)
        {
            tracing::warn!("setTimeout failed: {}", describe(&e));
        }
        TimerId(self.handle())
    }

    fn supports_trusted_types(&self) -> bool {
        self.trusted_types().is_some()
    }

    fn create_html_policy(&self, name: &str) -> Result<PolicyId> {
        let tt = self
            .trusted_types()
            .ok_or_else(|| Error::TrustPolicy("trusted types are not available".to_string()))?;
        let create = method(&tt, "createPolicy")
            .ok_or_else(|| Error::TrustPolicy("createPolicy is not a function".to_string()))?;

        let rules = Object::new();
        let passthrough = Closure::<dyn Fn(String) -> String>::new(|markup: String| markup);
        Reflect::set(&rules, &JsValue::from_str("createHTML"), &passthrough.into_js_value())
            .map_err(|e| Error::TrustPolicy(describe(&e)))?;

        let policy = create
            .call2(&tt, &JsValue::from_str(name), &rules)
            .map_err(|e| Error::TrustPolicy(describe(&e)))?;
        Ok(self.store_policy(name, policy))
    }

    fn html_policy(&self, name: &str) -> Option<PolicyId> {
        let known = self
            .inner
            .policies
            .borrow()
            .iter()
            .find(|(_, (n, _))| n == name)
            .map(|(id, _)| PolicyId(*id));
        if known.is_some() {
            return known;
        }

        let tt = self.trusted_types()?;
        let policy = method(&tt, "getPolicy")?
            .call1(&tt, &JsValue::from_str(name))
            .ok()
            .filter(|p| !p.is_undefined() && !p.is_null())?;
        Some(self.store_policy(name, policy))
    }

    fn set_inner_html(&self, node: &Element, markup: &str, policy: Option<PolicyId>) -> Result<()> {
        let Some(policy) = policy else {
            node.set_inner_html(markup);
            return Ok(());
        };

        let policy = self
            .inner
            .policies
            .borrow()
            .get(&policy.0)
            .map(|(_, object)| object.clone())
            .ok_or_else(|| Error::TrustPolicy(format!("Unknown policy {:?}", policy)))?;
        let create_html = method(&policy, "createHTML")
            .ok_or_else(|| Error::TrustPolicy("createHTML is not a function".to_string()))?;
        let trusted = create_html
            .call1(&policy, &JsValue::from_str(markup))
            .map_err(|e| Error::TrustPolicy(describe(&e)))?;

        Reflect::set(node, &JsValue::from_str("innerHTML"), &trusted).map_err(dom_error)?;
        Ok(())
    }
}
