//! Submit handling and transient feedback messages

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use super::is_valid_email;
use crate::config::NewsletterConfig;
use crate::dom::{Dom, Event, EventKind, ListenOptions, ListenerId, Target};
use crate::error::Result;

/// Result of a form submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The address passed validation; carries the trimmed address
    Subscribed(String),
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

struct Message<N> {
    node: N,
    kind: MessageKind,
    generation: u64,
    dismiss_listener: ListenerId,
}

/// Validates signups client-side and shows a message after the form.
///
/// At most one message is shown at a time. Each message removes itself
/// after its delay unless a newer message replaced it first.
pub struct NewsletterForm<D: Dom> {
    dom: D,
    form: D::Node,
    input: D::Node,
    config: NewsletterConfig,
    message: RefCell<Option<Message<D::Node>>>,
    generation: Cell<u64>,
    listener: Cell<Option<ListenerId>>,
    weak_self: Weak<Self>,
}

impl<D: Dom> NewsletterForm<D> {
    /// Look up the form and its email field
    pub fn find(dom: D, config: NewsletterConfig) -> Option<Rc<Self>> {
        let Some(form) = dom.query_first(&config.form_selector) else {
            tracing::debug!("No newsletter form found");
            return None;
        };
        let Some(input) = dom.query_within(&form, &config.input_selector).into_iter().next()
        else {
            tracing::debug!("Newsletter form has no email field");
            return None;
        };

        Some(Rc::new_cyclic(|weak_self| Self {
            dom,
            form,
            input,
            config,
            message: RefCell::new(None),
            generation: Cell::new(0),
            listener: Cell::new(None),
            weak_self: weak_self.clone(),
        }))
    }

    /// Bind the submit listener. Calling it again while attached does nothing.
    pub fn attach(&self) {
        if self.listener.get().is_some() {
            return;
        }
        let weak = self.weak_self.clone();
        let id = self.dom.listen(
            Target::Node(&self.form),
            EventKind::Submit,
            ListenOptions::default(),
            Box::new(move |event| {
                if let Some(form) = weak.upgrade() {
                    form.handle_submit(event);
                }
            }),
        );
        self.listener.set(Some(id));
    }

    pub fn detach(&self) {
        if let Some(id) = self.listener.take() {
            self.dom.unlisten(id);
        }
    }

    pub fn handle_submit(&self, event: &Event<D::Node>) -> SubmitOutcome {
        event.prevent_default();

        let email = self.dom.value(&self.input).trim().to_string();
        if is_valid_email(&email) {
            self.show(MessageKind::Success);
            self.dom.set_value(&self.input, "");
            tracing::debug!("Newsletter signup accepted");
            SubmitOutcome::Subscribed(email)
        } else {
            self.show(MessageKind::Error);
            tracing::debug!("Newsletter signup rejected: invalid email");
            SubmitOutcome::Invalid
        }
    }

    /// Replace any current message with a new one of `kind`
    pub fn show(&self, kind: MessageKind) {
        self.dismiss();
        if let Err(e) = self.insert_message(kind) {
            tracing::warn!("Could not show newsletter message: {}", e);
        }
    }

    fn insert_message(&self, kind: MessageKind) -> Result<()> {
        let dom = &self.dom;
        let config = &self.config;
        let (text, class, role, live, delay) = match kind {
            MessageKind::Success => (
                &config.success_message,
                &config.success_class,
                "status",
                "polite",
                config.success_delay_ms,
            ),
            MessageKind::Error => (
                &config.error_message,
                &config.error_class,
                "alert",
                "assertive",
                config.error_delay_ms,
            ),
        };

        let generation = self.generation.get() + 1;
        self.generation.set(generation);

        let node = dom.create_element("div")?;
        dom.set_class_name(&node, class);
        dom.set_attribute(&node, "role", role);
        dom.set_attribute(&node, "aria-live", live);

        let label = dom.create_element("span")?;
        dom.set_text(&label, text);

        let close = dom.create_element("button")?;
        dom.set_attribute(&close, "type", "button");
        dom.set_attribute(&close, "class", "ml-3 font-bold");
        dom.set_attribute(&close, "aria-label", "Dismiss message");
        dom.set_text(&close, "×");

        let weak = self.weak_self.clone();
        let dismiss_listener = dom.listen(
            Target::Node(&close),
            EventKind::Click,
            ListenOptions::once(),
            Box::new(move |_| {
                if let Some(form) = weak.upgrade() {
                    form.dismiss_generation(generation);
                }
            }),
        );

        dom.append_children(&node, &[label, close]);
        dom.insert_after(&self.form, &node);

        let weak = self.weak_self.clone();
        dom.set_timeout(
            delay,
            Box::new(move || {
                if let Some(form) = weak.upgrade() {
                    form.dismiss_generation(generation);
                }
            }),
        );

        *self.message.borrow_mut() = Some(Message {
            node,
            kind,
            generation,
            dismiss_listener,
        });
        Ok(())
    }

    fn dismiss_generation(&self, generation: u64) {
        let current = self.message.borrow().as_ref().map(|m| m.generation);
        if current == Some(generation) {
            self.dismiss();
        }
    }

    /// Remove the current message, if any
    pub fn dismiss(&self) {
        if let Some(message) = self.message.borrow_mut().take() {
            self.dom.unlisten(message.dismiss_listener);
            self.dom.remove(&message.node);
        }
    }

    /// Currently shown message element and its kind
    pub fn message(&self) -> Option<(D::Node, MessageKind)> {
        self.message
            .borrow()
            .as_ref()
            .map(|m| (m.node.clone(), m.kind))
    }
}
