use std::collections::HashMap;

use payhook_ingress_common::VerifiedEvent;

/// Side effect for one event type. Handlers cannot fail; anything they do is best-effort.
pub type EventHandler = fn(&VerifiedEvent);

pub const PAYMENT_INTENT_SUCCEEDED: &str = "payment_intent.succeeded";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Handled,
    Unhandled,
}

/// Routes verified events by their type string, falling back to a default handler.
#[derive(Debug, Clone)]
pub struct EventDispatcher {
    handlers: HashMap<String, EventHandler>,
    fallback: EventHandler,
}

impl EventDispatcher {
    pub fn new(fallback: EventHandler) -> Self {
        Self {
            handlers: HashMap::new(),
            fallback,
        }
    }

    /// Dispatcher for the Stripe events this service acts on.
    pub fn stripe_defaults() -> Self {
        Self::new(log_unhandled).with_handler(PAYMENT_INTENT_SUCCEEDED, log_payment_succeeded)
    }

    /// Registers `handler` for `event_type`, replacing any previous one.
    pub fn with_handler(mut self, event_type: impl Into<String>, handler: EventHandler) -> Self {
        self.handlers.insert(event_type.into(), handler);
        self
    }

    pub fn handles(&self, event_type: &str) -> bool {
        self.handlers.contains_key(event_type)
    }

    pub fn dispatch(&self, event: &VerifiedEvent) -> DispatchOutcome {
        match self.handlers.get(event.event_type()) {
            Some(handler) => {
                handler(event);
                DispatchOutcome::Handled
            }
            None => {
                (self.fallback)(event);
                DispatchOutcome::Unhandled
            }
        }
    }
}

fn log_payment_succeeded(event: &VerifiedEvent) {
    tracing::info!(
        event_id = %event.id(),
        object = %event.object(),
        "PaymentIntent succeeded"
    );
}

fn log_unhandled(event: &VerifiedEvent) {
    tracing::info!(event_id = %event.id(), "Unhandled event type: {}", event.event_type());
}
