use std::fmt;

/// The four session lifecycle notifications, declared in emission order:
/// when one mutation flips several aggregate flags at once, observers see
/// them in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    ErrorWhileInstalling,
    CanContinue,
    DoneInstalling,
    AllSuccess,
}

impl LifecycleEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ErrorWhileInstalling => "error-while-installing",
            Self::CanContinue => "can-continue",
            Self::DoneInstalling => "done-installing",
            Self::AllSuccess => "all-success",
        }
    }
}

type Observer = Box<dyn FnMut(LifecycleEvent) + Send>;

/// Explicit publish/subscribe point for lifecycle notifications. Observers
/// register for all events or for a single kind and never see each other;
/// within one event, dispatch follows registration order. Observer calls are
/// infallible: a subscriber that stopped caring simply ignores the call.
#[derive(Default)]
pub struct EventBus {
    observers: Vec<(Option<LifecycleEvent>, Observer)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, observer: impl FnMut(LifecycleEvent) + Send + 'static) {
        self.observers.push((None, Box::new(observer)));
    }

    pub fn subscribe_to(
        &mut self,
        event: LifecycleEvent,
        observer: impl FnMut(LifecycleEvent) + Send + 'static,
    ) {
        self.observers.push((Some(event), Box::new(observer)));
    }

    pub fn publish(&mut self, event: LifecycleEvent) {
        for (filter, observer) in &mut self.observers {
            if filter.map_or(true, |kind| kind == event) {
                observer(event);
            }
        }
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("observers", &self.observers.len())
            .finish()
    }
}
