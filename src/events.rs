//! Lifecycle event dispatch.
//!
//! Firing an event on a trigger does, in order:
//! 1. notify listeners registered for the namespaced event (`show.layer`);
//! 2. unless the event is the catch-all itself, notify `all.layer`
//!    listeners with the namespaced name prepended to the arguments;
//! 3. call the settings' `on_all` handler;
//! 4. call the settings slot mapped from the event kind (`PostBody` ->
//!    `on_post_body`, `Named("item-added")` -> `named["onItemAdded"]`).
//!
//! Absent handlers are skipped silently.

use std::fmt;
use std::rc::Rc;

use serde_json::Value;

use crate::constants::{CATCH_ALL_EVENT, CUSTOM_EVENT, EVENT_NAMESPACE};
use crate::error::{LayerError, LayerResult};
use crate::settings::{SettingsStore, TriggerId};

/// Consumer callback.
pub type Handler = Rc<dyn Fn(&Emitted)>;

/// Lifecycle events with a dedicated settings slot, plus arbitrary names.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Show,
    Shown,
    Hide,
    Hidden,
    PostBody,
    Refresh,
    /// The reserved `custom-event` delivered by the named-layer entry point.
    Custom,
    Named(String),
}

impl EventKind {
    /// Bare (non-namespaced) event name.
    pub fn name(&self) -> &str {
        match self {
            EventKind::Show => "show",
            EventKind::Shown => "shown",
            EventKind::Hide => "hide",
            EventKind::Hidden => "hidden",
            EventKind::PostBody => "post-body",
            EventKind::Refresh => "refresh",
            EventKind::Custom => CUSTOM_EVENT,
            EventKind::Named(name) => name.as_str(),
        }
    }

    pub fn namespaced(&self) -> String {
        namespaced(self.name())
    }

    fn is_catch_all(&self) -> bool {
        self.name() == CATCH_ALL_EVENT
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn namespaced(name: &str) -> String {
    if name.ends_with(EVENT_NAMESPACE) {
        name.to_string()
    } else {
        format!("{name}{EVENT_NAMESPACE}")
    }
}

/// What a handler receives.
#[derive(Debug, Clone, PartialEq)]
pub struct Emitted {
    pub trigger: TriggerId,
    /// Namespaced event name, e.g. `post-body.layer`.
    pub event: String,
    pub args: Vec<Value>,
}

impl Emitted {
    pub fn new(trigger: TriggerId, event: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            trigger,
            event: event.into(),
            args,
        }
    }

    /// Split a `custom-event` payload into its event name and parameters.
    pub fn custom_parts(&self) -> Option<(&str, &[Value])> {
        let (first, rest) = self.args.split_first()?;
        Some((first.as_str()?, rest))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenerScope {
    Trigger(TriggerId),
    AnyTrigger,
}

impl ListenerScope {
    fn covers(self, trigger: TriggerId) -> bool {
        match self {
            ListenerScope::Trigger(id) => id == trigger,
            ListenerScope::AnyTrigger => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

struct Listener {
    id: ListenerId,
    scope: ListenerScope,
    event: String,
    handler: Handler,
}

#[derive(Default)]
pub struct Dispatcher {
    listeners: Vec<Listener>,
    next_id: u64,
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to `event` (bare or namespaced) within `scope`.
    pub fn on<F>(&mut self, scope: ListenerScope, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&Emitted) + 'static,
    {
        self.next_id = self.next_id.saturating_add(1);
        let id = ListenerId(self.next_id);
        self.listeners.push(Listener {
            id,
            scope,
            event: namespaced(event),
            handler: Rc::new(handler),
        });
        id
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Drop every listener scoped to `trigger`.
    pub fn forget_trigger(&mut self, trigger: TriggerId) {
        self.listeners
            .retain(|l| l.scope != ListenerScope::Trigger(trigger));
    }

    fn emit(&self, trigger: TriggerId, event: &str, args: &[Value]) {
        // Snapshot first so listeners cannot observe a half-updated list.
        let targets: Vec<Handler> = self
            .listeners
            .iter()
            .filter(|l| l.event == event && l.scope.covers(trigger))
            .map(|l| Rc::clone(&l.handler))
            .collect();
        if targets.is_empty() {
            return;
        }
        let emitted = Emitted::new(trigger, event, args.to_vec());
        for handler in targets {
            handler(&emitted);
        }
    }

    /// Fire `kind` on `trigger`. Fails with `NotFound` when the trigger has
    /// no settings bound.
    pub fn fire(
        &self,
        store: &SettingsStore,
        trigger: TriggerId,
        kind: &EventKind,
        args: Vec<Value>,
    ) -> LayerResult<()> {
        let Some(settings) = store.get(trigger) else {
            return Err(LayerError::NotFound(format!(
                "{trigger} is not initialized (event {kind})"
            )));
        };
        // Clone the handlers out so callbacks never run while settings are
        // borrowed from the store.
        let callbacks = settings.callbacks.clone();
        let event = kind.namespaced();
        tracing::debug!(%trigger, event = %event, args = args.len(), "fire");
        self.emit(trigger, &event, &args);

        if kind.is_catch_all() {
            return Ok(());
        }

        let mut all_args = Vec::with_capacity(args.len() + 1);
        all_args.push(Value::String(event.clone()));
        all_args.extend(args.iter().cloned());
        self.emit(trigger, &namespaced(CATCH_ALL_EVENT), &all_args);

        if let Some(on_all) = &callbacks.on_all {
            on_all(&Emitted::new(trigger, event.clone(), args.clone()));
        }
        if let Some(handler) = callbacks.slot(kind) {
            handler(&Emitted::new(trigger, event, args));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{LayerOptions, LayerSettings};
    use serde_json::json;
    use std::cell::RefCell;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, impl Fn(&str) -> Handler) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = Rc::clone(&log);
        let make = move |tag: &str| -> Handler {
            let l = Rc::clone(&l);
            let tag = tag.to_string();
            Rc::new(move |e: &Emitted| l.borrow_mut().push(format!("{tag}:{}", e.event)))
        };
        (log, make)
    }

    #[test]
    fn fire_orders_listener_all_and_slot() {
        let (log, make) = recorder();
        let mut store = SettingsStore::new();
        let mut settings = LayerSettings::defaults();
        settings.callbacks.on_all = Some(make("onAll"));
        settings.callbacks.on_post_body = Some(make("onPostBody"));
        let trigger = store.register(settings);

        let mut dispatcher = Dispatcher::new();
        let h = make("listener");
        dispatcher.on(ListenerScope::Trigger(trigger), "post-body", move |e| h(e));
        let h = make("all-listener");
        dispatcher.on(ListenerScope::AnyTrigger, "all", move |e| h(e));

        dispatcher
            .fire(&store, trigger, &EventKind::PostBody, vec![json!("<p>")])
            .unwrap();
        assert_eq!(
            *log.borrow(),
            vec![
                "listener:post-body.layer",
                "all-listener:all.layer",
                "onAll:post-body.layer",
                "onPostBody:post-body.layer",
            ]
        );
    }

    #[test]
    fn catch_all_event_is_not_mirrored() {
        let (log, make) = recorder();
        let mut store = SettingsStore::new();
        let mut settings = LayerSettings::defaults();
        settings.callbacks.on_all = Some(make("onAll"));
        let trigger = store.register(settings);
        let mut dispatcher = Dispatcher::new();
        let h = make("all-listener");
        dispatcher.on(ListenerScope::Trigger(trigger), "all.layer", move |e| h(e));

        dispatcher
            .fire(&store, trigger, &EventKind::Named("all".into()), Vec::new())
            .unwrap();
        assert_eq!(*log.borrow(), vec!["all-listener:all.layer"]);
    }

    #[test]
    fn uninitialized_trigger_is_not_found() {
        let store = SettingsStore::new();
        let dispatcher = Dispatcher::new();
        let err = dispatcher
            .fire(&store, TriggerId(99), &EventKind::Show, Vec::new())
            .unwrap_err();
        assert!(matches!(err, LayerError::NotFound(_)));
    }

    #[test]
    fn scoped_listeners_ignore_other_triggers_and_off_works() {
        let (log, make) = recorder();
        let mut store = SettingsStore::new();
        let a = store.register(LayerSettings::defaults());
        let b = store.register(LayerSettings::defaults());
        let mut dispatcher = Dispatcher::new();
        let h = make("a");
        let id = dispatcher.on(ListenerScope::Trigger(a), "show", move |e| h(e));

        dispatcher.fire(&store, b, &EventKind::Show, Vec::new()).unwrap();
        assert!(log.borrow().is_empty());
        dispatcher.fire(&store, a, &EventKind::Show, Vec::new()).unwrap();
        assert_eq!(log.borrow().len(), 1);

        assert!(dispatcher.off(id));
        dispatcher.fire(&store, a, &EventKind::Show, Vec::new()).unwrap();
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn named_events_reach_named_handlers() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let mut store = SettingsStore::new();
        let settings = LayerSettings::merged(
            &LayerOptions::new().on(EventKind::Named("item-added".into()), move |e| {
                s.borrow_mut().push(e.args.clone())
            }),
            &LayerOptions::new(),
        );
        let trigger = store.register(settings);
        Dispatcher::new()
            .fire(
                &store,
                trigger,
                &EventKind::Named("item-added".into()),
                vec![json!(3)],
            )
            .unwrap();
        assert_eq!(*seen.borrow(), vec![vec![json!(3)]]);
    }

    #[test]
    fn custom_parts_splits_name_and_params() {
        let e = Emitted::new(
            TriggerId(1),
            "custom-event.layer",
            vec![json!("itemAdded"), json!(3)],
        );
        let (name, params) = e.custom_parts().unwrap();
        assert_eq!(name, "itemAdded");
        assert_eq!(params, &[json!(3)]);
    }
}
