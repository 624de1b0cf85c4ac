use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use serde_json::Value;

use crate::animation::{CloseQueue, Timeline, Timer};
use crate::backdrop::Backdrop;
use crate::config::{ConfigPatch, GlobalConfig};
use crate::constants::{PLACEHOLDER_NAME_PREFIX, RESIZE_DEBOUNCE};
use crate::content::{
    ContentLoader, ContentReply, ContentResponse, ContentSource, ContentTicket, FetchRequest,
    StaticLoader,
};
use crate::error::{LayerError, LayerResult};
use crate::events::{Dispatcher, Emitted, EventKind, ListenerId, ListenerScope};
use crate::layout::{
    self, Predecessor, Viewport, WidthSpec, cascade_widths, full_width_mode, layer_width,
    transition_duration,
};
use crate::naming::layer_key;
use crate::settings::{BackdropMode, LayerOptions, LayerSettings, SettingsStore, TriggerId};
use crate::state::StackState;

use super::{
    Body, Chrome, CloseCause, Layer, LayerId, LayerInput, LayerState, SlideDirection, Transition,
};

/// Coordinator for one stack of slide-in layers.
///
/// All work happens on the caller's thread. Time only moves when the host
/// calls [`LayerStack::advance`]; transition completions, debounced
/// relayouts and content deliveries are processed there.
pub struct LayerStack {
    config: GlobalConfig,
    viewport: Viewport,
    state: StackState,
    settings: SettingsStore,
    dispatcher: Dispatcher,
    timeline: Timeline,
    close_queue: CloseQueue,
    loader: Box<dyn ContentLoader>,
    content_tx: Sender<ContentResponse>,
    content_rx: Receiver<ContentResponse>,
    next_ticket: u64,
    opened: u64,
    resize_generation: u64,
}

impl std::fmt::Debug for LayerStack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LayerStack")
            .field("viewport", &self.viewport)
            .field("order", &self.state.order())
            .field("animating", &self.state.lock.is_held())
            .field("now", &self.timeline.now())
            .finish()
    }
}

impl LayerStack {
    pub fn new(config: GlobalConfig, viewport: Viewport) -> Self {
        let (content_tx, content_rx) = mpsc::channel();
        Self {
            config,
            viewport,
            state: StackState::new(),
            settings: SettingsStore::new(),
            dispatcher: Dispatcher::new(),
            timeline: Timeline::new(),
            close_queue: CloseQueue::new(),
            loader: Box::new(StaticLoader::new()),
            content_tx,
            content_rx,
            next_ticket: 0,
            opened: 0,
            resize_generation: 0,
        }
    }

    /// Use `loader` for URL content sources.
    pub fn with_loader<L: ContentLoader + 'static>(mut self, loader: L) -> Self {
        self.loader = Box::new(loader);
        self
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// Merge `patch` into the global config and lay out open layers again.
    pub fn set_config(&mut self, patch: &ConfigPatch) {
        self.config.merge(patch);
        self.relayout();
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn now(&self) -> Duration {
        self.timeline.now()
    }

    pub fn state(&self) -> &StackState {
        &self.state
    }

    /// Open layers, bottom to top.
    pub fn layers(&self) -> impl Iterator<Item = &Layer> + '_ {
        self.state.iter()
    }

    pub fn len(&self) -> usize {
        self.state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.is_empty()
    }

    pub fn layer(&self, id: LayerId) -> Option<&Layer> {
        self.state.get(id)
    }

    /// The layer currently opened by `trigger`, if any.
    pub fn layer_for(&self, trigger: TriggerId) -> Option<&Layer> {
        self.state.get(LayerId::from(trigger))
    }

    pub fn top(&self) -> Option<&Layer> {
        self.state.top()
    }

    pub fn backdrop(&self) -> Option<Backdrop> {
        self.state.backdrop.backdrop()
    }

    pub fn scroll_locked(&self) -> bool {
        self.state.backdrop.scroll_locked()
    }

    /// Whether an open or close transition is running.
    pub fn is_animating(&self) -> bool {
        self.state.lock.is_held()
    }

    pub fn full_width_mode(&self) -> bool {
        full_width_mode(&self.config, self.viewport)
    }

    pub fn settings(&self, trigger: TriggerId) -> Option<&LayerSettings> {
        self.settings.get(trigger)
    }

    pub fn slide_offset(&self, id: LayerId) -> Option<u32> {
        self.state.get(id).map(|l| l.slide_offset(self.timeline.now()))
    }

    pub fn chrome(&self, id: LayerId) -> Option<Chrome> {
        let full_width = self.full_width_mode();
        self.state.get(id).map(|l| l.chrome(&self.config, full_width))
    }

    /// Bind settings to a new trigger: defaults, then `attributes`, then
    /// `options`.
    pub fn init_trigger(&mut self, attributes: &LayerOptions, options: &LayerOptions) -> TriggerId {
        let settings = LayerSettings::merged(attributes, options);
        let trigger = self.settings.register(settings);
        tracing::debug!(%trigger, "trigger initialized");
        trigger
    }

    /// Drop `trigger`'s settings and every listener scoped to it. Refused
    /// while its layer is on the stack.
    pub fn destroy_trigger(&mut self, trigger: TriggerId) -> LayerResult<()> {
        if let Some(layer) = self.state.get(LayerId::from(trigger)) {
            return Err(LayerError::State(format!("{} is still on the stack", layer.id)));
        }
        if self.settings.remove(trigger).is_none() {
            return Err(LayerError::NotFound(format!("{trigger} is not initialized")));
        }
        self.dispatcher.forget_trigger(trigger);
        tracing::debug!(%trigger, "trigger destroyed");
        Ok(())
    }

    /// Subscribe to a namespaced lifecycle event.
    pub fn on<F>(&mut self, scope: ListenerScope, event: &str, handler: F) -> ListenerId
    where
        F: Fn(&Emitted) + 'static,
    {
        self.dispatcher.on(scope, event, handler)
    }

    pub fn off(&mut self, id: ListenerId) -> bool {
        self.dispatcher.off(id)
    }

    /// Fire an arbitrary event on `trigger`.
    pub fn fire(&self, trigger: TriggerId, kind: &EventKind, args: Vec<Value>) -> LayerResult<()> {
        self.dispatcher.fire(&self.settings, trigger, kind, args)
    }

    fn fire_logged(&self, trigger: TriggerId, kind: EventKind, args: Vec<Value>) {
        if let Err(err) = self.fire(trigger, &kind, args) {
            tracing::error!(%trigger, event = %kind, %err, "event dispatch failed");
        }
    }

    fn resolve_name(&self, settings: &LayerSettings) -> String {
        match settings.name.as_deref().map(layer_key) {
            Some(name) if !name.is_empty() => name,
            _ => format!("{PLACEHOLDER_NAME_PREFIX}{}", self.opened + 1),
        }
    }

    /// Open the layer for `trigger`.
    ///
    /// Returns `Ok(None)` without touching the stack when another transition
    /// is running.
    pub fn open(&mut self, trigger: TriggerId) -> LayerResult<Option<LayerId>> {
        let Some(settings) = self.settings.get(trigger).cloned() else {
            return Err(LayerError::NotFound(format!("{trigger} is not initialized")));
        };
        let id = LayerId::from(trigger);
        if !self.state.lock.try_acquire(id) {
            tracing::debug!(
                %trigger,
                holder = ?self.state.lock.holder(),
                "transition in progress, open dropped"
            );
            return Ok(None);
        }
        if let Some(existing) = self.state.get(id) {
            let name = existing.name.clone();
            self.state.lock.release();
            return Err(LayerError::DuplicateName(name));
        }
        let name = self.resolve_name(&settings);
        if self.state.find_by_name(&name).is_some() {
            self.state.lock.release();
            return Err(LayerError::DuplicateName(name));
        }

        self.fire_logged(trigger, EventKind::Show, Vec::new());

        let below = match self.state.top() {
            None => Predecessor::None,
            Some(layer) => Predecessor::from_rendered(layer.width),
        };
        let spec = WidthSpec {
            override_width: settings.width,
            expanded: false,
        };
        let width = layer_width(&self.config, self.viewport, spec, below);
        // Never hand out a z-index at or below a layer that is still open.
        let z_index = layout::z_index_for(&self.config, self.state.len()).max(
            self.state
                .top()
                .map_or(i32::MIN, |l| l.z_index.saturating_add(1)),
        );
        let duration = transition_duration(&self.config, width, self.viewport);

        let layer = Layer {
            id,
            trigger,
            name: name.clone(),
            title: settings.title.clone(),
            settings,
            width,
            z_index,
            expanded: false,
            covered: false,
            state: LayerState::Opening,
            body: Body::Loading,
            ticket: None,
            refreshing: false,
            transition: Some(Transition {
                direction: SlideDirection::In,
                started: self.timeline.now(),
                duration,
            }),
        };
        self.state.push(layer);
        self.opened = self.opened.saturating_add(1);
        self.state.sync_covered(None);
        self.state.reconcile_backdrop(None);
        tracing::debug!(layer = %id, %name, width, z_index, ?duration, "opening");

        if let Err(err) = self.begin_load(id) {
            tracing::error!(layer = %id, %err, "content not loaded");
        }
        self.timeline.schedule(duration, Timer::OpenComplete(id));
        Ok(Some(id))
    }

    /// Apply `options` (minus any name) to the trigger, then open it.
    pub fn show(&mut self, trigger: TriggerId, options: &LayerOptions) -> LayerResult<Option<LayerId>> {
        let Some(settings) = self.settings.get_mut(trigger) else {
            return Err(LayerError::NotFound(format!("{trigger} is not initialized")));
        };
        options.without_name().apply_to(settings);
        self.open(trigger)
    }

    /// Merge `options` (minus any name) into the trigger's settings and
    /// reload the open layer's content. Fires `post-body` then `refresh`
    /// once the new content arrives.
    pub fn refresh(&mut self, trigger: TriggerId, options: &LayerOptions) -> LayerResult<()> {
        if !self.settings.contains(trigger) {
            return Err(LayerError::NotFound(format!("{trigger} is not initialized")));
        }
        let id = LayerId::from(trigger);
        match self.state.get(id).map(|l| l.state) {
            None => {
                return Err(LayerError::NotFound(format!("{trigger} has no open layer")));
            }
            Some(LayerState::Closing) => {
                return Err(LayerError::State(format!("{id} is closing")));
            }
            Some(_) => {}
        }
        let Some(current) = self.settings.get(trigger) else {
            return Err(LayerError::NotFound(format!("{trigger} is not initialized")));
        };
        let mut settings = current.clone();
        options.without_name().apply_to(&mut settings);
        self.settings.set(trigger, settings.clone());
        if let Some(layer) = self.state.get_mut(id) {
            layer.title = settings.title.clone();
            layer.settings = settings;
            layer.refreshing = true;
        }
        tracing::debug!(layer = %id, "refresh");
        self.begin_load(id)
    }

    pub fn set_title(&mut self, trigger: TriggerId, title: impl Into<String>) -> LayerResult<()> {
        let title = title.into();
        let Some(settings) = self.settings.get_mut(trigger) else {
            return Err(LayerError::NotFound(format!("{trigger} is not initialized")));
        };
        settings.title = Some(title.clone());
        if let Some(layer) = self.state.get_mut(LayerId::from(trigger)) {
            layer.settings.title = Some(title.clone());
            layer.title = Some(title);
        }
        Ok(())
    }

    /// Close the layer opened by `trigger`.
    pub fn close(&mut self, trigger: TriggerId) -> LayerResult<bool> {
        if !self.settings.contains(trigger) {
            return Err(LayerError::NotFound(format!("{trigger} is not initialized")));
        }
        self.close_layer(LayerId::from(trigger), CloseCause::Api)
    }

    /// Start closing `id`. Returns `Ok(false)` when the request is dropped:
    /// another transition is running, the layer is already leaving, or an
    /// Escape hits a static backdrop.
    pub fn close_layer(&mut self, id: LayerId, cause: CloseCause) -> LayerResult<bool> {
        let Some(layer) = self.state.get(id) else {
            return Err(LayerError::NotFound(format!("{id} is not open")));
        };
        if layer.state == LayerState::Closing {
            return Ok(false);
        }
        let trigger = layer.trigger;
        let width = layer.width;
        let static_backdrop = layer.settings.backdrop == BackdropMode::Static;
        match cause {
            CloseCause::BackdropClick if static_backdrop => {
                tracing::warn!(layer = %id, "static backdrop, dismiss refused");
                return Err(LayerError::State(format!(
                    "{id} has a static backdrop and cannot be dismissed"
                )));
            }
            CloseCause::Escape if static_backdrop => {
                tracing::debug!(layer = %id, "static backdrop, escape ignored");
                return Ok(false);
            }
            CloseCause::CloseControl if !layer.settings.closeable => {
                return Err(LayerError::State(format!("{id} is not closeable")));
            }
            _ => {}
        }
        if !self.state.lock.try_acquire(id) {
            tracing::debug!(
                layer = %id,
                holder = ?self.state.lock.holder(),
                "transition in progress, close dropped"
            );
            return Ok(false);
        }

        let duration = transition_duration(&self.config, width, self.viewport);
        let now = self.timeline.now();
        if let Some(layer) = self.state.get_mut(id) {
            layer.state = LayerState::Closing;
            layer.transition = Some(Transition {
                direction: SlideDirection::Out,
                started: now,
                duration,
            });
        }
        self.state.reconcile_backdrop(Some(id));
        self.state.sync_covered(Some(id));
        tracing::debug!(layer = %id, ?cause, ?duration, "closing");
        self.fire_logged(trigger, EventKind::Hide, Vec::new());
        self.timeline.schedule(duration, Timer::CloseComplete(id));
        Ok(true)
    }

    /// Close every open layer, top first, one transition at a time. Dropped
    /// while a transition is running. Returns how many layers were queued.
    pub fn close_all(&mut self) -> usize {
        if self.state.lock.is_held() {
            tracing::debug!(
                holder = ?self.state.lock.holder(),
                "transition in progress, close all dropped"
            );
            return 0;
        }
        let pending: Vec<LayerId> = self
            .state
            .iter()
            .rev()
            .filter(|l| l.state != LayerState::Closing)
            .map(|l| l.id)
            .collect();
        let queued = pending.len();
        self.close_queue.fill(pending);
        tracing::debug!(queued, "close all");
        self.drain_close_queue();
        queued
    }

    fn drain_close_queue(&mut self) {
        while let Some(id) = self.close_queue.pop() {
            if !self.state.contains(id) {
                continue;
            }
            match self.close_layer(id, CloseCause::CloseAll) {
                Ok(true) => return,
                Ok(false) => {}
                Err(err) => tracing::error!(layer = %id, %err, "close all skipped layer"),
            }
        }
    }

    /// Toggle full-width expansion of the topmost layer and lay out every
    /// layer again. Returns the new expanded flag.
    pub fn toggle_expand(&mut self) -> LayerResult<bool> {
        let Some(top) = self.state.active_top() else {
            return Err(LayerError::NotFound("no open layer to expand".to_string()));
        };
        if !top.settings.expandable {
            return Err(LayerError::State(format!("{} is not expandable", top.id)));
        }
        let id = top.id;
        let expanded = !top.expanded;
        if let Some(layer) = self.state.get_mut(id) {
            layer.expanded = expanded;
        }
        self.relayout();
        tracing::debug!(layer = %id, expanded, "expand toggled");
        Ok(expanded)
    }

    /// Record a new viewport size. Widths are recomputed once the size has
    /// been stable for the debounce window.
    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.resize_generation = self.resize_generation.wrapping_add(1);
        self.timeline
            .schedule(RESIZE_DEBOUNCE, Timer::ResizeSettle(self.resize_generation));
    }

    fn relayout(&mut self) {
        let specs: Vec<WidthSpec> = self
            .state
            .iter()
            .map(|l| WidthSpec {
                override_width: l.settings.width,
                expanded: l.expanded,
            })
            .collect();
        let widths = cascade_widths(&self.config, self.viewport, &specs);
        let order = self.state.order().to_vec();
        for (id, width) in order.into_iter().zip(widths) {
            if let Some(layer) = self.state.get_mut(id) {
                layer.width = width;
            }
        }
    }

    /// Find an open layer by its resolved name. The lookup name is
    /// normalized the same way configured names are.
    pub fn get_layer_by_name(&self, name: &str) -> Option<&Layer> {
        self.state.find_by_name(&layer_key(name))
    }

    /// Deliver `custom-event` with `(event, ...params)` to the trigger that
    /// owns the layer called `name`.
    pub fn custom_event(&self, name: &str, event: &str, params: Vec<Value>) -> LayerResult<()> {
        let Some(layer) = self.get_layer_by_name(name) else {
            return Err(LayerError::NotFound(format!("no open layer named \"{name}\"")));
        };
        let mut args = Vec::with_capacity(params.len() + 1);
        args.push(Value::String(event.to_string()));
        args.extend(params);
        self.fire(layer.trigger, &EventKind::Custom, args)
    }

    fn begin_load(&mut self, id: LayerId) -> LayerResult<()> {
        let Some(layer) = self.state.get_mut(id) else {
            return Err(LayerError::NotFound(format!("{id} is not open")));
        };
        let Some(source) = layer.settings.source.clone() else {
            layer.body = Body::Failed("no content source configured".to_string());
            layer.ticket = None;
            layer.refreshing = false;
            return Err(LayerError::Configuration(format!(
                "{id} has no content source"
            )));
        };
        self.next_ticket = self.next_ticket.saturating_add(1);
        let ticket = ContentTicket(self.next_ticket);
        layer.body = Body::Loading;
        layer.ticket = Some(ticket);
        let query = layer.settings.query();
        let reply = ContentReply::new(ticket, self.content_tx.clone());
        match source {
            ContentSource::Url(url) => {
                let ajax = layer.settings.resolved_ajax(&self.config);
                let request = FetchRequest {
                    url,
                    method: ajax.method,
                    content_type: ajax.content_type,
                    query,
                };
                tracing::debug!(layer = %id, url = %request.url, "fetching content");
                self.loader.fetch(request, reply);
            }
            ContentSource::Function(produce) => produce(&query, reply),
        }
        Ok(())
    }

    /// Apply every content response that has arrived so far.
    pub fn pump_content(&mut self) {
        while let Ok(response) = self.content_rx.try_recv() {
            self.apply_content(response);
        }
    }

    fn apply_content(&mut self, response: ContentResponse) {
        let target = self
            .state
            .iter()
            .find(|l| l.ticket == Some(response.ticket))
            .map(|l| (l.id, l.state));
        let Some((id, state)) = target else {
            tracing::debug!(ticket = ?response.ticket, "stale content ignored");
            return;
        };
        if !state.accepts_content() {
            tracing::debug!(layer = %id, "layer closing, content ignored");
            return;
        }
        let Some(layer) = self.state.get_mut(id) else {
            return;
        };
        layer.ticket = None;
        let refreshed = std::mem::take(&mut layer.refreshing);
        let trigger = layer.trigger;
        match response.result {
            Ok(content) => {
                layer.body = Body::Loaded(content.clone());
                self.fire_logged(trigger, EventKind::PostBody, vec![Value::String(content)]);
                if refreshed {
                    self.fire_logged(trigger, EventKind::Refresh, Vec::new());
                }
            }
            Err(err) => {
                layer.body = Body::Failed(err.to_string());
                let err = LayerError::from(err);
                tracing::error!(layer = %id, %err, "content failed");
            }
        }
    }

    fn on_timer(&mut self, timer: Timer) {
        match timer {
            Timer::OpenComplete(id) => {
                let Some(layer) = self.state.get_mut(id) else {
                    self.state.lock.release();
                    return;
                };
                layer.state = LayerState::Open;
                layer.transition = None;
                let trigger = layer.trigger;
                self.state.lock.release();
                tracing::debug!(layer = %id, "open");
                self.fire_logged(trigger, EventKind::Shown, Vec::new());
            }
            Timer::CloseComplete(id) => {
                let removed = self.state.remove(id);
                self.state.reconcile_backdrop(None);
                self.state.sync_covered(None);
                self.state.lock.release();
                if let Some(layer) = removed {
                    tracing::debug!(
                        layer = %id,
                        name = %layer.name,
                        transitions = self.state.lock.acquisitions(),
                        "removed"
                    );
                    self.fire_logged(layer.trigger, EventKind::Hidden, Vec::new());
                }
                self.drain_close_queue();
            }
            Timer::ResizeSettle(generation) => {
                if generation == self.resize_generation {
                    self.relayout();
                    tracing::debug!(viewport = ?self.viewport, "relayout after resize");
                }
            }
        }
    }

    /// Move virtual time forward by `dt`, firing due timers in order and
    /// applying content responses between them.
    pub fn advance(&mut self, dt: Duration) {
        let target = self.timeline.now().saturating_add(dt);
        self.pump_content();
        while let Some(timer) = self.timeline.pop_due(target) {
            self.on_timer(timer);
            self.pump_content();
        }
        self.timeline.settle_at(target);
    }

    /// Advance until no timer is pending. Returns the time that passed.
    pub fn run_until_idle(&mut self) -> Duration {
        let start = self.timeline.now();
        self.pump_content();
        while let Some(at) = self.timeline.next_deadline() {
            let dt = at.saturating_sub(self.timeline.now());
            self.advance(dt);
        }
        self.timeline.now().saturating_sub(start)
    }

    /// Route one input. Failures are logged, never propagated; the return
    /// value says whether the input changed anything.
    pub fn handle_input(&mut self, input: LayerInput) -> bool {
        let result = match input {
            LayerInput::Activate(trigger) => self.open(trigger).map(|id| id.is_some()),
            LayerInput::CloseControl(id) => self.close_layer(id, CloseCause::CloseControl),
            LayerInput::RefreshControl(id) => self.refresh_control(id),
            LayerInput::ExpandControl(id) => self.expand_control(id),
            LayerInput::BackdropClick => match self.state.active_top().map(|l| l.id) {
                Some(id) => self.close_layer(id, CloseCause::BackdropClick),
                None => Ok(false),
            },
            LayerInput::Escape => match self.state.active_top().map(|l| l.id) {
                Some(id) => self.close_layer(id, CloseCause::Escape),
                None => Ok(false),
            },
            LayerInput::Resize(viewport) => {
                self.resize(viewport);
                Ok(true)
            }
        };
        match result {
            Ok(changed) => changed,
            Err(err) => {
                tracing::error!(?input, %err, "input aborted");
                false
            }
        }
    }

    fn refresh_control(&mut self, id: LayerId) -> LayerResult<bool> {
        let Some(layer) = self.state.get(id) else {
            return Err(LayerError::NotFound(format!("{id} is not open")));
        };
        if !layer.settings.refreshable {
            return Err(LayerError::State(format!("{id} is not refreshable")));
        }
        let trigger = layer.trigger;
        self.refresh(trigger, &LayerOptions::new())?;
        Ok(true)
    }

    fn expand_control(&mut self, id: LayerId) -> LayerResult<bool> {
        if self.state.active_top().map(|l| l.id) != Some(id) {
            return Err(LayerError::State(format!("{id} is not the top layer")));
        }
        self.toggle_expand()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn stack() -> LayerStack {
        LayerStack::new(GlobalConfig::default(), Viewport::new(1200, 800))
    }

    fn page(text: &'static str) -> LayerOptions {
        LayerOptions::new().source(ContentSource::function(move |_| Ok(text.to_string())))
    }

    #[test]
    fn open_assigns_placeholder_name_and_settles() {
        let mut s = stack();
        let t = s.init_trigger(&page("hello"), &LayerOptions::new());
        let id = s.open(t).unwrap().unwrap();
        assert!(s.is_animating());
        assert_eq!(s.layer(id).unwrap().state(), LayerState::Opening);
        assert_eq!(s.slide_offset(id), Some(960));

        s.run_until_idle();
        let layer = s.layer(id).unwrap();
        assert_eq!(layer.name(), "layer1");
        assert_eq!(layer.state(), LayerState::Open);
        assert_eq!(layer.body(), &Body::Loaded("hello".into()));
        assert_eq!(s.slide_offset(id), Some(0));
        assert!(!s.is_animating());
        assert_eq!(s.now(), Duration::from_millis(480));
    }

    #[test]
    fn open_without_source_still_opens_with_failed_body() {
        let mut s = stack();
        let t = s.init_trigger(&LayerOptions::new(), &LayerOptions::new());
        let id = s.open(t).unwrap().unwrap();
        s.run_until_idle();
        let layer = s.layer(id).unwrap();
        assert_eq!(layer.state(), LayerState::Open);
        assert!(matches!(layer.body(), Body::Failed(_)));
    }

    #[test]
    fn same_trigger_twice_is_duplicate() {
        let mut s = stack();
        let t = s.init_trigger(&page("x").name("cart"), &LayerOptions::new());
        s.open(t).unwrap();
        s.run_until_idle();
        assert_eq!(
            s.open(t).unwrap_err(),
            LayerError::DuplicateName("cart".into())
        );
        assert!(!s.is_animating());
    }

    #[test]
    fn refresh_fires_post_body_then_refresh() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut s = stack();
        let t = s.init_trigger(&page("v1").refreshable(true), &LayerOptions::new());
        let log = Rc::clone(&seen);
        s.on(ListenerScope::Trigger(t), "all", move |e| {
            log.borrow_mut().push(e.args[0].as_str().unwrap_or_default().to_string())
        });
        s.open(t).unwrap();
        s.run_until_idle();
        seen.borrow_mut().clear();

        s.refresh(t, &page("v2").name("renamed")).unwrap();
        s.advance(Duration::ZERO);
        assert_eq!(*seen.borrow(), vec!["post-body.layer", "refresh.layer"]);
        let layer = s.layer_for(t).unwrap();
        assert_eq!(layer.body(), &Body::Loaded("v2".into()));
        assert_eq!(layer.name(), "layer1");
        assert!(s.settings(t).unwrap().name.is_none());
    }

    #[test]
    fn close_all_runs_one_transition_at_a_time() {
        let mut s = stack();
        for text in ["a", "b", "c"] {
            let t = s.init_trigger(&page(text), &LayerOptions::new());
            s.open(t).unwrap();
            s.run_until_idle();
        }
        assert_eq!(s.state.lock.acquisitions(), 3);

        assert_eq!(s.close_all(), 3);
        while !s.is_empty() {
            let closing = s.layers().filter(|l| l.state() == LayerState::Closing).count();
            assert_eq!(closing, 1);
            assert_eq!(
                s.state.lock.holder(),
                s.layers().find(|l| l.state() == LayerState::Closing).map(|l| l.id())
            );
            s.advance(Duration::from_millis(10));
        }
        assert_eq!(s.state.lock.acquisitions(), 6);
        assert!(!s.is_animating());
    }

    #[test]
    fn z_index_keeps_climbing_after_bottom_layers_close() {
        let mut s = stack();
        let triggers: Vec<TriggerId> = (0..3)
            .map(|_| s.init_trigger(&page("x"), &LayerOptions::new()))
            .collect();
        for t in &triggers[..2] {
            s.open(*t).unwrap();
            s.run_until_idle();
        }
        s.close(triggers[0]).unwrap();
        s.run_until_idle();
        s.open(triggers[2]).unwrap();
        s.run_until_idle();
        s.close(triggers[1]).unwrap();
        s.run_until_idle();
        s.open(triggers[0]).unwrap();
        s.run_until_idle();

        let z: Vec<i32> = s.layers().map(|l| l.z_index()).collect();
        assert_eq!(z, vec![1052, 1053]);
    }

    #[test]
    fn destroy_trigger_forgets_settings_and_scoped_listeners() {
        let mut s = stack();
        let t = s.init_trigger(&page("x"), &LayerOptions::new());
        let scoped = s.on(ListenerScope::Trigger(t), "shown", |_| {});
        let global = s.on(ListenerScope::AnyTrigger, "shown", |_| {});
        s.open(t).unwrap();
        assert!(matches!(s.destroy_trigger(t), Err(LayerError::State(_))));

        s.run_until_idle();
        s.close(t).unwrap();
        s.run_until_idle();
        s.destroy_trigger(t).unwrap();
        assert!(s.settings(t).is_none());
        assert!(!s.off(scoped));
        assert!(s.off(global));
        assert!(matches!(s.open(t), Err(LayerError::NotFound(_))));
        assert!(matches!(s.destroy_trigger(t), Err(LayerError::NotFound(_))));
    }

    #[test]
    fn refresh_without_open_layer_is_not_found() {
        let mut s = stack();
        let t = s.init_trigger(&page("x"), &LayerOptions::new());
        assert!(matches!(
            s.refresh(t, &LayerOptions::new()),
            Err(LayerError::NotFound(_))
        ));
    }

    #[test]
    fn set_title_updates_open_layer() {
        let mut s = stack();
        let t = s.init_trigger(&page("x").title("Old"), &LayerOptions::new());
        s.open(t).unwrap();
        s.set_title(t, "New").unwrap();
        assert_eq!(s.layer_for(t).unwrap().title(), Some("New"));
        assert_eq!(s.settings(t).unwrap().title.as_deref(), Some("New"));
    }

    #[test]
    fn static_backdrop_ignores_escape_but_closes_via_control() {
        let mut s = stack();
        let t = s.init_trigger(
            &page("x").backdrop(BackdropMode::Static),
            &LayerOptions::new(),
        );
        let id = s.open(t).unwrap().unwrap();
        s.run_until_idle();
        assert!(!s.handle_input(LayerInput::Escape));
        assert!(!s.handle_input(LayerInput::BackdropClick));
        assert_eq!(s.len(), 1);
        assert!(s.handle_input(LayerInput::CloseControl(id)));
        s.run_until_idle();
        assert!(s.is_empty());
    }

    #[test]
    fn toggle_expand_widens_top_and_flips_icon() {
        let mut s = stack();
        let t = s.init_trigger(&page("x"), &LayerOptions::new());
        let id = s.open(t).unwrap().unwrap();
        s.run_until_idle();
        assert!(s.toggle_expand().unwrap());
        assert_eq!(s.layer(id).unwrap().width(), 1200);
        assert!(!s.toggle_expand().unwrap());
        assert_eq!(s.layer(id).unwrap().width(), 960);
    }

    #[test]
    fn toggle_expand_on_empty_stack_is_not_found() {
        let mut s = stack();
        assert!(matches!(s.toggle_expand(), Err(LayerError::NotFound(_))));
    }

    #[test]
    fn url_sources_use_loader_with_merged_ajax() {
        let mut s = stack().with_loader(StaticLoader::new().with_page("/cart", "<cart>"));
        let t = s.init_trigger(
            &LayerOptions::new().url("/cart").method("POST"),
            &LayerOptions::new().query_params(|mut q| {
                q.insert("id".into(), "1".into());
                q
            }),
        );
        let id = s.open(t).unwrap().unwrap();
        s.advance(Duration::ZERO);
        assert_eq!(s.layer(id).unwrap().body(), &Body::Loaded("<cart>".into()));
    }
}
