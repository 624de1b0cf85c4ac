//! Per-trigger layer settings and the store that owns them.
//!
//! Settings are built once per trigger by layering, in increasing
//! precedence, the built-in defaults, the trigger's own attributes and the
//! options passed at initialization. Scalars are replaced
//! wholesale; the nested ajax table and the named handler map merge
//! entry by entry.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::config::{AjaxPatch, AjaxSettings, GlobalConfig};
use crate::content::{ContentSource, QueryParams, QueryTransform};
use crate::events::{Emitted, EventKind, Handler};
use crate::naming::handler_name;

/// Identity of a trigger; also determines the id of the layer it opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TriggerId(pub(crate) u64);

impl fmt::Display for TriggerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "trigger_{}", self.0)
    }
}

/// How the shared backdrop behaves while a layer is topmost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackdropMode {
    /// Visible dimming; clicking it dismisses the layer.
    #[default]
    Visible,
    /// Invisible but still intercepts pointer input.
    Transparent,
    /// Visible; immune to dismiss-by-click and dismiss-by-escape.
    Static,
}

impl From<bool> for BackdropMode {
    fn from(value: bool) -> Self {
        if value { Self::Visible } else { Self::Transparent }
    }
}

/// Consumer callbacks, one optional slot per lifecycle event plus a map for
/// arbitrary named events keyed by handler name (`onItemAdded`).
#[derive(Clone, Default)]
pub struct Callbacks {
    pub on_show: Option<Handler>,
    pub on_shown: Option<Handler>,
    pub on_hide: Option<Handler>,
    pub on_hidden: Option<Handler>,
    pub on_post_body: Option<Handler>,
    pub on_refresh: Option<Handler>,
    pub on_custom_event: Option<Handler>,
    pub on_all: Option<Handler>,
    pub named: BTreeMap<String, Handler>,
}

impl Callbacks {
    /// The handler that receives `kind`, if one is set.
    pub fn slot(&self, kind: &EventKind) -> Option<&Handler> {
        match kind {
            EventKind::Show => self.on_show.as_ref(),
            EventKind::Shown => self.on_shown.as_ref(),
            EventKind::Hide => self.on_hide.as_ref(),
            EventKind::Hidden => self.on_hidden.as_ref(),
            EventKind::PostBody => self.on_post_body.as_ref(),
            EventKind::Refresh => self.on_refresh.as_ref(),
            EventKind::Custom => self.on_custom_event.as_ref(),
            EventKind::Named(name) => self.named.get(&handler_name(name)),
        }
    }

    fn merge_from(&mut self, other: &Callbacks) {
        for (slot, value) in [
            (&mut self.on_show, &other.on_show),
            (&mut self.on_shown, &other.on_shown),
            (&mut self.on_hide, &other.on_hide),
            (&mut self.on_hidden, &other.on_hidden),
            (&mut self.on_post_body, &other.on_post_body),
            (&mut self.on_refresh, &other.on_refresh),
            (&mut self.on_custom_event, &other.on_custom_event),
            (&mut self.on_all, &other.on_all),
        ] {
            if let Some(handler) = value {
                *slot = Some(Rc::clone(handler));
            }
        }
        for (name, handler) in &other.named {
            self.named.insert(name.clone(), Rc::clone(handler));
        }
    }
}

impl fmt::Debug for Callbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let set: Vec<&str> = [
            ("onShow", self.on_show.is_some()),
            ("onShown", self.on_shown.is_some()),
            ("onHide", self.on_hide.is_some()),
            ("onHidden", self.on_hidden.is_some()),
            ("onPostBody", self.on_post_body.is_some()),
            ("onRefresh", self.on_refresh.is_some()),
            ("onCustomEvent", self.on_custom_event.is_some()),
            ("onAll", self.on_all.is_some()),
        ]
        .into_iter()
        .filter_map(|(name, present)| present.then_some(name))
        .chain(self.named.keys().map(String::as_str))
        .collect();
        f.debug_struct("Callbacks").field("set", &set).finish()
    }
}

/// Fully resolved settings of one trigger.
#[derive(Clone)]
pub struct LayerSettings {
    /// Configured stack-unique name; a placeholder is derived when absent.
    pub name: Option<String>,
    pub title: Option<String>,
    /// Explicit width that replaces the cascade formula.
    pub width: Option<u32>,
    pub backdrop: BackdropMode,
    pub source: Option<ContentSource>,
    pub query_params: Option<QueryTransform>,
    pub closeable: bool,
    pub expandable: bool,
    pub refreshable: bool,
    /// Per-layer request overrides, merged over the global ajax table at
    /// fetch time.
    pub ajax: AjaxPatch,
    pub callbacks: Callbacks,
}

impl LayerSettings {
    /// Built-in per-layer defaults. The global config does not feed any
    /// per-layer value directly; ajax defaults are applied at fetch time.
    pub fn defaults() -> Self {
        Self {
            name: None,
            title: None,
            width: None,
            backdrop: BackdropMode::Visible,
            source: None,
            query_params: None,
            closeable: true,
            expandable: true,
            refreshable: false,
            ajax: AjaxPatch::default(),
            callbacks: Callbacks::default(),
        }
    }

    /// Merge defaults, trigger attributes and call-time options in that
    /// order of precedence.
    pub fn merged(attributes: &LayerOptions, options: &LayerOptions) -> Self {
        let mut settings = Self::defaults();
        attributes.apply_to(&mut settings);
        options.apply_to(&mut settings);
        settings
    }

    /// Query parameters for a fetch: an empty set passed through the
    /// configured transform.
    pub fn query(&self) -> QueryParams {
        let params = QueryParams::new();
        match &self.query_params {
            Some(transform) => transform(params),
            None => params,
        }
    }

    /// Request settings for a URL fetch, layered over `config.ajax`.
    pub fn resolved_ajax(&self, config: &GlobalConfig) -> AjaxSettings {
        let mut ajax = config.ajax.clone();
        self.ajax.apply_to(&mut ajax);
        ajax
    }
}

/// Partial settings: trigger attributes or call-time options.
#[derive(Clone, Default)]
pub struct LayerOptions {
    pub name: Option<String>,
    pub title: Option<String>,
    pub width: Option<u32>,
    pub backdrop: Option<BackdropMode>,
    pub source: Option<ContentSource>,
    pub query_params: Option<QueryTransform>,
    pub closeable: Option<bool>,
    pub expandable: Option<bool>,
    pub refreshable: Option<bool>,
    pub ajax: AjaxPatch,
    pub callbacks: Callbacks,
}

impl LayerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn width(mut self, width: u32) -> Self {
        self.width = Some(width);
        self
    }

    pub fn backdrop(mut self, mode: impl Into<BackdropMode>) -> Self {
        self.backdrop = Some(mode.into());
        self
    }

    pub fn source(mut self, source: ContentSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn url(self, url: impl Into<String>) -> Self {
        self.source(ContentSource::url(url))
    }

    pub fn query_params<F>(mut self, transform: F) -> Self
    where
        F: Fn(QueryParams) -> QueryParams + 'static,
    {
        self.query_params = Some(Rc::new(transform));
        self
    }

    pub fn closeable(mut self, value: bool) -> Self {
        self.closeable = Some(value);
        self
    }

    pub fn expandable(mut self, value: bool) -> Self {
        self.expandable = Some(value);
        self
    }

    pub fn refreshable(mut self, value: bool) -> Self {
        self.refreshable = Some(value);
        self
    }

    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.ajax.method = Some(method.into());
        self
    }

    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.ajax.content_type = Some(content_type.into());
        self
    }

    /// Attach `handler` to the slot that receives `kind`.
    pub fn on<F>(mut self, kind: EventKind, handler: F) -> Self
    where
        F: Fn(&Emitted) + 'static,
    {
        let handler: Handler = Rc::new(handler);
        let cb = &mut self.callbacks;
        match kind {
            EventKind::Show => cb.on_show = Some(handler),
            EventKind::Shown => cb.on_shown = Some(handler),
            EventKind::Hide => cb.on_hide = Some(handler),
            EventKind::Hidden => cb.on_hidden = Some(handler),
            EventKind::PostBody => cb.on_post_body = Some(handler),
            EventKind::Refresh => cb.on_refresh = Some(handler),
            EventKind::Custom => cb.on_custom_event = Some(handler),
            EventKind::Named(name) => {
                cb.named.insert(handler_name(&name), handler);
            }
        }
        self
    }

    /// Handler invoked for every event except the catch-all itself.
    pub fn on_all<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Emitted) + 'static,
    {
        self.callbacks.on_all = Some(Rc::new(handler));
        self
    }

    /// Copy of these options without a name. Used by refresh and show,
    /// which must never reassign the stack-uniqueness key.
    pub fn without_name(&self) -> Self {
        Self {
            name: None,
            ..self.clone()
        }
    }

    pub fn apply_to(&self, settings: &mut LayerSettings) {
        if let Some(name) = &self.name {
            settings.name = Some(name.clone());
        }
        if let Some(title) = &self.title {
            settings.title = Some(title.clone());
        }
        if let Some(width) = self.width {
            settings.width = Some(width);
        }
        if let Some(backdrop) = self.backdrop {
            settings.backdrop = backdrop;
        }
        if let Some(source) = &self.source {
            settings.source = Some(source.clone());
        }
        if let Some(transform) = &self.query_params {
            settings.query_params = Some(Rc::clone(transform));
        }
        if let Some(v) = self.closeable {
            settings.closeable = v;
        }
        if let Some(v) = self.expandable {
            settings.expandable = v;
        }
        if let Some(v) = self.refreshable {
            settings.refreshable = v;
        }
        settings.ajax = settings.ajax.merged(&self.ajax);
        settings.callbacks.merge_from(&self.callbacks);
    }
}

impl fmt::Debug for LayerSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerSettings")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("width", &self.width)
            .field("backdrop", &self.backdrop)
            .field("source", &self.source)
            .field("query_params", &self.query_params.is_some())
            .field("closeable", &self.closeable)
            .field("expandable", &self.expandable)
            .field("refreshable", &self.refreshable)
            .field("ajax", &self.ajax)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

impl fmt::Debug for LayerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerOptions")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("width", &self.width)
            .field("backdrop", &self.backdrop)
            .field("source", &self.source)
            .field("query_params", &self.query_params.is_some())
            .field("closeable", &self.closeable)
            .field("expandable", &self.expandable)
            .field("refreshable", &self.refreshable)
            .field("ajax", &self.ajax)
            .field("callbacks", &self.callbacks)
            .finish()
    }
}

/// Settings keyed by trigger identity.
#[derive(Debug, Default)]
pub struct SettingsStore {
    entries: HashMap<TriggerId, LayerSettings>,
    next_id: u64,
}

impl SettingsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `settings` under a freshly allocated trigger id.
    pub fn register(&mut self, settings: LayerSettings) -> TriggerId {
        self.next_id = self.next_id.saturating_add(1);
        let id = TriggerId(self.next_id);
        self.entries.insert(id, settings);
        id
    }

    pub fn get(&self, id: TriggerId) -> Option<&LayerSettings> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: TriggerId) -> Option<&mut LayerSettings> {
        self.entries.get_mut(&id)
    }

    pub fn set(&mut self, id: TriggerId, settings: LayerSettings) {
        self.entries.insert(id, settings);
    }

    pub fn remove(&mut self, id: TriggerId) -> Option<LayerSettings> {
        self.entries.remove(&id)
    }

    pub fn contains(&self, id: TriggerId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn call_options_win_over_attributes() {
        let attributes = LayerOptions::new().title("from attrs").width(300).refreshable(true);
        let options = LayerOptions::new().title("from call");
        let s = LayerSettings::merged(&attributes, &options);
        assert_eq!(s.title.as_deref(), Some("from call"));
        assert_eq!(s.width, Some(300));
        assert!(s.refreshable);
        // defaults survive where nobody overrides
        assert!(s.closeable);
        assert_eq!(s.backdrop, BackdropMode::Visible);
    }

    #[test]
    fn ajax_table_merges_field_by_field() {
        let attributes = LayerOptions::new().method("POST");
        let options = LayerOptions::new().content_type("application/json");
        let s = LayerSettings::merged(&attributes, &options);
        let ajax = s.resolved_ajax(&GlobalConfig::default());
        assert_eq!(ajax.method, "POST");
        assert_eq!(ajax.content_type, "application/json");
    }

    #[test]
    fn named_handlers_merge_and_resolve() {
        let hits = Rc::new(Cell::new(0));
        let h = Rc::clone(&hits);
        let attributes = LayerOptions::new().on(EventKind::Named("item-added".into()), move |_| {
            h.set(h.get() + 1)
        });
        let options = LayerOptions::new().on(EventKind::Show, |_| {});
        let s = LayerSettings::merged(&attributes, &options);
        assert!(s.callbacks.slot(&EventKind::Show).is_some());
        assert!(s.callbacks.slot(&EventKind::Hide).is_none());
        let named = s
            .callbacks
            .slot(&EventKind::Named("item-added".into()))
            .expect("named handler");
        named(&Emitted::new(TriggerId(1), "item-added.layer", Vec::new()));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn without_name_strips_only_name() {
        let o = LayerOptions::new().name("x").title("t");
        let stripped = o.without_name();
        assert!(stripped.name.is_none());
        assert_eq!(stripped.title.as_deref(), Some("t"));
    }

    #[test]
    fn query_runs_transform_over_empty_params() {
        let s = LayerSettings::merged(
            &LayerOptions::new().query_params(|mut q| {
                assert!(q.is_empty());
                q.insert("id".into(), "42".into());
                q
            }),
            &LayerOptions::new(),
        );
        assert_eq!(s.query().get("id").map(String::as_str), Some("42"));
    }

    #[test]
    fn store_allocates_distinct_ids() {
        let mut store = SettingsStore::new();
        let a = store.register(LayerSettings::defaults());
        let b = store.register(LayerSettings::defaults());
        assert_ne!(a, b);
        assert_eq!(store.len(), 2);
        store.get_mut(a).unwrap().title = Some("A".into());
        assert_eq!(store.get(a).unwrap().title.as_deref(), Some("A"));
    }
}
