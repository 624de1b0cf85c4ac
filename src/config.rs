//! Process-wide configuration shared by every layer of a coordinator.
//!
//! A `GlobalConfig` starts from built-in defaults and is only changed
//! through [`GlobalConfig::merge`], which applies a partial [`ConfigPatch`].

/// Icon identifiers used by the layer chrome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Icons {
    pub close: String,
    pub refresh: String,
    pub maximize: String,
    pub minimize: String,
}

impl Default for Icons {
    fn default() -> Self {
        Self {
            close: "bi bi-x-lg".to_string(),
            refresh: "bi bi-arrow-clockwise".to_string(),
            maximize: "bi bi-arrows-angle-expand".to_string(),
            minimize: "bi bi-arrows-angle-contract".to_string(),
        }
    }
}

/// Request shape used when a layer's content source is a URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AjaxSettings {
    pub method: String,
    pub content_type: String,
}

impl Default for AjaxSettings {
    fn default() -> Self {
        Self {
            method: "GET".to_string(),
            content_type: "application/x-www-form-urlencoded; charset=UTF-8".to_string(),
        }
    }
}

/// Partial request settings; unset fields fall through to the layer below.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AjaxPatch {
    pub method: Option<String>,
    pub content_type: Option<String>,
}

impl AjaxPatch {
    pub fn is_empty(&self) -> bool {
        self.method.is_none() && self.content_type.is_none()
    }

    pub fn apply_to(&self, ajax: &mut AjaxSettings) {
        if let Some(method) = &self.method {
            ajax.method = method.clone();
        }
        if let Some(content_type) = &self.content_type {
            ajax.content_type = content_type.clone();
        }
    }

    /// Layer `other` over `self`, other's set fields win.
    pub fn merged(&self, other: &AjaxPatch) -> AjaxPatch {
        AjaxPatch {
            method: other.method.clone().or_else(|| self.method.clone()),
            content_type: other
                .content_type
                .clone()
                .or_else(|| self.content_type.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GlobalConfig {
    /// Below this viewport width every layer renders at full width.
    pub full_width_breakpoint: u32,
    /// Share of the viewport taken by the first layer.
    pub first_layer_fraction: f64,
    /// Each further layer is this much narrower than the one below it.
    pub distance_between_layers: u32,
    /// Slide time in milliseconds for a layer as wide as the viewport.
    pub animation_duration_ms: u64,
    /// z-index of the lowest layer; each further layer gets one more.
    pub z_index_start: i32,
    /// Where layers are mounted in the host document.
    pub insertion_point: String,
    pub icons: Icons,
    pub ajax: AjaxSettings,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            full_width_breakpoint: 576,
            first_layer_fraction: 0.80,
            distance_between_layers: 100,
            animation_duration_ms: 600,
            z_index_start: 1050,
            insertion_point: "body".to_string(),
            icons: Icons::default(),
            ajax: AjaxSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IconsPatch {
    pub close: Option<String>,
    pub refresh: Option<String>,
    pub maximize: Option<String>,
    pub minimize: Option<String>,
}

impl IconsPatch {
    fn is_empty(&self) -> bool {
        self.close.is_none()
            && self.refresh.is_none()
            && self.maximize.is_none()
            && self.minimize.is_none()
    }
}

/// Partial override of [`GlobalConfig`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub full_width_breakpoint: Option<u32>,
    pub first_layer_fraction: Option<f64>,
    pub distance_between_layers: Option<u32>,
    pub animation_duration_ms: Option<u64>,
    pub z_index_start: Option<i32>,
    pub insertion_point: Option<String>,
    pub icons: IconsPatch,
    pub ajax: AjaxPatch,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        self.full_width_breakpoint.is_none()
            && self.first_layer_fraction.is_none()
            && self.distance_between_layers.is_none()
            && self.animation_duration_ms.is_none()
            && self.z_index_start.is_none()
            && self.insertion_point.is_none()
            && self.icons.is_empty()
            && self.ajax.is_empty()
    }
}

impl GlobalConfig {
    /// Apply `patch` on top of the current values. Nested tables are merged
    /// field by field; an empty patch leaves the config untouched.
    pub fn merge(&mut self, patch: &ConfigPatch) {
        if patch.is_empty() {
            return;
        }
        if let Some(v) = patch.full_width_breakpoint {
            self.full_width_breakpoint = v;
        }
        if let Some(v) = patch.first_layer_fraction {
            self.first_layer_fraction = v;
        }
        if let Some(v) = patch.distance_between_layers {
            self.distance_between_layers = v;
        }
        if let Some(v) = patch.animation_duration_ms {
            self.animation_duration_ms = v;
        }
        if let Some(v) = patch.z_index_start {
            self.z_index_start = v;
        }
        if let Some(v) = &patch.insertion_point {
            self.insertion_point = v.clone();
        }
        let icons = &patch.icons;
        for (slot, value) in [
            (&mut self.icons.close, &icons.close),
            (&mut self.icons.refresh, &icons.refresh),
            (&mut self.icons.maximize, &icons.maximize),
            (&mut self.icons.minimize, &icons.minimize),
        ] {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
        patch.ajax.apply_to(&mut self.ajax);
        tracing::debug!(?patch, "merged global config");
    }
}
