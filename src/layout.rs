//! Width, stacking depth and transition timing for layers.
//!
//! Everything here is a pure function of the viewport, the global config
//! and the stack contents; the coordinator owns when they are applied.

use std::time::Duration;

use crate::config::GlobalConfig;
use crate::constants::FALLBACK_PREVIOUS_FRACTION;

/// Size of the area layers slide over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// The layer directly below the one being sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predecessor {
    /// The layer is the first on the stack.
    None,
    /// A layer exists below but its rendered width cannot be read.
    Unmeasured,
    Width(u32),
}

impl Predecessor {
    /// A zero width counts as unreadable.
    pub fn from_rendered(width: u32) -> Self {
        if width == 0 {
            Predecessor::Unmeasured
        } else {
            Predecessor::Width(width)
        }
    }
}

/// Per-layer inputs to the width rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WidthSpec {
    pub override_width: Option<u32>,
    pub expanded: bool,
}

fn scaled(width: u32, fraction: f64) -> u32 {
    (f64::from(width) * fraction).round().max(0.0) as u32
}

/// Whether the viewport is narrow enough that every layer goes full width.
pub fn full_width_mode(config: &GlobalConfig, viewport: Viewport) -> bool {
    viewport.width < config.full_width_breakpoint
}

/// Width of one layer, first matching rule wins:
/// 1. narrow viewport -> viewport width;
/// 2. expanded -> viewport width;
/// 3. explicit override;
/// 4. first layer -> `viewport * first_layer_fraction`;
/// 5. otherwise `max(below - distance, breakpoint)`, where an unmeasured
///    layer below counts as `viewport * 0.8`.
pub fn layer_width(
    config: &GlobalConfig,
    viewport: Viewport,
    spec: WidthSpec,
    below: Predecessor,
) -> u32 {
    if full_width_mode(config, viewport) || spec.expanded {
        return viewport.width;
    }
    if let Some(width) = spec.override_width {
        return width;
    }
    let previous = match below {
        Predecessor::None => return scaled(viewport.width, config.first_layer_fraction),
        Predecessor::Unmeasured => scaled(viewport.width, FALLBACK_PREVIOUS_FRACTION),
        Predecessor::Width(width) => width,
    };
    previous
        .saturating_sub(config.distance_between_layers)
        .max(config.full_width_breakpoint)
}

/// Recompute widths for a whole stack, bottom first. Each layer is sized
/// against the width just computed for the layer below it.
pub fn cascade_widths(config: &GlobalConfig, viewport: Viewport, specs: &[WidthSpec]) -> Vec<u32> {
    let mut widths: Vec<u32> = Vec::with_capacity(specs.len());
    for spec in specs {
        let below = match widths.last() {
            None => Predecessor::None,
            Some(&w) => Predecessor::from_rendered(w),
        };
        widths.push(layer_width(config, viewport, *spec, below));
    }
    widths
}

/// Stacking depth for a layer pushed onto a stack of `depth_before` layers.
pub fn z_index_for(config: &GlobalConfig, depth_before: usize) -> i32 {
    let depth = i32::try_from(depth_before).unwrap_or(i32::MAX);
    config.z_index_start.saturating_add(depth)
}

/// Slide time scaled by the share of the viewport the layer traverses.
pub fn transition_duration(config: &GlobalConfig, width: u32, viewport: Viewport) -> Duration {
    if viewport.width == 0 {
        return Duration::ZERO;
    }
    let ms = (config.animation_duration_ms as f64 * f64::from(width) / f64::from(viewport.width))
        .round()
        .max(0.0);
    Duration::from_millis(ms as u64)
}

/// Cubic ease-in-out over `t` in `0..=1`.
pub fn ease_in_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wide() -> Viewport {
        Viewport::new(1200, 800)
    }

    #[test]
    fn first_layer_uses_fraction() {
        let c = GlobalConfig::default();
        let w = layer_width(&c, wide(), WidthSpec::default(), Predecessor::None);
        assert_eq!(w, 960);
        // rounding, not truncation
        let w = layer_width(&c, Viewport::new(1001, 600), WidthSpec::default(), Predecessor::None);
        assert_eq!(w, 801);
    }

    #[test]
    fn later_layers_step_down_and_clamp_at_breakpoint() {
        let c = GlobalConfig::default();
        let w = layer_width(&c, wide(), WidthSpec::default(), Predecessor::Width(960));
        assert_eq!(w, 860);
        let w = layer_width(&c, wide(), WidthSpec::default(), Predecessor::Width(600));
        assert_eq!(w, 576);
    }

    #[test]
    fn unmeasured_predecessor_falls_back_to_eighty_percent() {
        let c = GlobalConfig {
            first_layer_fraction: 0.5,
            ..GlobalConfig::default()
        };
        let w = layer_width(&c, wide(), WidthSpec::default(), Predecessor::Unmeasured);
        assert_eq!(w, 960 - 100);
        assert_eq!(Predecessor::from_rendered(0), Predecessor::Unmeasured);
    }

    #[test]
    fn narrow_viewport_beats_override_and_expansion() {
        let c = GlobalConfig::default();
        let narrow = Viewport::new(500, 800);
        let spec = WidthSpec {
            override_width: Some(300),
            expanded: false,
        };
        assert_eq!(layer_width(&c, narrow, spec, Predecessor::Width(480)), 500);
        let expanded = WidthSpec {
            override_width: Some(300),
            expanded: true,
        };
        assert_eq!(layer_width(&c, wide(), expanded, Predecessor::None), 1200);
        assert_eq!(layer_width(&c, wide(), spec, Predecessor::None), 300);
    }

    #[test]
    fn cascade_chains_through_neighbors() {
        let c = GlobalConfig::default();
        let specs = [
            WidthSpec::default(),
            WidthSpec {
                override_width: Some(1000),
                expanded: false,
            },
            WidthSpec::default(),
        ];
        assert_eq!(cascade_widths(&c, wide(), &specs), vec![960, 1000, 900]);
        assert!(cascade_widths(&c, wide(), &[]).is_empty());
    }

    #[test]
    fn z_index_counts_layers_below() {
        let c = GlobalConfig::default();
        assert_eq!(z_index_for(&c, 0), 1050);
        assert_eq!(z_index_for(&c, 2), 1052);
    }

    #[test]
    fn duration_scales_with_viewport_share() {
        let c = GlobalConfig::default();
        assert_eq!(
            transition_duration(&c, 960, wide()),
            Duration::from_millis(480)
        );
        assert_eq!(
            transition_duration(&c, 1200, wide()),
            Duration::from_millis(600)
        );
        assert_eq!(
            transition_duration(&c, 10, Viewport::new(0, 0)),
            Duration::ZERO
        );
    }

    #[test]
    fn easing_is_monotonic_and_bounded() {
        assert_eq!(ease_in_out(0.0), 0.0);
        assert_eq!(ease_in_out(1.0), 1.0);
        assert!((ease_in_out(0.5) - 0.5).abs() < 1e-9);
        let mut prev = 0.0;
        for i in 1..=20 {
            let v = ease_in_out(i as f64 / 20.0);
            assert!(v >= prev);
            prev = v;
        }
        assert_eq!(ease_in_out(-1.0), 0.0);
    }
}
