use std::collections::HashMap;

use crate::animation::AnimationLock;
use crate::backdrop::{BackdropManager, BackdropTarget};
use crate::stack::{Layer, LayerId, LayerState};

/// Everything the coordinator mutates while layers come and go: the ordered
/// stack, the transition lock and the backdrop.
///
/// `order` is oldest first; the last entry is the topmost layer. Every id in
/// `order` has an entry in `layers` and vice versa.
#[derive(Debug, Default)]
pub struct StackState {
    order: Vec<LayerId>,
    layers: HashMap<LayerId, Layer>,
    pub(crate) lock: AnimationLock,
    pub(crate) backdrop: BackdropManager,
}

impl StackState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    pub fn get(&self, id: LayerId) -> Option<&Layer> {
        self.layers.get(&id)
    }

    pub fn get_mut(&mut self, id: LayerId) -> Option<&mut Layer> {
        self.layers.get_mut(&id)
    }

    /// Layer ids bottom to top.
    pub fn order(&self) -> &[LayerId] {
        &self.order
    }

    /// Layers bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Layer> + '_ {
        self.order.iter().filter_map(|id| self.layers.get(id))
    }

    pub fn top(&self) -> Option<&Layer> {
        self.order.last().and_then(|id| self.layers.get(id))
    }

    /// Topmost layer that is not on its way out.
    pub fn active_top(&self) -> Option<&Layer> {
        self.order
            .iter()
            .rev()
            .filter_map(|id| self.layers.get(id))
            .find(|l| l.state != LayerState::Closing)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Layer> {
        self.iter().find(|l| l.name == name)
    }

    pub(crate) fn push(&mut self, layer: Layer) {
        self.order.push(layer.id);
        self.layers.insert(layer.id, layer);
    }

    pub(crate) fn remove(&mut self, id: LayerId) -> Option<Layer> {
        self.order.retain(|other| *other != id);
        self.layers.remove(&id)
    }

    /// Point the backdrop at the top of the stack, ignoring `leaving`.
    pub(crate) fn reconcile_backdrop(&mut self, leaving: Option<LayerId>) {
        let target = self
            .order
            .iter()
            .rev()
            .filter(|id| Some(**id) != leaving)
            .filter_map(|id| self.layers.get(id))
            .find(|l| l.state != LayerState::Closing)
            .map(|l| BackdropTarget {
                z_index: l.z_index,
                mode: l.settings.backdrop,
            });
        self.backdrop.reconcile(target);
    }

    /// Mark every layer covered except the topmost one still staying,
    /// ignoring `leaving`.
    pub(crate) fn sync_covered(&mut self, leaving: Option<LayerId>) {
        let top = self
            .order
            .iter()
            .rev()
            .copied()
            .filter(|id| Some(*id) != leaving)
            .find(|id| {
                self.layers
                    .get(id)
                    .is_some_and(|l| l.state != LayerState::Closing)
            });
        for id in &self.order {
            if let Some(layer) = self.layers.get_mut(id) {
                layer.covered = Some(*id) != top && Some(*id) != leaving;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{BackdropMode, LayerSettings, TriggerId};
    use crate::stack::Body;

    fn layer(n: u64, z: i32, backdrop: BackdropMode) -> Layer {
        let mut settings = LayerSettings::defaults();
        settings.backdrop = backdrop;
        Layer {
            id: LayerId(n),
            trigger: TriggerId(n),
            name: format!("layer{n}"),
            settings,
            title: None,
            width: 100,
            z_index: z,
            expanded: false,
            covered: false,
            state: LayerState::Open,
            body: Body::Loading,
            ticket: None,
            refreshing: false,
            transition: None,
        }
    }

    #[test]
    fn backdrop_tracks_top_and_skips_leaving_layer() {
        let mut s = StackState::new();
        s.push(layer(1, 1050, BackdropMode::Visible));
        s.push(layer(2, 1051, BackdropMode::Static));
        s.reconcile_backdrop(None);
        let b = s.backdrop.backdrop().unwrap();
        assert_eq!(b.z_index, 1050);
        assert!(!b.dismissible());

        s.reconcile_backdrop(Some(LayerId(2)));
        assert_eq!(s.backdrop.backdrop().unwrap().z_index, 1049);

        s.remove(LayerId(2));
        s.remove(LayerId(1));
        s.reconcile_backdrop(None);
        assert!(s.backdrop.backdrop().is_none());
        assert!(s.is_empty());
    }

    #[test]
    fn only_the_staying_top_is_uncovered() {
        let mut s = StackState::new();
        for n in 1..=3 {
            s.push(layer(n, 1049 + n as i32, BackdropMode::Visible));
        }
        s.sync_covered(None);
        let covered: Vec<bool> = s.iter().map(|l| l.covered).collect();
        assert_eq!(covered, vec![true, true, false]);

        s.sync_covered(Some(LayerId(3)));
        let covered: Vec<bool> = s.iter().map(|l| l.covered).collect();
        assert_eq!(covered, vec![true, false, false]);
        assert_eq!(s.active_top().map(|l| l.id), Some(LayerId(3)));
        assert_eq!(s.find_by_name("layer2").map(|l| l.id), Some(LayerId(2)));
    }

    #[test]
    fn iter_walks_both_directions() {
        let mut s = StackState::new();
        for n in 1..=3 {
            s.push(layer(n, 1049 + n as i32, BackdropMode::Visible));
        }
        s.remove(LayerId(2));
        let down: Vec<LayerId> = s.iter().rev().map(|l| l.id).collect();
        assert_eq!(down, vec![LayerId(3), LayerId(1)]);
        assert_eq!(s.order(), &[LayerId(1), LayerId(3)]);
    }
}
