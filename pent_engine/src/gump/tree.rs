use crate::gump::{Gump, GumpFlags};
use crate::object_manager::{ObjId, ObjectManager};

impl ObjectManager {
    /// Attaches `child` under `parent`, detaching it from any old parent.
    ///
    /// The child goes in front of every sibling with a lower or equal layer.
    /// Without `take_focus` it instead slides under the current focus child
    /// when they share a layer. The child takes focus when asked to or when
    /// the parent has no focus child yet.
    pub fn add_child(&mut self, parent: ObjId, child: ObjId, take_focus: bool) {
        if parent == child || self.gump(parent).is_none() {
            return;
        }
        let Some(old_parent) = self.gump(child).map(|g| g.parent) else {
            return;
        };
        if let Some(old) = old_parent {
            self.remove_child(old, child);
        }

        let layer = self.gump_at(child).layer;
        let focus = self.gump_at(parent).focus_child;
        let insert_at = self
            .gump_at(parent)
            .children
            .iter()
            .position(|&other| {
                let other_layer = self.gump_at(other).layer;
                if take_focus {
                    other_layer > layer
                } else {
                    (Some(other) == focus && other_layer == layer) || other_layer > layer
                }
            })
            .unwrap_or(self.gump_at(parent).children.len());

        self.gump_at_mut(parent).children.insert(insert_at, child);
        self.gump_at_mut(child).parent = Some(parent);

        if take_focus || focus.is_none() {
            if let Some(old_focus) = focus {
                self.on_focus(old_focus, false);
            }
            self.on_focus(child, true);
            self.gump_at_mut(parent).focus_child = Some(child);
        }
    }

    /// Detaches `child`. Losing the focus child hands focus to the topmost
    /// remaining sibling.
    pub fn remove_child(&mut self, parent: ObjId, child: ObjId) {
        let Some(gump) = self.gump_mut(parent) else {
            return;
        };
        gump.children.retain(|c| *c != child);
        let had_focus = gump.focus_child == Some(child);
        if let Some(child_gump) = self.gump_mut(child) {
            if child_gump.parent == Some(parent) {
                child_gump.parent = None;
            }
        }
        if had_focus {
            self.find_new_focus_child(parent);
        }
    }

    /// Gives focus to the last (topmost) child, or to nobody.
    pub fn find_new_focus_child(&mut self, parent: ObjId) {
        let Some(gump) = self.gump_mut(parent) else {
            return;
        };
        let old = gump.focus_child.take();
        let top = gump.children.last().copied();
        if let Some(old) = old {
            self.on_focus(old, false);
        }
        if let Some(top) = top {
            self.make_focus(top);
        }
    }

    pub fn make_focus(&mut self, id: ObjId) {
        let Some(parent) = self.gump(id).and_then(|g| g.parent) else {
            self.on_focus(id, true);
            return;
        };
        if let Some(old) = self.gump(parent).and_then(|g| g.focus_child) {
            if old != id {
                self.on_focus(old, false);
            }
        }
        self.gump_at_mut(parent).focus_child = Some(id);
        self.on_focus(id, true);
    }

    fn on_focus(&mut self, id: ObjId, gained: bool) {
        log::trace!("gump {id} {} focus", if gained { "gained" } else { "lost" });
    }

    /// Re-sorts a child to the top of its layer.
    pub fn move_child_to_front(&mut self, parent: ObjId, child: ObjId) {
        let Some(gump) = self.gump(parent) else { return };
        if !gump.children.contains(&child) {
            return;
        }
        self.gump_at_mut(parent).children.retain(|c| *c != child);
        let layer = self.gump_at(child).layer;
        let insert_at = self
            .gump_at(parent)
            .children
            .iter()
            .position(|&other| self.gump_at(other).layer > layer)
            .unwrap_or(self.gump_at(parent).children.len());
        self.gump_at_mut(parent).children.insert(insert_at, child);
    }

    /// True when the gump or any ancestor is hidden.
    pub fn is_hidden(&self, id: ObjId) -> bool {
        let mut current = Some(id);
        while let Some(gid) = current {
            let Some(gump) = self.gump(gid) else {
                return false;
            };
            if gump.flags.contains(GumpFlags::HIDDEN) {
                return true;
            }
            current = gump.parent;
        }
        false
    }

    /// Save policy. Top-level records exclude gumps owned by a non-core parent.
    pub fn must_save(&self, id: ObjId, top_level: bool) -> bool {
        let Some(gump) = self.gump(id) else {
            return false;
        };
        if gump.flags.contains(GumpFlags::DONT_SAVE) {
            return false;
        }
        if top_level {
            if let Some(parent) = gump.parent {
                let parent_core = self
                    .gump(parent)
                    .map(|p| p.flags.contains(GumpFlags::CORE_GUMP))
                    .unwrap_or(false);
                if !parent_core {
                    return false;
                }
            }
        }
        true
    }

    pub fn root_gump(&self, id: ObjId) -> ObjId {
        let mut current = id;
        while let Some(parent) = self.gump(current).and_then(|g| g.parent) {
            current = parent;
        }
        current
    }

    /// Searches `id`, then its direct children, then each child's subtree.
    /// Closing children are skipped.
    pub fn find_gump_by(&self, id: ObjId, pred: &dyn Fn(&Gump) -> bool) -> Option<ObjId> {
        let gump = self.gump(id)?;
        if pred(gump) {
            return Some(id);
        }
        let live: Vec<ObjId> = gump
            .children
            .iter()
            .copied()
            .filter(|c| self.gump(*c).map(|g| !g.is_closing()).unwrap_or(false))
            .collect();
        if let Some(hit) = live.iter().copied().find(|c| pred(self.gump_at(*c))) {
            return Some(hit);
        }
        live.iter().find_map(|c| self.find_gump_by(*c, pred))
    }

    /// Child whose `index` matches, used by dialogs to find their widgets.
    pub fn find_child_by_index(&self, parent: ObjId, index: i32) -> Option<ObjId> {
        self.gump(parent)?
            .children
            .iter()
            .copied()
            .find(|c| self.gump(*c).map(|g| g.index == index).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gump::{LAYER_ABOVE_NORMAL, LAYER_MODAL, LAYER_NORMAL};
    use crate::object_manager::Object;

    fn gump(om: &mut ObjectManager, layer: i32) -> ObjId {
        om.assign_obj_id(
            Object::Gump(Gump::new(0, 0, 10, 10, 0, GumpFlags::empty(), layer)),
            None,
        )
    }

    fn layers(om: &ObjectManager, parent: ObjId) -> Vec<i32> {
        om.gump_at(parent)
            .children
            .iter()
            .map(|c| om.gump_at(*c).layer)
            .collect()
    }

    #[test]
    fn children_stay_sorted_by_layer() {
        let mut om = ObjectManager::new();
        let root = gump(&mut om, LAYER_NORMAL);
        for layer in [LAYER_MODAL, LAYER_NORMAL, LAYER_ABOVE_NORMAL, LAYER_NORMAL, -3] {
            let child = gump(&mut om, layer);
            om.add_child(root, child, layer % 2 == 0);
        }
        let order = layers(&om, root);
        let mut sorted = order.clone();
        sorted.sort();
        assert_eq!(order, sorted);
    }

    #[test]
    fn non_focus_child_slides_under_same_layer_focus() {
        let mut om = ObjectManager::new();
        let root = gump(&mut om, LAYER_NORMAL);
        let first = gump(&mut om, LAYER_NORMAL);
        let second = gump(&mut om, LAYER_NORMAL);
        om.add_child(root, first, true);
        om.add_child(root, second, false);
        assert_eq!(om.gump_at(root).children, vec![second, first]);
        assert_eq!(om.gump_at(root).focus_child, Some(first));
    }

    #[test]
    fn removing_focus_child_focuses_topmost_sibling() {
        let mut om = ObjectManager::new();
        let root = gump(&mut om, LAYER_NORMAL);
        let a = gump(&mut om, LAYER_NORMAL);
        let b = gump(&mut om, LAYER_ABOVE_NORMAL);
        let c = gump(&mut om, LAYER_NORMAL);
        om.add_child(root, a, true);
        om.add_child(root, b, true);
        om.add_child(root, c, true);
        assert_eq!(om.gump_at(root).focus_child, Some(c));
        om.remove_child(root, c);
        assert_eq!(om.gump_at(root).focus_child, Some(b));
        om.remove_child(root, b);
        om.remove_child(root, a);
        assert_eq!(om.gump_at(root).focus_child, None);
        assert_eq!(om.gump_at(a).parent, None);
    }

    #[test]
    fn reparenting_detaches_from_old_parent() {
        let mut om = ObjectManager::new();
        let left = gump(&mut om, LAYER_NORMAL);
        let right = gump(&mut om, LAYER_NORMAL);
        let child = gump(&mut om, LAYER_NORMAL);
        om.add_child(left, child, true);
        om.add_child(right, child, false);
        assert!(om.gump_at(left).children.is_empty());
        assert_eq!(om.gump_at(left).focus_child, None);
        assert_eq!(om.gump_at(child).parent, Some(right));
    }

    #[test]
    fn hidden_is_inherited_from_ancestors() {
        let mut om = ObjectManager::new();
        let root = gump(&mut om, LAYER_NORMAL);
        let mid = gump(&mut om, LAYER_NORMAL);
        let leaf = gump(&mut om, LAYER_NORMAL);
        om.add_child(root, mid, true);
        om.add_child(mid, leaf, true);
        assert!(!om.is_hidden(leaf));
        om.gump_at_mut(root).hide();
        assert!(om.is_hidden(leaf));
        assert_eq!(om.root_gump(leaf), root);
    }

    #[test]
    fn move_to_front_keeps_layer_order() {
        let mut om = ObjectManager::new();
        let root = gump(&mut om, LAYER_NORMAL);
        let a = gump(&mut om, LAYER_NORMAL);
        let b = gump(&mut om, LAYER_NORMAL);
        let top = gump(&mut om, LAYER_MODAL);
        om.add_child(root, a, true);
        om.add_child(root, b, true);
        om.add_child(root, top, true);
        om.move_child_to_front(root, a);
        assert_eq!(om.gump_at(root).children, vec![b, a, top]);
    }
}
