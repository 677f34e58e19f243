use std::fmt::Write as _;

use serde::Serialize;

use crate::geometry::Rect;
use crate::object_manager::{ObjId, ObjectManager};
use crate::process::ProcId;
use crate::shapes::ShapeRef;

/// Serializable view of a gump subtree, for the inspector and tests.
#[derive(Debug, Clone, Serialize)]
pub struct GumpSnapshot {
    pub id: ObjId,
    pub class: &'static str,
    pub owner: ObjId,
    pub x: i32,
    pub y: i32,
    pub dims: Rect,
    pub layer: i32,
    pub index: i32,
    pub flags: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<ShapeRef>,
    pub frame: u32,
    pub focused: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub notifier: ProcId,
    pub children: Vec<GumpSnapshot>,
}

fn is_zero(value: &ProcId) -> bool {
    *value == 0
}

impl ObjectManager {
    pub fn gump_snapshot(&self, id: ObjId) -> Option<GumpSnapshot> {
        let gump = self.gump(id)?;
        let focused = gump
            .parent
            .and_then(|p| self.gump(p))
            .map(|p| p.focus_child == Some(id))
            .unwrap_or(false);
        Some(GumpSnapshot {
            id,
            class: gump.class_name(),
            owner: gump.owner,
            x: gump.x,
            y: gump.y,
            dims: gump.dims,
            layer: gump.layer,
            index: gump.index,
            flags: gump.flags.names(),
            shape: gump.shape,
            frame: gump.frame,
            focused,
            notifier: gump.notifier,
            children: gump
                .children
                .iter()
                .filter_map(|child| self.gump_snapshot(*child))
                .collect(),
        })
    }
}

impl GumpSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// One line per gump, indented by depth.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        let _ = write!(
            out,
            "{:indent$}{} {} at ({}, {}) dims {}x{}+{}+{} layer {}",
            "",
            self.class,
            self.id,
            self.x,
            self.y,
            self.dims.w,
            self.dims.h,
            self.dims.x,
            self.dims.y,
            self.layer,
            indent = depth * 2
        );
        if !self.flags.is_empty() {
            let _ = write!(out, " [{}]", self.flags.join(","));
        }
        if self.focused {
            out.push_str(" *");
        }
        out.push('\n');
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }

    /// Number of gumps in the subtree, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(GumpSnapshot::count).sum::<usize>()
    }
}
