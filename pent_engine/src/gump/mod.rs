//! Retained-mode UI scene graph.
//!
//! Gumps live in the [`ObjectManager`](crate::object_manager::ObjectManager)
//! arena and refer to each other by id. Structural operations (z-order,
//! focus, coordinate transforms) are methods on the object manager; anything
//! that reaches other subsystems (processes, audio, the kernel's pause depth)
//! is a method on [`GameContext`](crate::context::GameContext).

use bitflags::bitflags;

use crate::geometry::Rect;
use crate::gumps::{
    BarkGump, ButtonWidget, ContainerGump, DesktopGump, ItemRelativeGump, ModalGump, PagedGump,
    ScalerGump, SliderGump, TargetGump,
};
use crate::object_manager::{ObjId, UNASSIGNED};
use crate::process::ProcId;
use crate::shapes::{ShapeFrame, ShapeRef};

pub mod events;
pub mod hit;
pub mod lifecycle;
pub mod paint;
pub mod persist;
pub mod snapshot;
pub mod transform;
pub mod tree;

pub const LAYER_DESKTOP: i32 = -16;
pub const LAYER_GAMEMAP: i32 = -8;
pub const LAYER_NORMAL: i32 = 0;
pub const LAYER_ABOVE_NORMAL: i32 = 1;
pub const LAYER_MODAL: i32 = 12;
pub const LAYER_CONSOLE: i32 = 16;

bitflags! {
    pub struct GumpFlags: u32 {
        const DRAGGABLE = 0x01;
        const HIDDEN = 0x02;
        const CLOSING = 0x04;
        const CLOSE_AND_DEL = 0x08;
        const ITEM_DEPENDENT = 0x10;
        const DONT_SAVE = 0x20;
        const CORE_GUMP = 0x40;
        const KEEP_VISIBLE = 0x80;
    }
}

impl GumpFlags {
    pub fn names(&self) -> Vec<&'static str> {
        let table = [
            (GumpFlags::DRAGGABLE, "draggable"),
            (GumpFlags::HIDDEN, "hidden"),
            (GumpFlags::CLOSING, "closing"),
            (GumpFlags::CLOSE_AND_DEL, "close_and_del"),
            (GumpFlags::ITEM_DEPENDENT, "item_dependent"),
            (GumpFlags::DONT_SAVE, "dont_save"),
            (GumpFlags::CORE_GUMP, "core_gump"),
            (GumpFlags::KEEP_VISIBLE, "keep_visible"),
        ];
        table
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

/// Anchor used by `set_relative_position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Center,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    TopCenter,
    BottomCenter,
    LeftCenter,
    RightCenter,
}

/// Upcalls from a child to its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildMessage {
    Closing,
    ButtonClick,
    ButtonUp,
    ButtonDouble,
}

/// Concrete behaviour of a gump.
#[derive(Debug, Clone)]
pub enum GumpKind {
    Plain,
    Desktop(DesktopGump),
    Scaler(ScalerGump),
    GameMap,
    Modal(ModalGump),
    Paged(PagedGump),
    Slider(SliderGump),
    Target(TargetGump),
    ItemRelative(ItemRelativeGump),
    Bark(BarkGump),
    Container(ContainerGump),
    Button(ButtonWidget),
    SlidingWidget,
}

impl GumpKind {
    pub fn class_name(&self) -> &'static str {
        match self {
            GumpKind::Plain => "Gump",
            GumpKind::Desktop(_) => "DesktopGump",
            GumpKind::Scaler(_) => "ScalerGump",
            GumpKind::GameMap => "GameMapGump",
            GumpKind::Modal(_) => "ModalGump",
            GumpKind::Paged(_) => "PagedGump",
            GumpKind::Slider(_) => "SliderGump",
            GumpKind::Target(_) => "TargetGump",
            GumpKind::ItemRelative(_) => "ItemRelativeGump",
            GumpKind::Bark(_) => "BarkGump",
            GumpKind::Container(_) => "ContainerGump",
            GumpKind::Button(_) => "ButtonWidget",
            GumpKind::SlidingWidget => "SlidingWidget",
        }
    }

    pub fn modal(&self) -> Option<&ModalGump> {
        match self {
            GumpKind::Modal(modal) => Some(modal),
            GumpKind::Paged(paged) => Some(&paged.modal),
            GumpKind::Slider(slider) => Some(&slider.modal),
            GumpKind::Target(target) => Some(&target.modal),
            _ => None,
        }
    }

    pub fn modal_mut(&mut self) -> Option<&mut ModalGump> {
        match self {
            GumpKind::Modal(modal) => Some(modal),
            GumpKind::Paged(paged) => Some(&mut paged.modal),
            GumpKind::Slider(slider) => Some(&mut slider.modal),
            GumpKind::Target(target) => Some(&mut target.modal),
            _ => None,
        }
    }

    pub fn is_modal(&self) -> bool {
        self.modal().is_some()
    }

    pub fn item_relative(&self) -> Option<&ItemRelativeGump> {
        match self {
            GumpKind::ItemRelative(rel) => Some(rel),
            GumpKind::Bark(bark) => Some(&bark.rel),
            GumpKind::Container(container) => Some(&container.rel),
            _ => None,
        }
    }

    pub fn item_relative_mut(&mut self) -> Option<&mut ItemRelativeGump> {
        match self {
            GumpKind::ItemRelative(rel) => Some(rel),
            GumpKind::Bark(bark) => Some(&mut bark.rel),
            GumpKind::Container(container) => Some(&mut container.rel),
            _ => None,
        }
    }

    /// Kinds that only exist at runtime and never go into a save.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            GumpKind::Desktop(_)
                | GumpKind::Scaler(_)
                | GumpKind::GameMap
                | GumpKind::Modal(_)
                | GumpKind::Paged(_)
                | GumpKind::Slider(_)
                | GumpKind::Target(_)
        )
    }
}

/// One node of the scene graph.
#[derive(Debug, Clone)]
pub struct Gump {
    pub id: ObjId,
    /// Game object this gump represents, 0 for none.
    pub owner: ObjId,
    pub parent: Option<ObjId>,
    /// Position in parent coordinates.
    pub x: i32,
    pub y: i32,
    /// Local extent; `dims.x`/`dims.y` shift the local origin.
    pub dims: Rect,
    pub flags: GumpFlags,
    pub layer: i32,
    pub index: i32,
    pub shape: Option<ShapeRef>,
    pub frame: u32,
    /// Sorted by layer; later entries draw on top.
    pub children: Vec<ObjId>,
    pub focus_child: Option<ObjId>,
    pub notifier: ProcId,
    pub process_result: u32,
    pub kind: GumpKind,
}

impl Gump {
    pub fn new(x: i32, y: i32, w: i32, h: i32, owner: ObjId, flags: GumpFlags, layer: i32) -> Self {
        Gump {
            id: UNASSIGNED,
            owner,
            parent: None,
            x,
            y,
            dims: Rect::new(0, 0, w, h),
            flags,
            layer,
            index: -1,
            shape: None,
            frame: 0,
            children: Vec::new(),
            focus_child: None,
            notifier: 0,
            process_result: 0,
            kind: GumpKind::Plain,
        }
    }

    pub fn with_kind(mut self, kind: GumpKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_index(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    pub fn with_shape(mut self, shape: ShapeRef, frame: u32) -> Self {
        self.shape = Some(shape);
        self.frame = frame;
        self
    }

    pub fn class_name(&self) -> &'static str {
        self.kind.class_name()
    }

    pub fn is_closing(&self) -> bool {
        self.flags.contains(GumpFlags::CLOSING)
    }

    pub fn is_draggable(&self) -> bool {
        self.flags.contains(GumpFlags::DRAGGABLE)
    }

    pub fn move_to(&mut self, x: i32, y: i32) {
        self.x = x;
        self.y = y;
    }

    pub fn hide(&mut self) {
        self.flags |= GumpFlags::HIDDEN;
    }

    pub fn unhide(&mut self) {
        self.flags.remove(GumpFlags::HIDDEN);
    }

    /// Sizes the gump to a frame, with the registration point at the origin.
    pub fn update_dims_from_frame(&mut self, frame: &ShapeFrame) {
        self.dims = frame.bounds();
    }
}
