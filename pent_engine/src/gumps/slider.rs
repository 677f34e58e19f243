use crate::context::GameContext;
use crate::gump::{ChildMessage, Gump, GumpFlags, GumpKind, LAYER_MODAL, LAYER_NORMAL};
use crate::gumps::{ButtonWidget, ModalGump};
use crate::input::Key;
use crate::object_manager::ObjId;
use crate::process::ProcId;
use crate::shapes::{ShapeRef, GUMP_SHAPES};

pub const SLIDER_OK_INDEX: i32 = 1;
pub const SLIDER_LEFT_INDEX: i32 = 2;
pub const SLIDER_RIGHT_INDEX: i32 = 3;
pub const SLIDER_WIDGET_INDEX: i32 = 4;

const BACKGROUND_SHAPE: ShapeRef = ShapeRef::new(GUMP_SHAPES, 41);
const OK_SHAPE: ShapeRef = ShapeRef::new(GUMP_SHAPES, 42);
const LEFT_SHAPE: ShapeRef = ShapeRef::new(GUMP_SHAPES, 43);
const RIGHT_SHAPE: ShapeRef = ShapeRef::new(GUMP_SHAPES, 44);
const WIDGET_SHAPE: ShapeRef = ShapeRef::new(GUMP_SHAPES, 45);

/// Track travelled by the sliding widget, in slider coordinates.
const TRACK_MIN: i32 = 16;
const TRACK_MAX: i32 = 140;
const TRACK_Y: i32 = 17;

const DEFAULT_WIDTH: i32 = 200;
const DEFAULT_HEIGHT: i32 = 60;

/// Modal value picker. Closing it leaves the value in the process result
/// and wakes `notify_process` with it.
#[derive(Debug, Clone)]
pub struct SliderGump {
    pub modal: ModalGump,
    pub min: i32,
    pub max: i32,
    pub value: i32,
    pub delta: i32,
    pub notify_process: ProcId,
}

impl SliderGump {
    /// An inverted range is swapped into order.
    pub fn gump(x: i32, y: i32, min: i32, max: i32, value: i32, delta: i32) -> Gump {
        let (min, max) = if min <= max { (min, max) } else { (max, min) };
        Gump::new(
            x,
            y,
            DEFAULT_WIDTH,
            DEFAULT_HEIGHT,
            0,
            GumpFlags::DONT_SAVE,
            LAYER_MODAL,
        )
        .with_shape(BACKGROUND_SHAPE, 0)
        .with_kind(GumpKind::Slider(SliderGump {
            modal: ModalGump::default(),
            min,
            max,
            value: value.clamp(min, max),
            delta: delta.max(1),
            notify_process: 0,
        }))
    }

    pub fn with_notify(gump: Gump, pid: ProcId) -> Gump {
        let mut gump = gump;
        if let GumpKind::Slider(slider) = &mut gump.kind {
            slider.notify_process = pid;
        }
        gump
    }

    fn track_position(&self) -> i32 {
        if self.max <= self.min {
            return TRACK_MIN;
        }
        let offset = (i64::from(self.value) - i64::from(self.min))
            * i64::from(TRACK_MAX - TRACK_MIN)
            / (i64::from(self.max) - i64::from(self.min));
        TRACK_MIN + offset as i32
    }

    fn set_value_from_track(&mut self, track_x: i32) {
        let (min, max) = (i64::from(self.min), i64::from(self.max));
        let track = i64::from(TRACK_MAX - TRACK_MIN);
        let travelled = (i64::from(track_x) - i64::from(TRACK_MIN)).clamp(0, track);
        let raw = travelled * (max - min) / track + min;
        let delta = i64::from(self.delta);
        self.value = (min + ((raw - min) / delta) * delta) as i32;
    }

    fn step(&mut self, up: bool) {
        self.value = if up {
            self.value.saturating_add(self.delta).min(self.max)
        } else {
            self.value.saturating_sub(self.delta).max(self.min)
        };
    }
}

/// Draggable knob of a slider.
pub fn sliding_widget(x: i32, y: i32, shape: Option<(ShapeRef, u32)>) -> Gump {
    let gump = Gump::new(x, y, 5, 5, 0, GumpFlags::DRAGGABLE, LAYER_NORMAL)
        .with_kind(GumpKind::SlidingWidget);
    match shape {
        Some((shape, frame)) => gump.with_shape(shape, frame),
        None => gump,
    }
}

impl GameContext {
    fn slider_mut(&mut self, id: ObjId) -> Option<&mut SliderGump> {
        match &mut self.objects.gump_mut(id)?.kind {
            GumpKind::Slider(slider) => Some(slider),
            _ => None,
        }
    }

    pub fn slider_value(&self, id: ObjId) -> Option<i32> {
        match &self.objects.gump(id)?.kind {
            GumpKind::Slider(slider) => Some(slider.value),
            _ => None,
        }
    }

    pub(crate) fn init_slider(&mut self, id: ObjId) {
        self.update_dims_from_shape(id);
        let buttons = [
            (SLIDER_OK_INDEX, OK_SHAPE, 158, 17),
            (SLIDER_LEFT_INDEX, LEFT_SHAPE, 55, 42),
            (SLIDER_RIGHT_INDEX, RIGHT_SHAPE, 98, 42),
        ];
        for (index, shape, x, y) in buttons {
            let button = ButtonWidget::gump(
                x,
                y,
                Some((shape, 0)),
                Some((shape, 1)),
                false,
                LAYER_NORMAL,
            )
            .with_index(index);
            self.init_gump(button, Some(id), false);
        }

        let Some(slider) = self.slider_mut(id) else { return };
        let x = slider.track_position();
        let widget = sliding_widget(x, TRACK_Y, Some((WIDGET_SHAPE, 0))).with_index(SLIDER_WIDGET_INDEX);
        let widget = self.init_gump(widget, Some(id), false);
        self.update_dims_from_shape(widget);
    }

    fn place_slider_widget(&mut self, id: ObjId) {
        let Some(x) = self.slider_mut(id).map(|s| s.track_position()) else {
            return;
        };
        if let Some(widget) = self.objects.find_child_by_index(id, SLIDER_WIDGET_INDEX) {
            self.objects.gump_at_mut(widget).move_to(x, TRACK_Y);
        }
    }

    fn step_slider(&mut self, id: ObjId, up: bool) {
        if let Some(slider) = self.slider_mut(id) {
            slider.step(up);
        }
        self.place_slider_widget(id);
    }

    pub(crate) fn slider_child_notify(&mut self, id: ObjId, child: ObjId, message: ChildMessage) {
        if message != ChildMessage::ButtonClick {
            return;
        }
        match self.objects.gump(child).map(|g| g.index) {
            Some(SLIDER_OK_INDEX) => self.close_gump(id, false),
            Some(SLIDER_LEFT_INDEX) => self.step_slider(id, false),
            Some(SLIDER_RIGHT_INDEX) => self.step_slider(id, true),
            _ => {}
        }
    }

    pub(crate) fn slider_key_down(&mut self, id: ObjId, key: Key) -> bool {
        match key {
            Key::Left => self.step_slider(id, false),
            Key::Right => self.step_slider(id, true),
            Key::Enter | Key::Escape => self.close_gump(id, false),
            _ => {}
        }
        true
    }

    /// Only the knob can be dragged, and only sideways.
    pub(crate) fn slider_start_dragging_child(&mut self, child: ObjId, px: i32) -> bool {
        let Some(gump) = self.objects.gump(child) else {
            return false;
        };
        if gump.index != SLIDER_WIDGET_INDEX {
            return false;
        }
        self.mouse.set_dragging_offset(px - gump.x, 0);
        true
    }

    pub(crate) fn slider_dragging_child(&mut self, id: ObjId, child: ObjId, px: i32) {
        if self.objects.gump(child).map(|g| g.index) != Some(SLIDER_WIDGET_INDEX) {
            return;
        }
        let (dx, _) = self.mouse.dragging_offset();
        if let Some(slider) = self.slider_mut(id) {
            slider.set_value_from_track(px - dx);
        }
        self.place_slider_widget(id);
    }

    pub(crate) fn close_slider(&mut self, id: ObjId) {
        let Some(slider) = self.slider_mut(id) else { return };
        let value = slider.value;
        let notify = slider.notify_process;
        self.objects.gump_at_mut(id).process_result = value as u32;
        let waiting = self
            .kernel
            .process(notify)
            .map(|p| !p.is_terminated())
            .unwrap_or(false);
        if waiting {
            self.wake_up(notify, value as u32);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slider(min: i32, max: i32, value: i32, delta: i32) -> SliderGump {
        match SliderGump::gump(0, 0, min, max, value, delta).kind {
            GumpKind::Slider(slider) => slider,
            _ => unreachable!(),
        }
    }

    #[test]
    fn track_ends_map_to_range_ends() {
        let mut s = slider(0, 100, 50, 1);
        assert_eq!(s.track_position(), TRACK_MIN + 62);
        s.set_value_from_track(TRACK_MIN - 30);
        assert_eq!(s.value, 0);
        s.set_value_from_track(TRACK_MAX + 30);
        assert_eq!(s.value, 100);
    }

    #[test]
    fn values_snap_to_delta() {
        let mut s = slider(10, 110, 10, 25);
        s.set_value_from_track(TRACK_MIN + 70);
        assert_eq!(s.value, 60);
        s.step(true);
        assert_eq!(s.value, 85);
        s.step(true);
        s.step(true);
        assert_eq!(s.value, 110);
        s.step(false);
        assert_eq!(s.value, 85);
    }

    #[test]
    fn inverted_range_is_put_in_order() {
        let s = slider(100, 0, 150, 1);
        assert_eq!((s.min, s.max, s.value), (0, 100, 100));
        assert_eq!(s.track_position(), TRACK_MAX);
    }

    #[test]
    fn full_i32_range_does_not_overflow() {
        let mut s = slider(i32::MIN, i32::MAX, i32::MAX, 1);
        assert_eq!(s.track_position(), TRACK_MAX);
        s.set_value_from_track(TRACK_MAX);
        assert_eq!(s.value, i32::MAX);
        s.set_value_from_track(TRACK_MIN);
        assert_eq!(s.value, i32::MIN);
        s.set_value_from_track(i32::MAX);
        assert_eq!(s.value, i32::MAX);
        s.step(false);
        assert_eq!(s.value, i32::MIN);
    }
}
