//! Gump records in the object stream.
//!
//! A record is the common gump fields, a payload for the concrete kind, then
//! the saved children inline. Runtime-only kinds refuse to be written.

use pent_stream::{SaveReader, SaveWriter};

use crate::error::{LoadError, SaveError};
use crate::geometry::Rect;
use crate::gump::{Gump, GumpFlags, GumpKind};
use crate::gumps::{BarkGump, ButtonWidget, ContainerGump, ItemRelativeGump};
use crate::object_manager::{LoadEnv, ObjId, Object, ObjectManager};
use crate::shapes::ShapeRef;

/// Upper bound on children stored under one gump.
pub const MAX_CHILDREN: usize = 4096;

pub(crate) fn register_loaders(manager: &mut ObjectManager) {
    manager.add_object_loader("Gump", load_plain);
    manager.add_object_loader("ItemRelativeGump", load_item_relative);
    manager.add_object_loader("BarkGump", load_bark);
    manager.add_object_loader("ContainerGump", load_container);
    manager.add_object_loader("ButtonWidget", load_button);
    manager.add_object_loader("SlidingWidget", load_sliding_widget);
}

fn write_rect(writer: &mut SaveWriter, rect: Rect) {
    writer.write_i32(rect.x);
    writer.write_i32(rect.y);
    writer.write_i32(rect.w);
    writer.write_i32(rect.h);
}

fn read_rect(reader: &mut SaveReader<'_>) -> Result<Rect, LoadError> {
    Ok(Rect::new(
        reader.read_i32()?,
        reader.read_i32()?,
        reader.read_i32()?,
        reader.read_i32()?,
    ))
}

fn write_frame_ref(writer: &mut SaveWriter, frame: Option<(ShapeRef, u32)>) {
    let (shape, frame) = frame.unwrap_or((ShapeRef::new(0, 0), 0));
    writer.write_u16(shape.flex);
    writer.write_u32(shape.shape);
    writer.write_u32(frame);
}

/// Shape and frame, with flex 0 standing for none. The shape has to exist
/// in the archive the game is loading against.
fn read_frame_ref(
    reader: &mut SaveReader<'_>,
    env: &LoadEnv<'_>,
) -> Result<Option<(ShapeRef, u32)>, LoadError> {
    let flex = reader.read_u16()?;
    let shape = reader.read_u32()?;
    let frame = reader.read_u32()?;
    if flex == 0 {
        return Ok(None);
    }
    let shape = ShapeRef::new(flex, shape);
    if env.shapes.get_shape(shape).is_none() {
        return Err(LoadError::MissingShape {
            flex,
            shape: shape.shape,
        });
    }
    Ok(Some((shape, frame)))
}

impl ObjectManager {
    /// Writes a gump record with its saved subtree.
    pub(crate) fn save_gump(&self, id: ObjId, writer: &mut SaveWriter) -> Result<(), SaveError> {
        let Some(gump) = self.gump(id) else {
            return Ok(());
        };
        if gump.kind.is_transient() {
            return Err(SaveError::TransientObject {
                class: gump.class_name(),
                id,
            });
        }
        let children: Vec<ObjId> = gump
            .children
            .iter()
            .copied()
            .filter(|child| self.must_save(*child, false))
            .collect();
        if children.len() > MAX_CHILDREN {
            return Err(SaveError::TooManyChildren {
                id,
                count: children.len(),
            });
        }

        writer.write_class_header(gump.class_name())?;
        writer.write_u16(gump.id);
        writer.write_u16(gump.owner);
        writer.write_i32(gump.x);
        writer.write_i32(gump.y);
        write_rect(writer, gump.dims);
        writer.write_u32(gump.flags.bits());
        writer.write_i32(gump.layer);
        writer.write_i32(gump.index);
        write_frame_ref(writer, gump.shape.map(|shape| (shape, gump.frame)));
        writer.write_u16(gump.focus_child.unwrap_or(0));
        writer.write_u16(gump.notifier);
        writer.write_u32(gump.process_result);

        match &gump.kind {
            GumpKind::Bark(bark) => {
                writer.write_u32(bark.counter);
                writer.write_str(&bark.text)?;
            }
            GumpKind::Container(container) => write_rect(writer, container.item_area),
            GumpKind::Button(button) => {
                write_frame_ref(writer, button.up);
                write_frame_ref(writer, button.down);
                writer.write_bool(button.mouse_over);
            }
            _ => {}
        }

        writer.write_u32(children.len() as u32);
        for child in children {
            self.save_gump(child, writer)?;
        }
        Ok(())
    }
}

/// Kind payload read after the common fields.
enum KindRecord {
    Plain,
    ItemRelative,
    Bark,
    Container,
    Button,
    SlidingWidget,
}

fn load_plain(
    manager: &mut ObjectManager,
    reader: &mut SaveReader<'_>,
    env: &LoadEnv<'_>,
) -> Result<ObjId, LoadError> {
    load_gump(manager, reader, env, KindRecord::Plain)
}

fn load_item_relative(
    manager: &mut ObjectManager,
    reader: &mut SaveReader<'_>,
    env: &LoadEnv<'_>,
) -> Result<ObjId, LoadError> {
    load_gump(manager, reader, env, KindRecord::ItemRelative)
}

fn load_bark(
    manager: &mut ObjectManager,
    reader: &mut SaveReader<'_>,
    env: &LoadEnv<'_>,
) -> Result<ObjId, LoadError> {
    load_gump(manager, reader, env, KindRecord::Bark)
}

fn load_container(
    manager: &mut ObjectManager,
    reader: &mut SaveReader<'_>,
    env: &LoadEnv<'_>,
) -> Result<ObjId, LoadError> {
    load_gump(manager, reader, env, KindRecord::Container)
}

fn load_button(
    manager: &mut ObjectManager,
    reader: &mut SaveReader<'_>,
    env: &LoadEnv<'_>,
) -> Result<ObjId, LoadError> {
    load_gump(manager, reader, env, KindRecord::Button)
}

fn load_sliding_widget(
    manager: &mut ObjectManager,
    reader: &mut SaveReader<'_>,
    env: &LoadEnv<'_>,
) -> Result<ObjId, LoadError> {
    load_gump(manager, reader, env, KindRecord::SlidingWidget)
}

fn load_gump(
    manager: &mut ObjectManager,
    reader: &mut SaveReader<'_>,
    env: &LoadEnv<'_>,
    record: KindRecord,
) -> Result<ObjId, LoadError> {
    let id = reader.read_u16()?;
    let owner = reader.read_u16()?;
    let x = reader.read_i32()?;
    let y = reader.read_i32()?;
    let dims = read_rect(reader)?;
    let bits = reader.read_u32()?;
    let flags = GumpFlags::from_bits(bits).ok_or(LoadError::InvalidField {
        class: "Gump",
        field: "flags",
        value: bits,
    })?;
    let layer = reader.read_i32()?;
    let index = reader.read_i32()?;
    let shape = read_frame_ref(reader, env)?;
    let focus = reader.read_u16()?;
    let notifier = reader.read_u16()?;
    let process_result = reader.read_u32()?;

    let kind = match record {
        KindRecord::Plain => GumpKind::Plain,
        KindRecord::ItemRelative => GumpKind::ItemRelative(ItemRelativeGump::default()),
        KindRecord::Bark => {
            let counter = reader.read_u32()?;
            let text = reader.read_str()?;
            GumpKind::Bark(BarkGump {
                rel: ItemRelativeGump::default(),
                text,
                counter,
            })
        }
        KindRecord::Container => GumpKind::Container(ContainerGump {
            rel: ItemRelativeGump::default(),
            item_area: read_rect(reader)?,
        }),
        KindRecord::Button => {
            let up = read_frame_ref(reader, env)?;
            let down = read_frame_ref(reader, env)?;
            let mouse_over = reader.read_bool()?;
            GumpKind::Button(ButtonWidget {
                up,
                down,
                mouse_over,
            })
        }
        KindRecord::SlidingWidget => GumpKind::SlidingWidget,
    };

    let mut gump = Gump::new(x, y, 0, 0, owner, flags, layer)
        .with_kind(kind)
        .with_index(index);
    gump.id = id;
    gump.dims = dims;
    if let Some((shape, frame)) = shape {
        gump = gump.with_shape(shape, frame);
    }
    gump.notifier = notifier;
    gump.process_result = process_result;

    let count = reader.read_u32()?;
    if count as usize > MAX_CHILDREN {
        return Err(LoadError::TooManyChildren { id, count });
    }
    for _ in 0..count {
        let class_name = reader.read_class_name()?.unwrap_or_default();
        let child = manager.load_object(reader, &class_name, env)?;
        let Some(loaded) = manager.gump_mut(child) else {
            return Err(LoadError::ChildNotGump(class_name));
        };
        loaded.parent = Some(id);
        gump.children.push(child);
    }
    gump.focus_child = Some(focus).filter(|f| *f != 0 && gump.children.contains(f));

    log::trace!("loaded {} {id} with {count} children", gump.class_name());
    manager.place_loaded(Object::Gump(gump))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gump::LAYER_NORMAL;
    use crate::gumps::ModalGump;
    use crate::shapes::{Shape, ShapeFrame, ShapeLibrary, GUMP_SHAPES};

    const KNOB: ShapeRef = ShapeRef::new(GUMP_SHAPES, 11);

    fn library() -> ShapeLibrary {
        ShapeLibrary::new()
            .with_shape(KNOB, Shape::new(vec![ShapeFrame::solid(6, 6, 0xAAAAAA)]))
    }

    fn link(om: &mut ObjectManager, parent: ObjId, child: ObjId) {
        om.gump_at_mut(child).parent = Some(parent);
        om.gump_at_mut(parent).children.push(child);
    }

    fn save_all(om: &ObjectManager) -> Result<Vec<u8>, SaveError> {
        let mut writer = SaveWriter::new();
        om.save(&mut writer)?;
        Ok(writer.into_bytes())
    }

    #[test]
    fn panel_with_button_survives_a_reload() {
        let mut om = ObjectManager::new();
        let panel = om.assign_obj_id(
            Object::Gump(Gump::new(12, 34, 80, 60, 0, GumpFlags::DRAGGABLE, LAYER_NORMAL)),
            None,
        );
        let button = om.assign_obj_id(
            Object::Gump(ButtonWidget::gump(4, 5, Some((KNOB, 0)), None, true, LAYER_NORMAL)),
            None,
        );
        let skipped = om.assign_obj_id(
            Object::Gump(Gump::new(0, 0, 1, 1, 0, GumpFlags::DONT_SAVE, LAYER_NORMAL)),
            None,
        );
        link(&mut om, panel, button);
        link(&mut om, panel, skipped);
        om.gump_at_mut(panel).focus_child = Some(button);

        let bytes = save_all(&om).expect("save");
        let shapes = library();
        let env = LoadEnv {
            version: 1,
            shapes: &shapes,
        };
        let mut restored = ObjectManager::new();
        let top = restored
            .load(&mut SaveReader::new(&bytes), &env)
            .expect("load");

        assert_eq!(top, vec![panel]);
        let loaded = restored.gump_at(panel);
        assert_eq!((loaded.x, loaded.y), (12, 34));
        assert_eq!(loaded.dims, Rect::new(0, 0, 80, 60));
        assert!(loaded.is_draggable());
        assert_eq!(loaded.children, vec![button]);
        assert_eq!(loaded.focus_child, Some(button));

        let widget = restored.gump_at(button);
        assert_eq!(widget.parent, Some(panel));
        match &widget.kind {
            GumpKind::Button(b) => {
                assert_eq!(b.up, Some((KNOB, 0)));
                assert!(b.down.is_none());
                assert!(b.mouse_over);
            }
            other => panic!("expected a button, got {other:?}"),
        }
        assert!(restored.gump(skipped).is_none());
        assert!(!restored.is_id_used(skipped));
    }

    #[test]
    fn runtime_only_gumps_refuse_to_save() {
        let mut om = ObjectManager::new();
        let mut gump = ModalGump::gump(0, 0, 10, 10);
        gump.flags.remove(GumpFlags::DONT_SAVE);
        let modal = om.assign_obj_id(Object::Gump(gump), None);
        let err = save_all(&om).expect_err("modal is transient");
        assert!(matches!(
            err,
            SaveError::TransientObject { class: "ModalGump", id } if id == modal
        ));
    }

    #[test]
    fn missing_artwork_fails_the_load() {
        let mut om = ObjectManager::new();
        om.assign_obj_id(
            Object::Gump(
                Gump::new(0, 0, 6, 6, 0, GumpFlags::empty(), LAYER_NORMAL).with_shape(KNOB, 0),
            ),
            None,
        );
        let bytes = save_all(&om).expect("save");
        let empty = ShapeLibrary::new();
        let env = LoadEnv {
            version: 1,
            shapes: &empty,
        };
        let err = ObjectManager::new()
            .load(&mut SaveReader::new(&bytes), &env)
            .expect_err("shape is gone");
        assert!(matches!(err, LoadError::MissingShape { flex: GUMP_SHAPES, shape: 11 }));
    }
}
