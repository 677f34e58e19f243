use pent_stream::{SaveReader, SaveWriter};

use crate::context::GameContext;
use crate::error::{LoadError, SaveError};
use crate::object_manager::{LoadEnv, ObjId, Object, ObjectManager, UNASSIGNED};
use crate::shapes::ShapeRef;

/// Minimal world object: a shape at a location, optionally inside a container.
#[derive(Debug, Clone)]
pub struct Item {
    pub id: ObjId,
    pub shape: ShapeRef,
    pub frame: u32,
    pub x: i32,
    pub y: i32,
    pub z: i32,
    /// Position inside the parent's container gump.
    pub gump_x: i32,
    pub gump_y: i32,
    pub parent: Option<ObjId>,
    /// Items held by this one, painted front to back in this order.
    pub contents: Vec<ObjId>,
    /// Gump opened for this item, if any.
    pub gump: Option<ObjId>,
}

impl Item {
    pub fn new(shape: ShapeRef, frame: u32) -> Self {
        Item {
            id: UNASSIGNED,
            shape,
            frame,
            x: 0,
            y: 0,
            z: 0,
            gump_x: 0,
            gump_y: 0,
            parent: None,
            contents: Vec::new(),
            gump: None,
        }
    }

    pub fn at(mut self, x: i32, y: i32, z: i32) -> Self {
        self.x = x;
        self.y = y;
        self.z = z;
        self
    }
}

pub(crate) fn register_loaders(manager: &mut ObjectManager) {
    manager.add_object_loader("Item", load_item);
}

impl ObjectManager {
    pub fn add_item(&mut self, item: Item) -> ObjId {
        self.assign_obj_id(Object::Item(item), None)
    }

    /// Moves an item into a container at a container-gump position.
    pub fn move_to_container(&mut self, id: ObjId, container: ObjId, gump_x: i32, gump_y: i32) {
        if id == container || self.item(container).is_none() {
            return;
        }
        self.detach_item(id);
        let Some(item) = self.item_mut(id) else { return };
        item.parent = Some(container);
        item.gump_x = gump_x;
        item.gump_y = gump_y;
        if let Some(parent) = self.item_mut(container) {
            parent.contents.push(id);
        }
    }

    /// Takes an item out of its container, leaving it in the world.
    pub fn detach_item(&mut self, id: ObjId) {
        let Some(parent) = self.item(id).and_then(|item| item.parent) else {
            return;
        };
        if let Some(container) = self.item_mut(parent) {
            container.contents.retain(|c| *c != id);
        }
        if let Some(item) = self.item_mut(id) {
            item.parent = None;
        }
    }

    pub(crate) fn save_item(&self, id: ObjId, writer: &mut SaveWriter) -> Result<(), SaveError> {
        let Some(item) = self.item(id) else {
            return Ok(());
        };
        writer.write_class_header("Item")?;
        writer.write_u16(item.id);
        writer.write_u16(item.shape.flex);
        writer.write_u32(item.shape.shape);
        writer.write_u32(item.frame);
        writer.write_i32(item.x);
        writer.write_i32(item.y);
        writer.write_i32(item.z);
        writer.write_i32(item.gump_x);
        writer.write_i32(item.gump_y);
        writer.write_u16(item.gump.unwrap_or(0));
        writer.write_u32(item.contents.len() as u32);
        for child in &item.contents {
            self.save_item(*child, writer)?;
        }
        Ok(())
    }
}

fn load_item(
    manager: &mut ObjectManager,
    reader: &mut SaveReader<'_>,
    env: &LoadEnv<'_>,
) -> Result<ObjId, LoadError> {
    let id = reader.read_u16()?;
    let flex = reader.read_u16()?;
    let shape = ShapeRef::new(flex, reader.read_u32()?);
    if env.shapes.get_shape(shape).is_none() {
        return Err(LoadError::MissingShape {
            flex,
            shape: shape.shape,
        });
    }
    let mut item = Item::new(shape, reader.read_u32()?);
    item.id = id;
    item.x = reader.read_i32()?;
    item.y = reader.read_i32()?;
    item.z = reader.read_i32()?;
    item.gump_x = reader.read_i32()?;
    item.gump_y = reader.read_i32()?;
    item.gump = Some(reader.read_u16()?).filter(|g| *g != 0);

    let count = reader.read_u32()?;
    for _ in 0..count {
        let class_name = reader.read_class_name()?.unwrap_or_default();
        let child = manager.load_object(reader, &class_name, env)?;
        let Some(content) = manager.item_mut(child) else {
            return Err(LoadError::ContentNotItem(class_name));
        };
        content.parent = Some(id);
        item.contents.push(child);
    }
    manager.place_loaded(Object::Item(item))
}

impl GameContext {
    /// Removes an item and everything inside it. Gumps opened for these
    /// items close through their notifier processes.
    pub fn destroy_item(&mut self, id: ObjId) {
        let Some(item) = self.objects.item(id) else {
            return;
        };
        let contents = item.contents.clone();
        let gump = item.gump;
        for child in contents {
            self.destroy_item(child);
        }
        if let Some(gump) = gump {
            self.close_gump(gump, false);
        }
        self.kill_processes(id, None, false);
        self.objects.detach_item(id);
        self.objects.clear_obj_id(id);
        log::debug!("item {id} destroyed");
    }
}
