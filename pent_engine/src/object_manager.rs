use std::collections::BTreeMap;

use pent_stream::{SaveReader, SaveWriter};
use serde::Serialize;

use crate::error::{LoadError, SaveError};
use crate::gump::{Gump, GumpFlags};
use crate::idman::IdMan;
use crate::item::Item;
use crate::shapes::ShapeArchive;

/// Object handle.
pub type ObjId = u16;

/// Id carried by an object that is not registered.
pub const UNASSIGNED: ObjId = 0xFFFF;
pub const MAX_ACTOR_ID: ObjId = 255;
pub const FIRST_OBJ_ID: ObjId = 256;
pub const MAX_OBJ_ID: ObjId = 32766;
/// Held back for a special-case bark.
pub const RESERVED_SPECIAL_ID: ObjId = 666;
/// Lowest id reclaimed by the post-load sweep.
pub const SWEEP_FLOOR: ObjId = 1024;

const TABLE_SIZE: usize = 65536;

#[derive(Debug)]
pub enum Object {
    Item(Item),
    Gump(Gump),
}

impl Object {
    pub fn id(&self) -> ObjId {
        match self {
            Object::Item(item) => item.id,
            Object::Gump(gump) => gump.id,
        }
    }

    fn set_id(&mut self, id: ObjId) {
        match self {
            Object::Item(item) => item.id = id,
            Object::Gump(gump) => gump.id = id,
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            Object::Item(_) => "Item",
            Object::Gump(gump) => gump.class_name(),
        }
    }
}

/// Context handed to object loaders.
pub struct LoadEnv<'a> {
    pub version: u32,
    pub shapes: &'a dyn ShapeArchive,
}

/// Restores one record of a class and registers it. Returns the new id.
pub type ObjectLoader =
    fn(&mut ObjectManager, &mut SaveReader<'_>, &LoadEnv<'_>) -> Result<ObjId, LoadError>;

#[derive(Debug, Clone, Serialize)]
pub struct ObjectInfo {
    pub id: ObjId,
    pub class: &'static str,
    pub parent: Option<ObjId>,
    pub children: usize,
}

/// Registry of live objects, indexed directly by id.
pub struct ObjectManager {
    objects: Vec<Option<Box<Object>>>,
    obj_ids: IdMan,
    actor_ids: IdMan,
    loaders: BTreeMap<String, ObjectLoader>,
}

impl Default for ObjectManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectManager {
    pub fn new() -> Self {
        let mut objects = Vec::with_capacity(TABLE_SIZE);
        objects.resize_with(TABLE_SIZE, || None);
        let mut manager = ObjectManager {
            objects,
            obj_ids: IdMan::new(FIRST_OBJ_ID, MAX_OBJ_ID),
            actor_ids: IdMan::new(1, MAX_ACTOR_ID),
            loaders: BTreeMap::new(),
        };
        manager.obj_ids.reserve_id(RESERVED_SPECIAL_ID);
        crate::gump::persist::register_loaders(&mut manager);
        crate::item::register_loaders(&mut manager);
        manager
    }

    /// Drops every object and reinitialises both pools.
    pub fn reset(&mut self) {
        let live = self.objects.iter().filter(|o| o.is_some()).count();
        log::debug!("object manager reset ({live} objects dropped)");
        self.objects.iter_mut().for_each(|slot| *slot = None);
        self.obj_ids.clear_all();
        self.actor_ids.clear_all();
        self.obj_ids.reserve_id(RESERVED_SPECIAL_ID);
    }

    pub fn add_object_loader(&mut self, class_name: &str, loader: ObjectLoader) {
        self.loaders.insert(class_name.to_string(), loader);
    }

    /// Registers an object in the general pool, taking a fresh id or the
    /// requested one. Returns 0 when no id could be had.
    pub fn assign_obj_id(&mut self, object: Object, new_id: Option<ObjId>) -> ObjId {
        let id = match new_id {
            None => self.obj_ids.get_new_id(),
            Some(id) if self.obj_ids.reserve_id(id) => id,
            Some(_) => 0,
        };
        self.store(object, id)
    }

    /// Registers an actor in the actor pool.
    pub fn assign_actor_obj_id(&mut self, object: Object, new_id: Option<ObjId>) -> ObjId {
        let id = match new_id {
            None => self.actor_ids.get_new_id(),
            Some(id) if self.actor_ids.reserve_id(id) => id,
            Some(_) => 0,
        };
        self.store(object, id)
    }

    fn store(&mut self, mut object: Object, id: ObjId) -> ObjId {
        if id == 0 {
            log::warn!("no object id available for {}", object.class_name());
            return 0;
        }
        object.set_id(id);
        self.objects[usize::from(id)] = Some(Box::new(object));
        id
    }

    /// Marks an id used without attaching an object.
    pub fn reserve_obj_id(&mut self, id: ObjId) -> bool {
        if id >= FIRST_OBJ_ID {
            self.obj_ids.reserve_id(id)
        } else {
            self.actor_ids.reserve_id(id)
        }
    }

    /// Unregisters an id, handing back whatever object held it.
    pub fn clear_obj_id(&mut self, id: ObjId) -> Option<Box<Object>> {
        if id >= FIRST_OBJ_ID {
            self.obj_ids.clear_id(id);
        } else {
            self.actor_ids.clear_id(id);
        }
        let mut object = self.objects.get_mut(usize::from(id))?.take()?;
        object.set_id(UNASSIGNED);
        Some(object)
    }

    pub fn is_id_used(&self, id: ObjId) -> bool {
        if id >= FIRST_OBJ_ID {
            self.obj_ids.is_id_used(id)
        } else {
            self.actor_ids.is_id_used(id)
        }
    }

    pub fn get_object(&self, id: ObjId) -> Option<&Object> {
        self.objects.get(usize::from(id))?.as_deref()
    }

    pub fn get_object_mut(&mut self, id: ObjId) -> Option<&mut Object> {
        self.objects.get_mut(usize::from(id))?.as_deref_mut()
    }

    pub fn gump(&self, id: ObjId) -> Option<&Gump> {
        match self.get_object(id)? {
            Object::Gump(gump) => Some(gump),
            Object::Item(_) => None,
        }
    }

    pub fn gump_mut(&mut self, id: ObjId) -> Option<&mut Gump> {
        match self.get_object_mut(id)? {
            Object::Gump(gump) => Some(gump),
            Object::Item(_) => None,
        }
    }

    /// Gump behind a handle the caller knows is live.
    pub fn gump_at(&self, id: ObjId) -> &Gump {
        match self.gump(id) {
            Some(gump) => gump,
            None => panic!("gump {id} is not registered"),
        }
    }

    pub fn gump_at_mut(&mut self, id: ObjId) -> &mut Gump {
        match self.gump_mut(id) {
            Some(gump) => gump,
            None => panic!("gump {id} is not registered"),
        }
    }

    pub fn item(&self, id: ObjId) -> Option<&Item> {
        match self.get_object(id)? {
            Object::Item(item) => Some(item),
            Object::Gump(_) => None,
        }
    }

    pub fn item_mut(&mut self, id: ObjId) -> Option<&mut Item> {
        match self.get_object_mut(id)? {
            Object::Item(item) => Some(item),
            Object::Gump(_) => None,
        }
    }

    /// Live objects in id order.
    pub fn iter(&self) -> impl Iterator<Item = (ObjId, &Object)> + '_ {
        self.objects
            .iter()
            .enumerate()
            .filter_map(|(id, slot)| slot.as_deref().map(|object| (id as ObjId, object)))
    }

    pub fn object_count(&self) -> usize {
        self.iter().count()
    }

    /// Live object count per class name.
    pub fn object_types(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for (_, object) in self.iter() {
            *counts.entry(object.class_name()).or_insert(0) += 1;
        }
        counts
    }

    pub fn object_info(&self, id: ObjId) -> Option<ObjectInfo> {
        let object = self.get_object(id)?;
        let (parent, children) = match object {
            Object::Gump(gump) => (gump.parent, gump.children.len()),
            Object::Item(item) => (item.parent, item.contents.len()),
        };
        Some(ObjectInfo {
            id,
            class: object.class_name(),
            parent,
            children,
        })
    }

    /// Whether the gump ends up in a save, either as a top-level record or
    /// inline under a saved ancestor.
    fn gump_is_saved(&self, id: ObjId) -> bool {
        if self.must_save(id, true) {
            return true;
        }
        let gump = self.gump_at(id);
        match gump.parent {
            Some(parent) if self.must_save(id, false) => {
                let parent_core = self.gump_at(parent).flags.contains(GumpFlags::CORE_GUMP);
                !parent_core && self.gump_is_saved(parent)
            }
            _ => false,
        }
    }

    /// Writes both id pools, then every top-level object record, then a
    /// terminator. Items inside containers and gumps under non-core parents
    /// are written by their owners. Ids of gumps that are not written at all
    /// are released in the saved pool so they do not leak across a reload.
    pub fn save(&self, writer: &mut SaveWriter) -> Result<(), SaveError> {
        let mut pool = self.obj_ids.clone();
        for (id, object) in self.iter() {
            if let Object::Gump(gump) = object {
                if !gump.flags.contains(GumpFlags::CORE_GUMP) && !self.gump_is_saved(id) {
                    pool.clear_id(id);
                }
            }
        }
        pool.save(writer);
        self.actor_ids.save(writer);

        for (id, object) in self.iter() {
            let top_level = match object {
                Object::Item(item) => item.parent.is_none(),
                Object::Gump(_) => self.must_save(id, true),
            };
            if top_level {
                self.save_object(id, writer)?;
            }
        }
        writer.write_terminator();
        Ok(())
    }

    pub(crate) fn save_object(&self, id: ObjId, writer: &mut SaveWriter) -> Result<(), SaveError> {
        match self.get_object(id) {
            Some(Object::Item(_)) => self.save_item(id, writer),
            Some(Object::Gump(_)) => self.save_gump(id, writer),
            None => Ok(()),
        }
    }

    /// Restores pools and records. Returns the gumps that came back without
    /// a parent, for the caller to attach. Any failure aborts the whole load.
    pub fn load(
        &mut self,
        reader: &mut SaveReader<'_>,
        env: &LoadEnv<'_>,
    ) -> Result<Vec<ObjId>, LoadError> {
        self.obj_ids.load(reader)?;
        self.actor_ids.load(reader)?;
        if self.obj_ids.is_full() {
            return Err(LoadError::PoolFull);
        }

        let mut top_level = Vec::new();
        while let Some(class_name) = reader.read_class_name()? {
            let id = self.load_object(reader, &class_name, env)?;
            if self.gump(id).map(|g| g.parent.is_none()).unwrap_or(false) {
                top_level.push(id);
            }
        }

        let mut reclaimed = 0;
        for id in SWEEP_FLOOR..=MAX_OBJ_ID {
            if self.obj_ids.is_id_used(id) && self.objects[usize::from(id)].is_none() {
                self.obj_ids.clear_id(id);
                reclaimed += 1;
            }
        }
        if reclaimed > 0 {
            log::warn!("reclaimed {reclaimed} object ids with no object after load");
        }
        Ok(top_level)
    }

    /// Dispatches one record to the loader registered for its class.
    pub(crate) fn load_object(
        &mut self,
        reader: &mut SaveReader<'_>,
        class_name: &str,
        env: &LoadEnv<'_>,
    ) -> Result<ObjId, LoadError> {
        let loader = *self
            .loaders
            .get(class_name)
            .ok_or_else(|| LoadError::UnknownClass(class_name.to_string()))?;
        loader(self, reader, env)
    }

    /// Stores a restored object under the id it was saved with. The id must
    /// already be marked used by the restored pool.
    pub(crate) fn place_loaded(&mut self, object: Object) -> Result<ObjId, LoadError> {
        let id = object.id();
        if !self.is_id_used(id) {
            return Err(LoadError::IdNotReserved(id));
        }
        let slot = &mut self.objects[usize::from(id)];
        if slot.is_some() {
            return Err(LoadError::DuplicateId(id));
        }
        *slot = Some(Box::new(object));
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gump::LAYER_NORMAL;
    use crate::shapes::{ShapeRef, MAIN_SHAPES};

    fn plain() -> Object {
        Object::Gump(Gump::new(0, 0, 10, 10, 0, GumpFlags::empty(), LAYER_NORMAL))
    }

    #[test]
    fn ids_come_from_the_partitioned_pools() {
        let mut om = ObjectManager::new();
        let gump = om.assign_obj_id(plain(), None);
        assert!((FIRST_OBJ_ID..=MAX_OBJ_ID).contains(&gump));
        let item = Item::new(ShapeRef::new(MAIN_SHAPES, 1), 0);
        let actor = om.assign_actor_obj_id(Object::Item(item), None);
        assert!((1..=MAX_ACTOR_ID).contains(&actor));
        assert_eq!(om.gump(gump).map(|g| g.id), Some(gump));
    }

    #[test]
    fn cleared_ids_resolve_to_nothing() {
        let mut om = ObjectManager::new();
        let id = om.assign_obj_id(plain(), None);
        let object = om.clear_obj_id(id).expect("object was registered");
        assert_eq!(object.id(), UNASSIGNED);
        assert!(om.get_object(id).is_none());
        assert!(!om.is_id_used(id));
    }

    #[test]
    fn requested_ids_must_be_free() {
        let mut om = ObjectManager::new();
        assert_eq!(om.assign_obj_id(plain(), Some(RESERVED_SPECIAL_ID)), 0);
        assert_eq!(om.assign_obj_id(plain(), Some(700)), 700);
        assert_eq!(om.assign_obj_id(plain(), Some(700)), 0);
        assert_eq!(om.object_types().get("Gump"), Some(&1));
    }

    #[test]
    fn reset_keeps_only_the_special_reservation() {
        let mut om = ObjectManager::new();
        om.assign_obj_id(plain(), None);
        om.reset();
        assert_eq!(om.object_count(), 0);
        assert!(om.is_id_used(RESERVED_SPECIAL_ID));
        assert!(!om.is_id_used(FIRST_OBJ_ID));
    }

    #[test]
    fn unknown_class_aborts_the_load() {
        let mut writer = SaveWriter::new();
        IdMan::new(FIRST_OBJ_ID, MAX_OBJ_ID).save(&mut writer);
        IdMan::new(1, MAX_ACTOR_ID).save(&mut writer);
        writer.write_class_header("Mystery").expect("header");
        writer.write_terminator();
        let bytes = writer.into_bytes();

        let mut om = ObjectManager::new();
        let shapes = crate::shapes::ShapeLibrary::new();
        let env = LoadEnv {
            version: 1,
            shapes: &shapes,
        };
        let err = om
            .load(&mut SaveReader::new(&bytes), &env)
            .expect_err("unknown class fails");
        assert!(matches!(err, LoadError::UnknownClass(name) if name == "Mystery"));
    }

    #[test]
    fn sweep_frees_high_ids_without_objects() {
        let mut pool = IdMan::new(FIRST_OBJ_ID, MAX_OBJ_ID);
        pool.reserve_id(300);
        pool.reserve_id(2000);
        let mut writer = SaveWriter::new();
        pool.save(&mut writer);
        IdMan::new(1, MAX_ACTOR_ID).save(&mut writer);
        writer.write_terminator();
        let bytes = writer.into_bytes();

        let mut om = ObjectManager::new();
        let shapes = crate::shapes::ShapeLibrary::new();
        let env = LoadEnv {
            version: 1,
            shapes: &shapes,
        };
        om.load(&mut SaveReader::new(&bytes), &env).expect("load");
        assert!(om.is_id_used(300));
        assert!(!om.is_id_used(2000));
    }
}
