use pent_stream::StreamError;
use thiserror::Error;

use crate::object_manager::ObjId;
use crate::process::ProcId;

#[derive(Debug, Error)]
pub enum SaveError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("{class} {id} is transient and cannot be saved")]
    TransientObject { class: &'static str, id: u16 },
    #[error("gump {id} has {count} children to save, more than a record holds")]
    TooManyChildren { id: ObjId, count: usize },
    #[error("a modal gump is open")]
    ModalOpen,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error("unknown object class `{0}`")]
    UnknownClass(String),
    #[error("unknown process class `{0}`")]
    UnknownProcessClass(String),
    #[error("object id pool is full after reconstruction")]
    PoolFull,
    #[error("id pool covers {begin}..={end}, expected {expected_begin}..={expected_end}")]
    PoolRange {
        begin: u16,
        end: u16,
        expected_begin: u16,
        expected_end: u16,
    },
    #[error("id {0} is stored in the save but not reserved by its pool")]
    IdNotReserved(u16),
    #[error("id {0} is occupied twice")]
    DuplicateId(u16),
    #[error("pid {0} is stored in the save but not reserved by the process pool")]
    PidNotReserved(ProcId),
    #[error("shape {flex}:{shape} does not exist")]
    MissingShape { flex: u16, shape: u32 },
    #[error("gump {id} stores {count} children")]
    TooManyChildren { id: ObjId, count: u32 },
    #[error("child record `{0}` of a gump is not a gump")]
    ChildNotGump(String),
    #[error("content record `{0}` of an item is not an item")]
    ContentNotItem(String),
    #[error("invalid {field} value {value} in {class} record")]
    InvalidField {
        class: &'static str,
        field: &'static str,
        value: u32,
    },
}
