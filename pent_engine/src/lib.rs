//! Retained-mode gump UI, cooperative process kernel and savegame core of a
//! tile-based RPG engine.
//!
//! Everything hangs off one [`GameContext`]: the object registry that owns
//! gumps and items, the kernel that owns processes, and the narrow traits
//! for shapes, rendering and audio.

pub mod audio;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod geometry;
pub mod gump;
pub mod gumps;
pub mod idman;
pub mod input;
pub mod item;
pub mod kernel;
pub mod object_manager;
pub mod palette;
pub mod process;
pub mod processes;
pub mod render;
pub mod runtime;
pub mod savegame;
pub mod shapes;
pub mod world;

pub use context::GameContext;
pub use error::{LoadError, SaveError};
pub use object_manager::{ObjId, ObjectManager};
pub use process::{ProcId, Process, ProcessLogic};
