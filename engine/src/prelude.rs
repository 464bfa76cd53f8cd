pub use crate::{msg, Entity, EntityId, Result};
pub use glam::{ivec2, ivec3, IVec2, IVec3};
pub use util::{HashMap, HashSet, IndexMap, IndexSet, VecExt, DIR_4, DIR_8};
