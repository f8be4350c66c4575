use glam::{Vec3, Vec4};
use id_arena::Id;

use crate::scene_graph::scene::Scene;
use crate::scene_graph::scene_model::SceneModelId;
use crate::scene_graph::transform::Transform;

pub type ObjectId = Id<Object3D>;

/// Display metadata attached to pointer-interactive objects. Surfaced to
/// the tooltip sink when the object is hovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTag {
    pub name: String,
    pub description: String,
    pub interactive: bool,
}

pub struct Object3D {
    pub name: String,
    pub transform: Transform,
    pub model_id: Option<SceneModelId>,
    pub parent_id: Option<ObjectId>,
    pub child_ids: Vec<ObjectId>,
    pub visible: bool,
    /// Multiplied into vertex colors; alpha carries opacity.
    pub tint: Vec4,
    /// Added after lighting. The moon is the only object that glows.
    pub emissive: Vec4,
    pub tag: Option<ItemTag>,
}

impl Object3D {
    pub fn is_interactive(&self) -> bool {
        self.tag.as_ref().is_some_and(|tag| tag.interactive)
    }

    #[allow(dead_code)]
    pub fn parent<'a>(&self, scene: &'a Scene) -> Option<&'a Object3D> {
        self.parent_id.and_then(|id| scene.get_object(id))
    }
}

impl Default for Object3D {
    fn default() -> Self {
        Self {
            name: String::new(),
            transform: Transform::from_translation(Vec3::ZERO),
            model_id: None,
            parent_id: None,
            child_ids: Vec::new(),
            visible: true,
            tint: Vec4::ONE,
            emissive: Vec4::ZERO,
            tag: None,
        }
    }
}
