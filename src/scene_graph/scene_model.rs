use id_arena::Id;

use crate::math::bounds::BoundingSphere;
use crate::model::Model;
use crate::rendering::render_model::RenderModelId;

pub type SceneModelId = Id<SceneModel>;

pub struct SceneModel {
    pub name: String,
    pub model: Model,
    /// Object-space bounds, used for picking.
    pub bounds: BoundingSphere,
    /// Filled in by the renderer once GPU buffers exist for this model.
    pub render_model: Option<RenderModelId>,
}

impl SceneModel {
    pub fn new(model: Model) -> Self {
        let bounds = model.bounding_sphere();
        Self {
            name: model.name.clone(),
            model,
            bounds,
            render_model: None,
        }
    }
}
