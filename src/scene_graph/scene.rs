use glam::{Mat4, Quat, Vec3};
use id_arena::Arena;
use std::collections::HashMap;

use crate::model::{Buffers, Model};
use crate::scene_graph::object3d::{ItemTag, Object3D, ObjectId};
use crate::scene_graph::scene_model::{SceneModel, SceneModelId};

pub struct Scene {
    pub objects: Arena<Object3D>,
    pub models: Arena<SceneModel>,
    gltf_mesh_to_model: HashMap<usize, SceneModelId>,
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Arena::new(),
            models: Arena::new(),
            gltf_mesh_to_model: HashMap::new(),
        }
    }

    pub fn add_object(&mut self, object: Object3D) -> ObjectId {
        self.objects.alloc(object)
    }

    pub fn get_object(&self, id: ObjectId) -> Option<&Object3D> {
        self.objects.get(id)
    }

    pub fn get_object_mut(&mut self, id: ObjectId) -> Option<&mut Object3D> {
        self.objects.get_mut(id)
    }

    #[allow(dead_code)]
    pub fn get_object_by_name(&self, name: &str) -> Option<ObjectId> {
        self.objects
            .iter()
            .find(|(_, object)| object.name == name)
            .map(|(id, _)| id)
    }

    pub fn add_model(&mut self, model: SceneModel) -> SceneModelId {
        self.models.alloc(model)
    }

    /// Spawns a model as a single scene object. Used for the procedural
    /// environment pieces, which are all one mesh deep.
    pub fn spawn_model(&mut self, model: Model, translation: Vec3, scale: f32) -> ObjectId {
        let model_id = self.add_model(SceneModel::new(model));
        let mut object = Object3D::default();
        object.name = self.models.get(model_id).unwrap().name.clone();
        object.model_id = Some(model_id);
        object.transform.set_translation(translation);
        object.transform.set_scale(scale);
        self.add_object(object)
    }

    /// Spawns an imported glTF scene under a fresh group object and returns
    /// the group's id. Every node in the subtree receives `tag` so picking
    /// reports the item no matter which mesh the ray hits.
    pub fn spawn_gltf_scene(
        &mut self,
        group_name: impl Into<String>,
        buffers: Buffers,
        scene: &gltf::Scene,
        tag: Option<&ItemTag>,
    ) -> ObjectId {
        let mut group = Object3D::default();
        group.name = group_name.into();
        let group_id = self.add_object(group);

        for node in scene.nodes() {
            let child_id = self.spawn_gltf_node(buffers, &node);
            self.set_object_parent(child_id, Some(group_id));
        }

        if let Some(tag) = tag {
            self.tag_subtree(group_id, tag);
        }

        group_id
    }

    fn spawn_gltf_node(&mut self, buffers: Buffers, node: &gltf::Node) -> ObjectId {
        let mut object = Object3D::default();
        let node_name = node.name().unwrap_or("Unnamed").to_string();
        object.name = node_name.clone();
        let (translation, rotation, scale) = node.transform().decomposed();

        object.transform.set_transform(
            translation.into(),
            Quat::from_array(rotation),
            scale[0], // Assume uniform scale for simplicity
        );

        if let Some(mesh) = node.mesh() {
            let mesh_index = mesh.index();

            let model_id = match self.gltf_mesh_to_model.get(&mesh_index).copied() {
                Some(model_id) => Some(model_id),
                None => {
                    let mesh_name = mesh
                        .name()
                        .map(String::from)
                        .unwrap_or_else(|| format!("{} (Mesh)", node_name));

                    match Model::from_gltf(mesh_name, mesh, buffers) {
                        Ok(model) => {
                            let model_id = self.add_model(SceneModel::new(model));
                            self.gltf_mesh_to_model.insert(mesh_index, model_id);
                            Some(model_id)
                        }
                        Err(error) => {
                            log::warn!("Skipping mesh in node {}: {:?}", node_name, error);
                            None
                        }
                    }
                }
            };

            object.model_id = model_id;
        }

        let object_id = self.add_object(object);

        for child in node.children() {
            let child_id = self.spawn_gltf_node(buffers, &child);
            self.set_object_parent(child_id, Some(object_id));
        }

        object_id
    }

    /// Applies `tag` to `root` and every descendant.
    pub fn tag_subtree(&mut self, root: ObjectId, tag: &ItemTag) {
        let child_ids = match self.objects.get_mut(root) {
            Some(object) => {
                object.tag = Some(tag.clone());
                object.child_ids.clone()
            }
            None => return,
        };

        for child_id in child_ids {
            self.tag_subtree(child_id, tag);
        }
    }

    /// Updates all object transforms in hierarchical order.
    pub fn update_transforms(&self) {
        let root_objects = self.objects.iter().filter_map(|(id, object)| {
            if object.parent_id.is_none() {
                Some(id)
            } else {
                None
            }
        });

        for root_id in root_objects {
            self.update_object_transform_recursive(root_id, Mat4::IDENTITY);
        }
    }

    fn update_object_transform_recursive(&self, object_id: ObjectId, parent_world_matrix: Mat4) {
        if let Some(object) = self.objects.get(object_id) {
            if object.transform.is_world_dirty() {
                let local_matrix = *object.transform.get_local_matrix();
                let world_matrix = parent_world_matrix * local_matrix;
                object.transform.set_world_matrix(world_matrix);
            }

            let world_matrix = *object.transform.get_world_matrix();
            for &child_id in &object.child_ids {
                self.update_object_transform_recursive(child_id, world_matrix);
            }
        }
    }

    pub fn invalidate_object_hierarchy(&self, object_id: ObjectId) {
        if let Some(object) = self.objects.get(object_id) {
            object.transform.invalidate_world();

            for &child_id in &object.child_ids {
                self.invalidate_object_hierarchy(child_id);
            }
        }
    }

    pub fn set_object_parent(&mut self, child_id: ObjectId, new_parent_id: Option<ObjectId>) {
        if let Some(child) = self.objects.get(child_id) {
            if let Some(old_parent_id) = child.parent_id {
                if let Some(old_parent) = self.objects.get_mut(old_parent_id) {
                    old_parent.child_ids.retain(|&id| id != child_id);
                }
            }
        }

        if let Some(child) = self.objects.get_mut(child_id) {
            child.parent_id = new_parent_id;

            if let Some(new_parent_id) = new_parent_id {
                if let Some(new_parent) = self.objects.get_mut(new_parent_id) {
                    new_parent.child_ids.push(child_id);
                }
            }
        }

        self.invalidate_object_hierarchy(child_id);
    }

    pub fn set_object_transform(
        &mut self,
        object_id: ObjectId,
        translation: Vec3,
        rotation: Quat,
        scale: f32,
    ) {
        if let Some(object) = self.objects.get_mut(object_id) {
            object.transform.set_transform(translation, rotation, scale);
        }
        self.invalidate_object_hierarchy(object_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec4;

    fn spooky_tag() -> ItemTag {
        ItemTag {
            name: "Silent Specter".to_string(),
            description: "Wanders the garden at night.".to_string(),
            interactive: true,
        }
    }

    #[test]
    fn tag_subtree_reaches_every_descendant() {
        let mut scene = Scene::new();

        let root = scene.add_object(Object3D::default());
        let child_a = scene.spawn_model(
            Model::uv_sphere("Head", 1.0, 4, 6, Vec4::ONE),
            Vec3::new(0.0, 2.0, 0.0),
            1.0,
        );
        let child_b = scene.spawn_model(
            Model::uv_sphere("Body", 1.5, 4, 6, Vec4::ONE),
            Vec3::ZERO,
            1.0,
        );
        let grandchild = scene.spawn_model(
            Model::uv_sphere("Eye", 0.2, 4, 6, Vec4::ONE),
            Vec3::new(0.3, 0.0, 0.0),
            1.0,
        );
        scene.set_object_parent(child_a, Some(root));
        scene.set_object_parent(child_b, Some(root));
        scene.set_object_parent(grandchild, Some(child_a));

        let tag = spooky_tag();
        scene.tag_subtree(root, &tag);

        for id in [root, child_a, child_b, grandchild] {
            let object = scene.get_object(id).unwrap();
            assert_eq!(object.tag.as_ref(), Some(&tag));
            assert!(object.is_interactive());
        }
    }

    #[test]
    fn child_world_transform_follows_parent() {
        let mut scene = Scene::new();

        let parent = scene.add_object(Object3D::default());
        let child = scene.add_object(Object3D::default());
        scene.set_object_parent(child, Some(parent));

        scene.set_object_transform(
            parent,
            Vec3::new(3.0, 0.0, -4.0),
            Quat::IDENTITY,
            2.0,
        );
        if let Some(object) = scene.get_object_mut(child) {
            object.transform.set_translation(Vec3::new(0.0, 1.0, 0.0));
        }
        scene.invalidate_object_hierarchy(child);

        scene.update_transforms();

        let world = *scene
            .get_object(child)
            .unwrap()
            .transform
            .get_world_matrix();
        let position = world.transform_point3(Vec3::ZERO);
        assert!((position - Vec3::new(3.0, 2.0, -4.0)).length() < 1e-5);
    }
}
