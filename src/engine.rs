use crate::state::SceneState;

/// One simulation step: advance the animation state, then resolve world
/// matrices for everything the renderer and the picker will read.
pub fn update(state: &mut SceneState, dt: f32) {
    state.update(dt);
    state.scene.update_transforms();
}
