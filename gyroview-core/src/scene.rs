//! Scene contents: static decorations plus animated meshes.

use std::rc::Rc;

use nalgebra::{Matrix4, Point3, Vector3};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::asset::AssetState;
use crate::config::{SceneConfig, SceneVariant};
use crate::geometry::{self, Mesh, Rgb, Segment};
use crate::transform::{AngularDelta, OrientationSample, RotationState, Transform};

/// Wireframe colour of the cube
const CUBE_COLOR: Rgb = Rgb::WHITE;
/// Flat colour of imported models
const MODEL_COLOR: Rgb = Rgb(0xc000c0);
/// Flat colour of scattered props
const PROP_COLOR: Rgb = Rgb(0x2e8b57);

const CUBE_DELTA: AngularDelta = AngularDelta::degrees(1.0, 0.0, 0.0);
const COMPANION_CUBE_DELTA: AngularDelta = AngularDelta::degrees(-1.0, -1.0, 0.0);
const MODEL_DELTA: AngularDelta = AngularDelta::degrees(2.0, 1.0, 0.0);
const PROP_DELTA: AngularDelta = AngularDelta::degrees(0.0, 0.5, 0.0);

/// Props are kept this far from the origin so they do not overlap the cube
const PROP_CLEARANCE: f32 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Material {
    /// Triangle edges only
    Wireframe(Rgb),
    /// Filled triangles shaded by the directional light
    Flat(Rgb),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub position: Point3<f32>,
    pub color: Rgb,
    pub intensity: f32,
}

impl DirectionalLight {
    /// Unit vector pointing from the scene towards the light
    pub fn direction(&self) -> Vector3<f32> {
        self.position
            .coords
            .try_normalize(1e-12)
            .unwrap_or_else(Vector3::z)
    }
}

/// Where an animated object's geometry comes from
#[derive(Debug, Clone)]
pub enum MeshSlot {
    Static(Rc<Mesh>),
    /// Shared with the imported model; drawn only once ready
    Asset,
}

#[derive(Debug, Clone)]
pub struct SceneObject {
    pub name: String,
    pub slot: MeshSlot,
    pub material: Material,
    pub position: Vector3<f32>,
    pub scale: f32,
    pub rotation: RotationState,
    pub delta: AngularDelta,
}

impl SceneObject {
    pub fn model_matrix(&self) -> Matrix4<f32> {
        Transform::model_matrix(&self.position, &self.rotation, self.scale)
    }
}

/// Everything the viewport draws
#[derive(Debug, Clone)]
pub struct Scene {
    pub decorations: Vec<Segment>,
    pub light: DirectionalLight,
    pub objects: Vec<SceneObject>,
    /// Index into `objects` whose orientation is published
    tracked: usize,
    asset: AssetState,
}

impl Scene {
    /// Build the scene for `config.variant`.
    ///
    /// Variants with a model start with `asset` as given; pass
    /// `AssetState::Pending` and call [`Scene::resolve_asset`] later if the load
    /// has not finished yet.
    pub fn build(config: &SceneConfig, asset: AssetState) -> Self {
        let mut decorations = geometry::grid(config.grid_size, config.grid_divisions);
        decorations.extend(geometry::axes(config.axes_length));

        let light = DirectionalLight {
            position: Point3::from(config.light.position),
            color: Rgb(config.light.color),
            intensity: config.light.intensity,
        };

        let cube = Rc::new(Mesh::cube(config.cube_size));
        let mut objects = Vec::new();
        let tracked;

        match config.variant {
            SceneVariant::Cube => {
                objects.push(Self::object("cube", MeshSlot::Static(cube), Material::Wireframe(CUBE_COLOR), CUBE_DELTA));
                tracked = 0;
            }
            SceneVariant::Model | SceneVariant::Forest => {
                objects.push(Self::object(
                    "cube",
                    MeshSlot::Static(cube),
                    Material::Wireframe(CUBE_COLOR),
                    COMPANION_CUBE_DELTA,
                ));
                objects.push(Self::object("model", MeshSlot::Asset, Material::Flat(MODEL_COLOR), MODEL_DELTA));
                tracked = 1;
            }
        }

        if config.variant == SceneVariant::Forest {
            let mut rng = StdRng::seed_from_u64(config.forest.seed);
            let half = config.grid_size / 2.0;
            for i in 0..config.forest.props {
                let mut prop = Self::object(
                    &format!("prop-{i}"),
                    MeshSlot::Asset,
                    Material::Flat(PROP_COLOR),
                    PROP_DELTA,
                );
                prop.position = scatter(&mut rng, half);
                prop.scale = config.forest.scale;
                prop.rotation = RotationState::new(0.0, rng.gen_range(0.0..360.0), 0.0);
                objects.push(prop);
            }
        }

        log::debug!(
            "built {:?} scene: {} objects, {} decoration lines",
            config.variant,
            objects.len(),
            decorations.len()
        );

        Self {
            decorations,
            light,
            objects,
            tracked,
            asset,
        }
    }

    fn object(name: &str, slot: MeshSlot, material: Material, delta: AngularDelta) -> SceneObject {
        SceneObject {
            name: name.to_string(),
            slot,
            material,
            position: Vector3::zeros(),
            scale: 1.0,
            rotation: RotationState::zero(),
            delta,
        }
    }

    fn uses_asset(&self) -> bool {
        self.objects.iter().any(|o| matches!(o.slot, MeshSlot::Asset))
    }

    pub fn asset(&self) -> &AssetState {
        &self.asset
    }

    pub fn resolve_asset(&mut self, state: AssetState) {
        self.asset = state;
    }

    /// `None` when every object has geometry to draw, else the reason it does not
    pub fn not_ready_reason(&self) -> Option<String> {
        if self.uses_asset() {
            self.asset.not_ready_reason()
        } else {
            None
        }
    }

    /// Mesh for `object`, if its geometry is available
    pub fn mesh_for<'a>(&'a self, object: &'a SceneObject) -> Option<&'a Mesh> {
        match &object.slot {
            MeshSlot::Static(mesh) => Some(mesh),
            MeshSlot::Asset => self.asset.mesh().map(|m| m.as_ref()),
        }
    }

    /// Advance every drawable object by its per-frame delta
    pub fn advance(&mut self) {
        let asset_ready = self.asset.is_ready();
        for object in &mut self.objects {
            if matches!(object.slot, MeshSlot::Asset) && !asset_ready {
                continue;
            }
            object.rotation.apply(&object.delta);
        }
    }

    pub fn tracked(&self) -> Option<&SceneObject> {
        self.objects.get(self.tracked)
    }

    pub fn orientation(&self) -> OrientationSample {
        self.tracked()
            .map(|o| o.rotation.sample())
            .unwrap_or_default()
    }
}

/// Random point on the grid, outside the clearance around the origin
fn scatter(rng: &mut StdRng, half: f32) -> Vector3<f32> {
    let half = half.max(PROP_CLEARANCE + 1.0);
    loop {
        let x = rng.gen_range(-half..half);
        let z = rng.gen_range(-half..half);
        if x.hypot(z) >= PROP_CLEARANCE {
            return Vector3::new(x, 0.0, z);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::AssetSource;

    fn ready_asset() -> AssetState {
        AssetState::Ready(Rc::new(Mesh::cube(1.0)))
    }

    fn config(variant: SceneVariant) -> SceneConfig {
        SceneConfig {
            variant,
            model: Some(AssetSource::Path("monkey.stl".into())),
            ..SceneConfig::default()
        }
    }

    #[test]
    fn test_cube_scene_tracks_cube() {
        let mut scene = Scene::build(&SceneConfig::default(), AssetState::Pending);
        assert!(scene.not_ready_reason().is_none());
        scene.advance();
        let sample = scene.orientation();
        assert_eq!(sample.x, 1.0);
        assert_eq!(sample.y, 0.0);
        assert_eq!(sample.z, 0.0);
    }

    #[test]
    fn test_model_scene_deltas() {
        let mut scene = Scene::build(&config(SceneVariant::Model), ready_asset());
        scene.advance();
        let model = scene.orientation();
        assert!((model.x - 2.0).abs() < 1e-4);
        assert!((model.y - 1.0).abs() < 1e-4);

        let cube = scene.objects[0].rotation.sample();
        assert!((cube.x - 359.0).abs() < 1e-3);
        assert!((cube.y - 359.0).abs() < 1e-3);
    }

    #[test]
    fn test_long_run_matches_modular_law() {
        let mut scene = Scene::build(&config(SceneVariant::Model), ready_asset());
        for _ in 0..100_000 {
            scene.advance();
        }
        // model (2, 1, 0) and cube (-1, -1, 0) per tick
        assert_eq!(scene.orientation().to_string(), "(x:200.00, y:280.00, z:0.00)");
        assert_eq!(scene.objects[0].rotation.sample().to_string(), "(x:80.00, y:80.00, z:0.00)");
    }

    #[test]
    fn test_pending_asset_gates_model() {
        let mut scene = Scene::build(&config(SceneVariant::Model), AssetState::Pending);
        assert!(scene.not_ready_reason().is_some());
        scene.advance();
        assert_eq!(scene.orientation(), OrientationSample::default());
        assert!(scene.mesh_for(&scene.objects[1]).is_none());

        scene.resolve_asset(ready_asset());
        assert!(scene.not_ready_reason().is_none());
        assert!(scene.mesh_for(&scene.objects[1]).is_some());
    }

    #[test]
    fn test_forest_is_deterministic_and_clear_of_origin() {
        let a = Scene::build(&config(SceneVariant::Forest), ready_asset());
        let b = Scene::build(&config(SceneVariant::Forest), ready_asset());
        assert_eq!(a.objects.len(), 2 + 12);
        for (pa, pb) in a.objects.iter().zip(&b.objects).skip(2) {
            assert_eq!(pa.position, pb.position);
            assert!(pa.position.xz().norm() >= PROP_CLEARANCE);
            assert!(pa.position.x.abs() <= 10.0 && pa.position.z.abs() <= 10.0);
        }
    }

    #[test]
    fn test_decorations() {
        let scene = Scene::build(&SceneConfig::default(), AssetState::Pending);
        assert_eq!(scene.decorations.len(), 42 + 3);
        assert!((scene.light.direction() - Vector3::z()).norm() < 1e-6);
    }
}
