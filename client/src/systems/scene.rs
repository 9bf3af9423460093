//! Scene systems
//!
//! Lights, the fallback ground and landmarks, and the room glTF: loading it,
//! turning its meshes into colliders and handing them to the walkthrough.

use bevy::asset::RecursiveDependencyLoadState;
use bevy::gltf::Gltf;
use bevy::light::DirectionalLightShadowMap;
use bevy::mesh::{PrimitiveTopology, VertexAttributeValues};
use bevy::prelude::*;
use rand::Rng;
use roomwalk_shared::{CollisionMesh, CollisionWorld, Settings, Walkthrough, ROOM_SCENE_PATH};
use std::collections::HashSet;

// =============================================================================
// COMPONENTS / RESOURCES
// =============================================================================

/// The shadow-casting key light.
#[derive(Component)]
pub struct KeyLight;

/// Ground plane shown until the room is in.
#[derive(Component)]
pub struct FallbackGround;

/// Parent of the spawned room scene.
#[derive(Component)]
pub struct RoomRoot;

#[derive(Debug, Clone, PartialEq)]
pub enum LoadStatus {
    /// Textures are the bulk of the file's dependencies, so they stand in for
    /// byte progress. `total` is 0 until the glTF itself has parsed.
    Loading { textures_loaded: usize, textures_total: usize },
    Loaded { meshes: usize, triangles: usize },
    Failed(String),
}

impl LoadStatus {
    /// One-line status text.
    pub fn describe(&self) -> String {
        match self {
            LoadStatus::Loading {
                textures_total: 0, ..
            } => format!("loading {ROOM_SCENE_PATH}…"),
            LoadStatus::Loading {
                textures_loaded,
                textures_total,
            } => format!(
                "loading {ROOM_SCENE_PATH}… {}%",
                textures_loaded * 100 / textures_total
            ),
            LoadStatus::Loaded { meshes, triangles } => {
                format!("{ROOM_SCENE_PATH}: loaded ({meshes} meshes, {triangles} triangles)")
            }
            LoadStatus::Failed(reason) => format!("GLB load error: {reason}"),
        }
    }
}

/// Progress of the room scene.
#[derive(Resource)]
pub struct RoomLoad {
    pub gltf: Handle<Gltf>,
    pub scene: Handle<Scene>,
    pub status: LoadStatus,
}

// =============================================================================
// SETUP
// =============================================================================

const LANDMARK_COUNT: usize = 18;
const LANDMARK_SIZE: f32 = 1.2;
const LANDMARK_MIN_RING: f32 = 30.0;
const LANDMARK_MAX_RING: f32 = 120.0;
const FALLBACK_GROUND_SIZE: f32 = 120.0;

const LANDMARK_PALETTE: [Color; 6] = [
    Color::srgb(1.0, 0.463, 0.459),
    Color::srgb(0.455, 0.725, 1.0),
    Color::srgb(0.333, 0.937, 0.769),
    Color::srgb(0.992, 0.796, 0.431),
    Color::srgb(0.635, 0.608, 0.996),
    Color::srgb(1.0, 0.706, 0.635),
];

/// Key light plus a cool ambient fill.
pub fn setup_lighting(mut commands: Commands, settings: Res<Settings>) {
    commands.insert_resource(DirectionalLightShadowMap {
        size: settings.graphics.quality.shadow_map_size(),
    });

    commands.spawn((
        KeyLight,
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: settings.graphics.shadows,
            ..default()
        },
        Transform::from_xyz(10.0, 16.0, 10.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.75, 0.87, 1.0),
        brightness: 400.0,
        affects_lightmapped_meshes: true,
    });

    info!(
        "Lighting ready (shadows {}, shadow map {})",
        if settings.graphics.shadows { "on" } else { "off" },
        settings.graphics.quality.shadow_map_size()
    );
}

/// Fallback ground and scattered landmark boxes.
pub fn spawn_environment(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.spawn((
        FallbackGround,
        Mesh3d(meshes.add(Plane3d::default().mesh().size(FALLBACK_GROUND_SIZE, FALLBACK_GROUND_SIZE))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.576, 0.769, 0.49),
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::default(),
    ));

    // Landmarks are decoration only; they never collide.
    let box_mesh = meshes.add(Cuboid::from_length(LANDMARK_SIZE));
    let mut rng = rand::thread_rng();
    for i in 0..LANDMARK_COUNT {
        let ring = rng.gen_range(LANDMARK_MIN_RING..LANDMARK_MAX_RING);
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        commands.spawn((
            Mesh3d(box_mesh.clone()),
            MeshMaterial3d(materials.add(StandardMaterial {
                base_color: LANDMARK_PALETTE[i % LANDMARK_PALETTE.len()],
                perceptual_roughness: 0.8,
                ..default()
            })),
            Transform::from_xyz(angle.cos() * ring, LANDMARK_SIZE * 0.5, angle.sin() * ring),
        ));
    }
}

/// Kick off the room load and spawn its scene root.
pub fn start_room_load(mut commands: Commands, asset_server: Res<AssetServer>) {
    let scene: Handle<Scene> = asset_server.load(GltfAssetLabel::Scene(0).from_asset(ROOM_SCENE_PATH));

    commands.spawn((RoomRoot, SceneRoot(scene.clone()), Transform::default()));
    commands.insert_resource(RoomLoad {
        gltf: asset_server.load(ROOM_SCENE_PATH),
        scene,
        status: LoadStatus::Loading {
            textures_loaded: 0,
            textures_total: 0,
        },
    });

    info!("Loading {}", ROOM_SCENE_PATH);
}

// =============================================================================
// LOAD COMPLETION
// =============================================================================

/// Once the room and all its dependencies are in, build colliders and fit the walkthrough.
///
/// Colliders are only appended here, before the frame driver runs.
pub fn poll_room_load(
    room: Option<ResMut<RoomLoad>>,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
    scenes: Res<Assets<Scene>>,
    meshes: Res<Assets<Mesh>>,
    materials: Res<Assets<StandardMaterial>>,
    mut world: ResMut<CollisionWorld>,
    mut walkthrough: ResMut<Walkthrough>,
    mut fallback: Query<&mut Visibility, With<FallbackGround>>,
) {
    let Some(mut room) = room else { return };
    if !matches!(room.status, LoadStatus::Loading { .. }) {
        return;
    }

    match asset_server.get_recursive_dependency_load_state(&room.scene) {
        Some(RecursiveDependencyLoadState::Loaded) => {}
        Some(RecursiveDependencyLoadState::Failed(err)) => {
            error!("Failed to load {}: {}", ROOM_SCENE_PATH, err);
            room.status = LoadStatus::Failed(err.to_string());
            return;
        }
        _ => {
            if let Some(gltf) = gltfs.get(&room.gltf) {
                let used = gltf.materials.iter().filter_map(|handle| materials.get(handle));
                let (loaded, total) = texture_progress(used, |id| asset_server.is_loaded(id));
                let status = LoadStatus::Loading {
                    textures_loaded: loaded,
                    textures_total: total,
                };
                if room.status != status {
                    room.status = status;
                }
            }
            return;
        }
    }

    let Some(scene) = scenes.get(&room.scene) else {
        return;
    };

    let colliders = collect_room_colliders(scene, &meshes, &materials);
    if colliders.is_empty() {
        warn!("{} has no triangle meshes; keeping the fallback ground", ROOM_SCENE_PATH);
        room.status = LoadStatus::Failed("no triangle meshes".to_string());
        return;
    }

    let mesh_count = colliders.len();
    for collider in colliders {
        world.push_mesh(collider);
    }
    let Some(bounds) = world.geometry_bounds() else {
        return;
    };
    world.set_bounds(bounds);
    walkthrough.on_world_loaded(&bounds, &world);

    room.status = LoadStatus::Loaded {
        meshes: mesh_count,
        triangles: world.triangle_count(),
    };
    info!(
        "Room colliders ready: {} meshes, {} triangles, bounds {:.2?}..{:.2?}",
        mesh_count,
        world.triangle_count(),
        bounds.min,
        bounds.max
    );

    for mut visibility in fallback.iter_mut() {
        *visibility = Visibility::Hidden;
    }
}

/// Loaded and total distinct textures across `materials`.
pub fn texture_progress<'a>(
    materials: impl IntoIterator<Item = &'a StandardMaterial>,
    is_loaded: impl Fn(AssetId<Image>) -> bool,
) -> (usize, usize) {
    let mut textures = HashSet::new();
    for material in materials {
        let slots = [
            &material.base_color_texture,
            &material.emissive_texture,
            &material.metallic_roughness_texture,
            &material.normal_map_texture,
            &material.occlusion_texture,
        ];
        textures.extend(slots.into_iter().flatten().map(|handle| handle.id()));
    }
    let loaded = textures.iter().filter(|id| is_loaded(**id)).count();
    (loaded, textures.len())
}

// =============================================================================
// COLLIDER EXTRACTION
// =============================================================================

/// World-space colliders for every triangle mesh in the scene.
///
/// The room root sits at the origin, so scene space is world space. A mesh is
/// two-sided when its material is double-sided or has culling disabled.
pub fn collect_room_colliders(
    scene: &Scene,
    meshes: &Assets<Mesh>,
    materials: &Assets<StandardMaterial>,
) -> Vec<CollisionMesh> {
    let world = &scene.world;
    let mut out = Vec::new();

    #[allow(deprecated)]
    for entity_ref in world.iter_entities() {
        let Some(mesh3d) = entity_ref.get::<Mesh3d>() else { continue };
        let Some(mesh) = meshes.get(&mesh3d.0) else { continue };

        let two_sided = entity_ref
            .get::<MeshMaterial3d<StandardMaterial>>()
            .and_then(|material| materials.get(&material.0))
            .is_some_and(|material| material.double_sided || material.cull_mode.is_none());

        let matrix = world_matrix_for(entity_ref.id(), world);
        if let Some(collider) = mesh_collider(mesh, matrix, two_sided) {
            out.push(collider);
        }
    }

    out
}

/// Triangles of one mesh under `to_world`. `None` for non-triangle topologies or empty meshes.
pub fn mesh_collider(mesh: &Mesh, to_world: Mat4, two_sided: bool) -> Option<CollisionMesh> {
    if mesh.primitive_topology() != PrimitiveTopology::TriangleList {
        return None;
    }
    let Some(VertexAttributeValues::Float32x3(positions)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION)
    else {
        return None;
    };
    let positions: Vec<Vec3> = positions.iter().map(|p| Vec3::from_array(*p)).collect();

    let mut indices: Vec<u32> = match mesh.indices() {
        Some(indices) => indices.iter().map(|i| i as u32).collect(),
        None => (0..positions.len() as u32).collect(),
    };
    // A mirroring transform flips winding; flip it back so front faces stay front faces.
    if to_world.determinant() < 0.0 {
        for tri in indices.chunks_exact_mut(3) {
            tri.swap(1, 2);
        }
    }

    CollisionMesh::from_indexed(
        &positions,
        &indices,
        |p| to_world.transform_point3(p),
        two_sided,
    )
}

fn world_matrix_for(entity: Entity, world: &World) -> Mat4 {
    let mut mat = Mat4::IDENTITY;
    let mut current = entity;

    loop {
        if let Some(t) = world.get::<Transform>(current) {
            mat = t.to_matrix() * mat;
        }

        if let Some(parent) = world.get::<ChildOf>(current) {
            current = parent.parent();
        } else {
            break;
        }
    }

    mat
}
