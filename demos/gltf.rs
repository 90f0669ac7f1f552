//! Exports a loaded scene as a binary glTF file.
//!
//! Usage: `cargo run --example gltf -- [DIR] [PREFIX] [OUT]`, defaulting to the
//! test fixture in `tests/data`.

use gltf::json;
use gltf::json::validation::{Checked, USize64};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use voroscene::{FileStore, Point3, SceneConfig, SceneGeometry, load_scene};

const MARKER_RADIUS: f32 = 0.05;

/// Geometry laid out as glTF primitives, each with its own positions and indices.
#[derive(Default)]
struct Primitive {
    positions: Vec<[f32; 3]>,
    indices: Vec<u32>,
}

impl Primitive {
    fn base(&self) -> u32 {
        self.positions.len() as u32
    }

    fn push_point(&mut self, p: &Point3) {
        self.positions.push([p[0] as f32, p[1] as f32, p[2] as f32]);
    }

    fn bounds(&self) -> ([f32; 3], [f32; 3]) {
        let mut min = [f32::MAX; 3];
        let mut max = [f32::MIN; 3];
        for p in &self.positions {
            for i in 0..3 {
                min[i] = min[i].min(p[i]);
                max[i] = max[i].max(p[i]);
            }
        }
        (min, max)
    }
}

struct GltfBuilder {
    cells: Primitive,
    outlines: Primitive,
    markers: Primitive,
}

impl GltfBuilder {
    fn new() -> Self {
        Self {
            cells: Primitive::default(),
            outlines: Primitive::default(),
            markers: Primitive::default(),
        }
    }

    fn add_scene(&mut self, scene: &SceneGeometry) {
        // Gap copy for the solids so neighbouring cells stay visually apart
        for mesh in &scene.gap {
            let base = self.cells.base();
            mesh.positions.iter().for_each(|p| self.cells.push_point(p));
            self.cells.indices.extend(mesh.flat_indices().iter().map(|&i| base + i));
        }

        for mesh in &scene.shrunk {
            for line in &mesh.face_polylines {
                self.add_polyline(line);
            }
        }
        for line in &scene.edges {
            self.add_polyline(line);
        }

        for p in scene.points.iter().chain(&scene.centroids) {
            self.add_marker(p);
        }
    }

    fn add_polyline(&mut self, line: &[Point3]) {
        let base = self.outlines.base();
        line.iter().for_each(|p| self.outlines.push_point(p));
        for i in 1..line.len() as u32 {
            self.outlines.indices.push(base + i - 1);
            self.outlines.indices.push(base + i);
        }
    }

    fn add_marker(&mut self, p: &Point3) {
        let (cx, cy, cz) = (p[0] as f32, p[1] as f32, p[2] as f32);
        let r = MARKER_RADIUS;
        let base = self.markers.base();

        // Octahedron
        self.markers.positions.extend([
            [cx + r, cy, cz],
            [cx - r, cy, cz],
            [cx, cy + r, cz],
            [cx, cy - r, cz],
            [cx, cy, cz + r],
            [cx, cy, cz - r],
        ]);
        let indices = [
            2, 4, 0, 2, 1, 4, 2, 5, 1, 2, 0, 5, // Top half
            3, 0, 4, 3, 4, 1, 3, 1, 5, 3, 5, 0, // Bottom half
        ];
        self.markers.indices.extend(indices.iter().map(|&i| base + i));
    }

    fn save(&self, filename: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut buffer_data: Vec<u8> = Vec::new();
        let mut views = Vec::new();
        let mut accessors = Vec::new();
        let mut primitives = Vec::new();

        let layout = [
            (&self.cells, json::mesh::Mode::Triangles, 0),
            (&self.outlines, json::mesh::Mode::Lines, 1),
            (&self.markers, json::mesh::Mode::Triangles, 2),
        ];

        for (primitive, mode, material) in layout {
            if primitive.indices.is_empty() {
                continue;
            }
            let (min, max) = primitive.bounds();

            let pos_offset = buffer_data.len();
            for p in &primitive.positions {
                for c in p {
                    buffer_data.write_all(&c.to_le_bytes())?;
                }
            }
            let pos_view = push_view(&mut views, pos_offset, buffer_data.len() - pos_offset, true);
            let pos_accessor = accessors.len() as u32;
            accessors.push(accessor(pos_view, primitive.positions.len(), json::accessor::ComponentType::F32, json::accessor::Type::Vec3, Some((min, max))));

            let ind_offset = buffer_data.len();
            for i in &primitive.indices {
                buffer_data.write_all(&i.to_le_bytes())?;
            }
            let ind_view = push_view(&mut views, ind_offset, buffer_data.len() - ind_offset, false);
            let ind_accessor = accessors.len() as u32;
            accessors.push(accessor(ind_view, primitive.indices.len(), json::accessor::ComponentType::U32, json::accessor::Type::Scalar, None));

            primitives.push(json::mesh::Primitive {
                attributes: {
                    let mut map = BTreeMap::new();
                    map.insert(Checked::Valid(json::mesh::Semantic::Positions), json::Index::new(pos_accessor));
                    map
                },
                extensions: Default::default(),
                extras: Default::default(),
                indices: Some(json::Index::new(ind_accessor)),
                material: Some(json::Index::new(material)),
                mode: Checked::Valid(mode),
                targets: None,
            });
        }

        let buffer = json::Buffer {
            byte_length: USize64(buffer_data.len() as u64),
            uri: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
        };

        let root = json::Root {
            accessors,
            animations: vec![],
            asset: json::Asset {
                generator: Some("voroscene example".to_string()),
                version: "2.0".to_string(),
                ..Default::default()
            },
            buffers: vec![buffer],
            buffer_views: views,
            cameras: vec![],
            extensions: Default::default(),
            extensions_used: vec![],
            extensions_required: vec![],
            extras: Default::default(),
            images: vec![],
            materials: vec![
                material("TransparentCells", [0.0, 0.0, 1.0, 0.3], true),
                material("BlackOutlines", [0.0, 0.0, 0.0, 1.0], false),
                material("RedMarkers", [1.0, 0.0, 0.0, 1.0], false),
            ],
            meshes: vec![json::Mesh {
                extensions: Default::default(),
                extras: Default::default(),
                name: None,
                primitives,
                weights: None,
            }],
            nodes: vec![json::Node {
                camera: None,
                children: None,
                extensions: Default::default(),
                extras: Default::default(),
                matrix: None,
                mesh: Some(json::Index::new(0)),
                name: None,
                rotation: None,
                scale: None,
                skin: None,
                translation: None,
                weights: None,
            }],
            scene: Some(json::Index::new(0)),
            scenes: vec![json::Scene {
                extensions: Default::default(),
                extras: Default::default(),
                name: None,
                nodes: vec![json::Index::new(0)],
            }],
            samplers: vec![],
            skins: vec![],
            textures: vec![],
        };

        let mut json_bytes = json::serialize::to_string(&root)?.into_bytes();
        // Pad JSON to 4 bytes with spaces
        while json_bytes.len() % 4 != 0 {
            json_bytes.push(0x20);
        }

        let total_length = 12 + 8 + json_bytes.len() as u32 + 8 + buffer_data.len() as u32;
        let mut file = File::create(filename)?;

        // Header
        file.write_all(b"glTF")?;
        file.write_all(&2u32.to_le_bytes())?;
        file.write_all(&total_length.to_le_bytes())?;

        // JSON Chunk
        file.write_all(&(json_bytes.len() as u32).to_le_bytes())?;
        file.write_all(b"JSON")?;
        file.write_all(&json_bytes)?;

        // BIN Chunk
        file.write_all(&(buffer_data.len() as u32).to_le_bytes())?;
        file.write_all(b"BIN\0")?;
        file.write_all(&buffer_data)?;

        Ok(())
    }
}

fn push_view(views: &mut Vec<json::buffer::View>, offset: usize, len: usize, vertices: bool) -> u32 {
    let target = if vertices {
        json::buffer::Target::ArrayBuffer
    } else {
        json::buffer::Target::ElementArrayBuffer
    };
    views.push(json::buffer::View {
        buffer: json::Index::new(0),
        byte_length: USize64(len as u64),
        byte_offset: Some(USize64(offset as u64)),
        byte_stride: vertices.then_some(json::buffer::Stride(12)),
        name: None,
        target: Some(Checked::Valid(target)),
        extensions: Default::default(),
        extras: Default::default(),
    });
    views.len() as u32 - 1
}

fn accessor(
    view: u32,
    count: usize,
    component: json::accessor::ComponentType,
    type_: json::accessor::Type,
    bounds: Option<([f32; 3], [f32; 3])>,
) -> json::Accessor {
    json::Accessor {
        buffer_view: Some(json::Index::new(view)),
        byte_offset: Some(USize64(0)),
        count: USize64(count as u64),
        component_type: Checked::Valid(json::accessor::GenericComponentType(component)),
        extensions: Default::default(),
        extras: Default::default(),
        type_: Checked::Valid(type_),
        min: bounds.map(|(min, _)| json::Value::from(Vec::from(min))),
        max: bounds.map(|(_, max)| json::Value::from(Vec::from(max))),
        name: None,
        normalized: false,
        sparse: None,
    }
}

fn material(name: &str, color: [f32; 4], blend: bool) -> json::Material {
    json::Material {
        alpha_mode: Checked::Valid(if blend {
            json::material::AlphaMode::Blend
        } else {
            json::material::AlphaMode::Opaque
        }),
        double_sided: true,
        name: Some(name.to_string()),
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_factor: json::material::PbrBaseColorFactor(color),
            metallic_factor: json::material::StrengthFactor(0.0),
            roughness_factor: json::material::StrengthFactor(0.5),
            ..Default::default()
        },
        ..Default::default()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let dir = args.next().unwrap_or_else(|| "tests/data".to_string());
    let prefix = args.next().unwrap_or_else(|| "cubes".to_string());
    let out = args.next().unwrap_or_else(|| "scene.glb".to_string());

    let config = SceneConfig::default().with_prefix(&prefix);
    let geometry = load_scene(&FileStore::new(&dir), &config).await?;

    let mut builder = GltfBuilder::new();
    builder.add_scene(&geometry);
    builder.save(&out)?;
    println!("{} cells saved to {}", geometry.count_cells(), out);
    Ok(())
}
