//! Synthetic DXM files for integration tests

use std::path::Path;

/// Composition flags of the mesh layout (position, normal, texcoord)
pub const MESH_FLAGS: u32 = 0x7;
/// Composition flags of the point-cloud layout (position, color)
pub const POINT_CLOUD_FLAGS: u32 = 0x9;

/// Texture name and raw indices of one group
pub struct FixtureGroup {
    pub texture: Option<&'static str>,
    pub indices: Vec<u32>,
}

/// A version 2.2, de-interleaved, uncompressed DXM file
pub struct Fixture {
    pub flags: u32,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub uvs: Vec<[f32; 2]>,
    pub colors: Vec<[u8; 4]>,
    pub groups: Vec<FixtureGroup>,
}

impl Fixture {
    /// Four raw vertices, two of them at the same position, one triangle
    pub fn shared_corner_triangle(texture: Option<&'static str>) -> Self {
        Self {
            flags: MESH_FLAGS,
            positions: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            normals: vec![[0.0, 0.0, 1.0]; 4],
            uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0], [0.0, 1.0]],
            colors: Vec::new(),
            groups: vec![FixtureGroup {
                texture,
                indices: vec![2, 1, 3],
            }],
        }
    }

    pub fn point_cloud() -> Self {
        Self {
            flags: POINT_CLOUD_FLAGS,
            positions: vec![[0.0, 0.0, 0.0], [0.5, 0.25, 0.0]],
            normals: Vec::new(),
            uvs: Vec::new(),
            colors: vec![[255, 255, 255, 255], [0, 0, 0, 255]],
            groups: vec![FixtureGroup {
                texture: None,
                indices: Vec::new(),
            }],
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();

        out.extend_from_slice(b"DXM1");
        out.extend_from_slice(&[2, 2, 1, 0]);
        out.extend_from_slice(&(self.positions.len() as u64).to_le_bytes());
        out.extend_from_slice(&self.flags.to_le_bytes());
        out.extend_from_slice(&(self.groups.len() as u16).to_le_bytes());
        out.extend_from_slice(&[0, 2]);
        out.extend_from_slice(&[0; 16]);

        let mut offset = 0u64;
        for group in &self.groups {
            out.extend_from_slice(&offset.to_le_bytes());
            out.extend_from_slice(&(group.indices.len() as u64).to_le_bytes());
            match group.texture {
                Some(name) => {
                    out.extend_from_slice(&(name.len() as u16 + 1).to_le_bytes());
                    out.extend_from_slice(name.as_bytes());
                    out.push(0);
                }
                None => out.extend_from_slice(&0u16.to_le_bytes()),
            }
            offset += group.indices.len() as u64 * 2;
        }

        let mut vertices = Vec::new();
        let floats = self
            .positions
            .iter()
            .flatten()
            .chain(self.normals.iter().flatten())
            .chain(self.uvs.iter().flatten());
        for f in floats {
            vertices.extend_from_slice(&f.to_le_bytes());
        }
        vertices.extend(self.colors.iter().flatten());
        push_chunk(&mut out, &vertices);

        let mut indices = Vec::new();
        for i in self.groups.iter().flat_map(|g| &g.indices) {
            indices.extend_from_slice(&(*i as u16).to_le_bytes());
        }
        push_chunk(&mut out, &indices);

        out
    }

    pub fn write(&self, path: &Path) {
        std::fs::write(path, self.to_bytes()).expect("Failed to write fixture");
    }
}

fn push_chunk(out: &mut Vec<u8>, data: &[u8]) {
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend_from_slice(&(data.len() as u64).to_le_bytes());
    out.extend_from_slice(data);
}
