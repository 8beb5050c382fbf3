//! Attribute deduplication and face remapping
//!
//! Raw DXM attribute arrays hold one tuple per source vertex, with shared
//! vertices split across faces. Optimization merges tuples whose canonical
//! text is equal into order-stable pools and rewrites every group's face
//! corners against those pools.

use dxm_format::{AttributePools, DxmGroup, DxmModel, FaceIndices};
use hashbrown::HashMap;
use thiserror::Error;

use crate::canonical::canonical_key;

/// Squared magnitude at or below which a normal counts as zero
pub const NORMALS_EPSILON: f32 = 1e-6;

/// Face remapping errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptimizeError {
    /// A raw index points past the decoded vertex table
    #[error("group {group}: index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange {
        group: usize,
        index: u32,
        vertex_count: usize,
    },
}

/// Summary of one optimization pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OptimizeStats {
    pub raw_vertices: usize,
    pub positions: usize,
    pub normals: usize,
    pub uvs: usize,
    /// Normals were present but every pooled normal was degenerate
    pub normals_dropped: bool,
    pub triangles: usize,
}

/// Order-stable pool of canonical tuples
struct AttributePool {
    lookup: HashMap<String, u32>,
    entries: Vec<String>,
    /// Pool index of each raw tuple, by raw position
    remap: Vec<u32>,
}

impl AttributePool {
    /// Pool `data` in tuples of `width`, calling `on_insert` for each
    /// tuple that introduces a new key
    fn build(data: &[f32], width: usize, mut on_insert: impl FnMut(&[f32])) -> Self {
        let tuples = data.len() / width;
        let mut pool = Self {
            lookup: HashMap::with_capacity(tuples),
            entries: Vec::new(),
            remap: Vec::with_capacity(tuples),
        };

        for tuple in data.chunks_exact(width) {
            let key = canonical_key(tuple);
            let index = match pool.lookup.get(&key) {
                Some(&index) => index,
                None => {
                    let index = pool.entries.len() as u32;
                    on_insert(tuple);
                    pool.lookup.insert(key.clone(), index);
                    pool.entries.push(key);
                    index
                }
            };
            pool.remap.push(index);
        }

        pool
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

/// Deduplicate the model's attributes and remap every group's faces
///
/// Raw arrays and raw indices are kept, so running this again on its own
/// output produces identical pools and faces.
pub fn optimize(model: DxmModel) -> Result<DxmModel, OptimizeError> {
    optimize_with_stats(model).map(|(model, _)| model)
}

/// [`optimize`], also returning what was merged
pub fn optimize_with_stats(
    mut model: DxmModel,
) -> Result<(DxmModel, OptimizeStats), OptimizeError> {
    tracing::info!("## Optimizing DXM ##");

    let vertex_count = model.vertex_count();

    tracing::info!("Processing vertices...");
    let positions = AttributePool::build(&model.positions, 3, |_| {});

    let mut normals_dropped = false;
    let normals = match model.normals.as_deref() {
        Some(raw) => {
            tracing::info!("Processing normals...");
            let mut only_zeroes = true;
            let pool = AttributePool::build(raw, 3, |n| {
                if only_zeroes {
                    only_zeroes = n[0] * n[0] + n[1] * n[1] + n[2] * n[2] <= NORMALS_EPSILON;
                }
            });
            if only_zeroes {
                tracing::warn!("All normals are effectively zero, ignoring...");
                normals_dropped = true;
                None
            } else {
                Some(pool)
            }
        }
        None => None,
    };

    let uvs = model.uvs.as_deref().map(|raw| {
        tracing::info!("Processing UVs...");
        AttributePool::build(raw, 2, |_| {})
    });

    tracing::info!("Updating model indices...");
    let mut triangles = 0;
    for (i, group) in model.groups.iter_mut().enumerate() {
        group.faces = remap_group(
            i,
            group,
            vertex_count,
            &positions,
            normals.as_ref(),
            uvs.as_ref(),
        )?;
        if let Some(faces) = &group.faces {
            triangles += faces.triangle_count();
        }
    }

    let stats = OptimizeStats {
        raw_vertices: vertex_count,
        positions: positions.len(),
        normals: normals.as_ref().map_or(0, AttributePool::len),
        uvs: uvs.as_ref().map_or(0, AttributePool::len),
        normals_dropped,
        triangles,
    };

    tracing::info!("Updating model data...");
    model.pools = Some(AttributePools {
        positions: positions.entries,
        normals: normals.map(|p| p.entries),
        uvs: uvs.map(|p| p.entries),
    });

    tracing::info!(
        "Optimized: {} -> {} positions, {} normals, {} uvs, {} triangles",
        stats.raw_vertices,
        stats.positions,
        stats.normals,
        stats.uvs,
        stats.triangles
    );

    Ok((model, stats))
}

/// Build pool indices for one group's face corners
///
/// Groups without raw indices carry no faces.
fn remap_group(
    group_index: usize,
    group: &DxmGroup,
    vertex_count: usize,
    positions: &AttributePool,
    normals: Option<&AttributePool>,
    uvs: Option<&AttributePool>,
) -> Result<Option<FaceIndices>, OptimizeError> {
    let Some(indices) = &group.indices else {
        return Ok(None);
    };

    let len = indices.len();
    let mut faces = FaceIndices {
        positions: Vec::with_capacity(len),
        normals: normals.map(|_| Vec::with_capacity(len)),
        uvs: uvs.map(|_| Vec::with_capacity(len)),
    };

    for raw in indices.iter() {
        let vertex = raw as usize;
        if vertex >= vertex_count {
            return Err(OptimizeError::IndexOutOfRange {
                group: group_index,
                index: raw,
                vertex_count,
            });
        }

        faces.positions.push(positions.remap[vertex]);
        if let (Some(out), Some(pool)) = (faces.normals.as_mut(), normals) {
            out.push(pool.remap[vertex]);
        }
        if let (Some(out), Some(pool)) = (faces.uvs.as_mut(), uvs) {
            out.push(pool.remap[vertex]);
        }
    }

    if len % 3 != 0 {
        tracing::warn!(
            "Group {}: {} trailing index corners do not form a triangle",
            group_index,
            len % 3
        );
    }

    tracing::debug!("Group {}: {} triangles", group_index, len / 3);
    Ok(Some(faces))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dxm_format::{DxmHeader, Indices, VertexLayout};

    fn mesh_model(
        positions: &[[f32; 3]],
        normals: &[[f32; 3]],
        uvs: &[[f32; 2]],
        indices: Indices,
    ) -> DxmModel {
        let header =
            DxmHeader::new(VertexLayout::Mesh, positions.len() as u64, 1, indices.byte_width());
        let mut model = DxmModel::new(header);
        model.positions = positions.iter().flatten().copied().collect();
        model.normals = Some(normals.iter().flatten().copied().collect());
        model.uvs = Some(uvs.iter().flatten().copied().collect());
        model.groups = vec![DxmGroup {
            length: indices.len() as u64,
            texture: Some("t.png".to_string()),
            indices: Some(indices),
            ..Default::default()
        }];
        model
    }

    fn quad() -> DxmModel {
        // Two triangles sharing an edge, with the shared corners split
        mesh_model(
            &[
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            &[[0.0, 0.0, 1.0]; 6],
            &[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
            Indices::U16(vec![0, 1, 2, 3, 4, 5]),
        )
    }

    #[test]
    fn test_pools_keep_first_occurrence_order() {
        let (model, stats) = optimize_with_stats(quad()).unwrap();
        let pools = model.pools.unwrap();

        assert_eq!(pools.positions, vec!["0 0 0", "1 0 0", "1 1 0", "0 1 0"]);
        assert_eq!(pools.normals, Some(vec!["0 0 1".to_string()]));
        assert_eq!(pools.uvs, Some(vec!["0 0".into(), "1 0".into(), "1 1".into(), "0 1".into()]));

        let faces = model.groups[0].faces.as_ref().unwrap();
        assert_eq!(faces.positions, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(faces.normals, Some(vec![0; 6]));
        assert_eq!(faces.uvs, Some(vec![0, 1, 2, 0, 2, 3]));

        assert_eq!(stats.raw_vertices, 6);
        assert_eq!(stats.positions, 4);
        assert_eq!(stats.triangles, 2);
        assert!(!stats.normals_dropped);
    }

    #[test]
    fn test_pool_index_is_first_occurrence_regardless_of_order() {
        let a = [5.0, 5.0, 5.0];
        let b = [-1.0, 2.0, 0.5];
        let model = mesh_model(
            &[b, a, b, a],
            &[[0.0, 1.0, 0.0]; 4],
            &[[0.0, 0.0]; 4],
            Indices::U16(vec![3, 2, 1]),
        );

        let model = optimize(model).unwrap();
        let pools = model.pools.as_ref().unwrap();
        assert_eq!(pools.positions, vec!["-1 2 0.5", "5 5 5"]);
        assert_eq!(model.groups[0].faces.as_ref().unwrap().positions, vec![1, 0, 1]);
    }

    #[test]
    fn test_optimize_is_idempotent() {
        let once = optimize(quad()).unwrap();
        let twice = optimize(once.clone()).unwrap();

        assert_eq!(once.pools, twice.pools);
        assert_eq!(once.groups, twice.groups);
    }

    #[test]
    fn test_near_duplicates_merge() {
        let model = mesh_model(
            &[[1.0, 2.0, 3.0], [1.0000001, 2.0, 3.0], [1.0001, 2.0, 3.0]],
            &[[0.0, 0.0, 1.0]; 3],
            &[[0.0, 0.0]; 3],
            Indices::U32(vec![0, 1, 2]),
        );

        let model = optimize(model).unwrap();
        assert_eq!(
            model.pools.unwrap().positions,
            vec!["1 2 3", "1.0001 2 3"]
        );
        assert_eq!(model.groups[0].faces.as_ref().unwrap().positions, vec![0, 0, 1]);
    }

    #[test]
    fn test_degenerate_normals_dropped() {
        let model = mesh_model(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0.0009999, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
            &[[0.0, 0.0]; 3],
            Indices::U16(vec![0, 1, 2]),
        );

        let (model, stats) = optimize_with_stats(model).unwrap();
        assert!(stats.normals_dropped);
        assert_eq!(model.pools.as_ref().unwrap().normals, None);
        let faces = model.groups[0].faces.as_ref().unwrap();
        assert_eq!(faces.normals, None);
        assert!(faces.uvs.is_some());
    }

    #[test]
    fn test_small_but_real_normal_kept() {
        let model = mesh_model(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0.0011, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
            &[[0.0, 0.0]; 3],
            Indices::U16(vec![0, 1, 2]),
        );

        let (model, stats) = optimize_with_stats(model).unwrap();
        assert!(!stats.normals_dropped);
        assert_eq!(
            model.pools.unwrap().normals,
            Some(vec!["0.0011 0 0".to_string(), "0 0 0".to_string()])
        );
    }

    #[test]
    fn test_degeneracy_only_checked_until_first_real_normal() {
        let model = mesh_model(
            &[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            &[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]],
            &[[0.0, 0.0]; 3],
            Indices::U16(vec![0, 1, 2]),
        );

        let model = optimize(model).unwrap();
        assert_eq!(model.pools.unwrap().normals.map(|n| n.len()), Some(2));
    }

    #[test]
    fn test_group_without_indices_skipped() {
        let mut model = quad();
        model.groups.push(DxmGroup {
            texture: None,
            ..Default::default()
        });

        let model = optimize(model).unwrap();
        assert!(model.groups[0].faces.is_some());
        assert!(model.groups[1].faces.is_none());
    }

    #[test]
    fn test_index_out_of_range() {
        let mut model = quad();
        model.groups[0].indices = Some(Indices::U16(vec![0, 1, 6]));

        assert_eq!(
            optimize(model).unwrap_err(),
            OptimizeError::IndexOutOfRange {
                group: 0,
                index: 6,
                vertex_count: 6,
            }
        );
    }

    #[test]
    fn test_point_cloud_has_positions_only() {
        let header = DxmHeader::new(VertexLayout::PointCloud, 3, 1, 2);
        let mut model = DxmModel::new(header);
        model.positions = vec![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        model.colors = Some(vec![255; 12]);
        model.groups = vec![DxmGroup {
            indices: Some(Indices::U16(vec![0, 1, 2])),
            ..Default::default()
        }];

        let model = optimize(model).unwrap();
        let pools = model.pools.as_ref().unwrap();
        assert_eq!(pools.positions.len(), 2);
        assert!(pools.normals.is_none());
        assert!(pools.uvs.is_none());

        let faces = model.groups[0].faces.as_ref().unwrap();
        assert_eq!(faces.positions, vec![0, 0, 1]);
        assert!(faces.normals.is_none());
        assert!(faces.uvs.is_none());
    }
}
