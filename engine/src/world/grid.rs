//! Grid Geometry
//!
//! Conversions between world space and voxel cells, plus the voxel DDA
//! traversal shared by view-ray picking and blast occlusion.
//!
//! ## Units
//! - 1 unit = 1 block edge
//! - cell `(x, y, z)` covers `[x, x+1) × [y, y+1) × [z, z+1)`
//! - entity positions are feet positions in world units

use glam::{IVec3, Vec3};

/// Cell containing a world-space point.
#[inline]
pub fn world_to_cell(p: Vec3) -> IVec3 {
    IVec3::new(p.x.floor() as i32, p.y.floor() as i32, p.z.floor() as i32)
}

/// World-space center of a cell.
#[inline]
pub fn cell_center(cell: IVec3) -> Vec3 {
    cell.as_vec3() + Vec3::splat(0.5)
}

/// Clamp a horizontal position into `[margin, size - margin]` on X and Z.
///
/// Y is preserved; vertical bounds are handled by gravity and the
/// fall-out check.
pub fn clamp_to_world(pos: Vec3, size: i32, margin: f32) -> Vec3 {
    let margin = margin.min(size as f32 * 0.5);
    let max = size as f32 - margin;
    Vec3::new(pos.x.clamp(margin, max), pos.y, pos.z.clamp(margin, max))
}

/// Result of walking a ray through the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridStep {
    /// Cell entered at this step
    pub cell: IVec3,
    /// Ray parameter (distance from the origin) where the cell was entered
    pub t: f32,
    /// Face normal of the entered face (zero for the starting cell)
    pub normal: IVec3,
}

/// Ray parameters closer than this count as a tie between axes.
const TIE_EPSILON: f32 = 1e-5;

/// Walk every cell a segment passes through, starting with the cell that
/// contains `start`, in order of increasing distance.
///
/// Where the segment crosses an edge or corner of the grid exactly, every
/// cell touching that edge or corner is visited before the cell beyond it.
/// Stops once the segment length is exceeded or `visit` returns `false`.
pub fn walk_segment(start: Vec3, end: Vec3, mut visit: impl FnMut(GridStep) -> bool) {
    let seg = end - start;
    let len = seg.length();
    let mut cell = world_to_cell(start);
    if !visit(GridStep {
        cell,
        t: 0.0,
        normal: IVec3::ZERO,
    }) {
        return;
    }
    if !len.is_finite() || len <= 1e-6 {
        return;
    }
    let dir = seg / len;

    let step = [sign_i(dir.x), sign_i(dir.y), sign_i(dir.z)];
    let origin = start.to_array();
    let dir_arr = dir.to_array();
    let mut t_max = [0.0f32; 3];
    let mut t_delta = [0.0f32; 3];
    for axis in 0..3 {
        t_max[axis] = dda_t_max(origin[axis], dir_arr[axis], cell.to_array()[axis], step[axis]);
        t_delta[axis] = dda_t_delta(dir_arr[axis]);
    }

    let max_steps = (len.ceil() as usize).saturating_mul(3).saturating_add(4);
    for _ in 0..max_steps {
        let t = t_max[0].min(t_max[1]).min(t_max[2]);
        if t > len {
            break;
        }
        let tied = [0, 1, 2].map(|axis| t_max[axis] - t <= TIE_EPSILON);

        if tied.iter().filter(|&&hit| hit).count() > 1 {
            // Cells sharing only the crossed edge or corner
            for mask in 1u8..7 {
                let subset = [mask & 1 != 0, mask & 2 != 0, mask & 4 != 0];
                if subset == tied || (0..3).any(|axis| subset[axis] && !tied[axis]) {
                    continue;
                }
                let side = GridStep {
                    cell: cell + axis_offset(subset, step),
                    t,
                    normal: entry_normal(subset, step),
                };
                if !visit(side) {
                    return;
                }
            }
        }

        for axis in 0..3 {
            if tied[axis] {
                t_max[axis] += t_delta[axis];
            }
        }
        cell += axis_offset(tied, step);
        if !visit(GridStep {
            cell,
            t,
            normal: entry_normal(tied, step),
        }) {
            break;
        }
    }
}

fn axis_offset(axes: [bool; 3], step: [i32; 3]) -> IVec3 {
    IVec3::from_array([0, 1, 2].map(|axis| if axes[axis] { step[axis] } else { 0 }))
}

/// Normal of the face crossed along the first stepped axis.
fn entry_normal(axes: [bool; 3], step: [i32; 3]) -> IVec3 {
    let mut normal = [0; 3];
    if let Some(axis) = (0..3).find(|&axis| axes[axis]) {
        normal[axis] = -step[axis];
    }
    IVec3::from_array(normal)
}

fn sign_i(v: f32) -> i32 {
    if v > 0.0 {
        1
    } else if v < 0.0 {
        -1
    } else {
        0
    }
}

fn dda_t_delta(dir_component: f32) -> f32 {
    if dir_component.abs() < 1e-6 {
        f32::INFINITY
    } else {
        1.0 / dir_component.abs()
    }
}

fn dda_t_max(origin_component: f32, dir_component: f32, cell: i32, step: i32) -> f32 {
    if step == 0 || dir_component.abs() < 1e-6 {
        return f32::INFINITY;
    }
    let boundary = if step > 0 {
        cell as f32 + 1.0
    } else {
        cell as f32
    };
    (boundary - origin_component) / dir_component
}
