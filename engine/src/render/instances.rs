//! Render Instances - per-frame snapshots handed to the rendering layer
//!
//! The simulation never touches meshes. Each frame the game layer flattens
//! its creature and debris rosters into these tightly packed records, which
//! the renderer uploads as instance buffers.

/// Flag bit: creature is currently walking (legs animated).
pub const FLAG_WALKING: u32 = 1 << 0;
/// Flag bit: creature is standing on ground.
pub const FLAG_GROUNDED: u32 = 1 << 1;

/// Debris kind offset for creature-derived ragdoll pieces. Block debris uses
/// the raw block code (`0..=255`), ragdolls use `CREATURE_DEBRIS_BASE + species`.
pub const CREATURE_DEBRIS_BASE: u32 = 0x100;

/// One live creature.
///
/// Layout (32 bytes):
///   offset  0: position (feet, world space) = 12 bytes
///   offset 12: heading (radians)            = 4 bytes
///   offset 16: leg_swing (radians)          = 4 bytes
///   offset 20: species tag                  = 4 bytes
///   offset 24: model height                 = 4 bytes
///   offset 28: flags                        = 4 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CreatureInstance {
    pub position: [f32; 3],
    pub heading: f32,
    pub leg_swing: f32,
    pub species: u32,
    pub height: f32,
    pub flags: u32,
}

impl CreatureInstance {
    #[inline]
    pub fn is_walking(&self) -> bool {
        self.flags & FLAG_WALKING != 0
    }

    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.flags & FLAG_GROUNDED != 0
    }
}

/// One debris fragment or ragdoll piece.
///
/// Layout (32 bytes):
///   offset  0: position = 12 bytes
///   offset 12: scale    = 4 bytes
///   offset 16: rotation (euler, radians) = 12 bytes
///   offset 28: kind     = 4 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DebrisInstance {
    pub position: [f32; 3],
    pub scale: f32,
    pub rotation: [f32; 3],
    pub kind: u32,
}

impl DebrisInstance {
    /// Whether this piece came from a creature rather than a block.
    #[inline]
    pub fn is_ragdoll(&self) -> bool {
        self.kind >= CREATURE_DEBRIS_BASE
    }
}

static_assertions::assert_eq_size!(CreatureInstance, [u8; 32]);
static_assertions::assert_eq_size!(DebrisInstance, [u8; 32]);

/// View a slice of instances as raw bytes for upload.
pub fn as_bytes<T: bytemuck::Pod>(instances: &[T]) -> &[u8] {
    bytemuck::cast_slice(instances)
}
