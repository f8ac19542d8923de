//! Block Catalogue
//!
//! Every voxel holds one [`BlockType`]. The type decides how the cell
//! behaves for movement, ground detection and explosions:
//!
//! | Block      | Solid | Ground | Blast            |
//! |------------|-------|--------|------------------|
//! | Air        | no    | no     | nothing to break |
//! | Grass/Dirt | yes   | yes    | destroyed        |
//! | Wood       | yes   | yes    | destroyed        |
//! | Leaves     | yes   | no     | destroyed        |
//! | Stone      | yes   | yes    | immune, occludes |
//! | Bedrock    | yes   | yes    | immune           |
//! | Explosive  | yes   | yes    | chain-detonates  |
//! | Flower, Torch, Wire, Fire | no | no | destroyed |

use serde::{Deserialize, Serialize};

/// Terrain category stored in each voxel.
#[repr(u8)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockType {
    #[default]
    Air = 0,
    Grass = 1,
    Dirt = 2,
    Stone = 3,
    Wood = 4,
    Leaves = 5,
    Explosive = 6,
    Bedrock = 7,
    Flower = 8,
    Torch = 9,
    Wire = 10,
    Fire = 11,
}

static_assertions::assert_eq_size!(BlockType, u8);

impl BlockType {
    /// All block types, in id order.
    pub const ALL: [BlockType; 12] = [
        BlockType::Air,
        BlockType::Grass,
        BlockType::Dirt,
        BlockType::Stone,
        BlockType::Wood,
        BlockType::Leaves,
        BlockType::Explosive,
        BlockType::Bedrock,
        BlockType::Flower,
        BlockType::Torch,
        BlockType::Wire,
        BlockType::Fire,
    ];

    #[inline]
    pub fn is_air(self) -> bool {
        self == BlockType::Air
    }

    /// Low-profile decoration that entities walk through.
    #[inline]
    pub fn is_low_profile(self) -> bool {
        matches!(
            self,
            BlockType::Flower | BlockType::Torch | BlockType::Wire | BlockType::Fire
        )
    }

    /// Blocks movement.
    #[inline]
    pub fn is_solid(self) -> bool {
        !self.is_air() && !self.is_low_profile()
    }

    /// Something a creature can stand on. Leaves are solid but never count
    /// as ground.
    #[inline]
    pub fn is_ground(self) -> bool {
        self.is_solid() && self != BlockType::Leaves
    }

    /// Explosions never destroy these.
    #[inline]
    pub fn is_blast_immune(self) -> bool {
        matches!(self, BlockType::Stone | BlockType::Bedrock)
    }

    /// Shields cells behind it from a blast.
    #[inline]
    pub fn is_blast_opaque(self) -> bool {
        self == BlockType::Stone
    }

    /// The player may break this block by hand.
    #[inline]
    pub fn is_breakable(self) -> bool {
        !self.is_air() && self != BlockType::Bedrock
    }

    pub fn from_u8(id: u8) -> Option<Self> {
        Self::ALL.get(id as usize).copied()
    }

    #[inline]
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockType::Air => "Air",
            BlockType::Grass => "Grass",
            BlockType::Dirt => "Dirt",
            BlockType::Stone => "Stone",
            BlockType::Wood => "Wood",
            BlockType::Leaves => "Leaves",
            BlockType::Explosive => "Explosive",
            BlockType::Bedrock => "Bedrock",
            BlockType::Flower => "Flower",
            BlockType::Torch => "Torch",
            BlockType::Wire => "Wire",
            BlockType::Fire => "Fire",
        }
    }
}

impl std::fmt::Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
