//! A small set of vanilla blocks and items used by the default generator and the host.

use loam_utils::Identifier;

use crate::{BlockData, BlockRegistry, BlockState, ItemRegistry, PropertyValue};

/// `minecraft:stone`
pub const STONE: Identifier = Identifier::vanilla_static("stone");
/// `minecraft:dirt`
pub const DIRT: Identifier = Identifier::vanilla_static("dirt");
/// `minecraft:grass_block`
pub const GRASS_BLOCK: Identifier = Identifier::vanilla_static("grass_block");
/// `minecraft:bedrock`
pub const BEDROCK: Identifier = Identifier::vanilla_static("bedrock");
/// `minecraft:sand`
pub const SAND: Identifier = Identifier::vanilla_static("sand");
/// `minecraft:glass`
pub const GLASS: Identifier = Identifier::vanilla_static("glass");
/// `minecraft:glowstone`
pub const GLOWSTONE: Identifier = Identifier::vanilla_static("glowstone");
/// `minecraft:water`
pub const WATER: Identifier = Identifier::vanilla_static("water");
/// `minecraft:lava`
pub const LAVA: Identifier = Identifier::vanilla_static("lava");

const LIQUID_LEVELS: i32 = 16;

/// Registers the basic block states.
pub fn register_blocks(blocks: &mut BlockRegistry) {
    for name in [STONE, DIRT, GRASS_BLOCK, BEDROCK, SAND] {
        blocks.register(BlockState::new(name));
    }
    blocks.register_with(BlockState::new(GLASS), BlockData::TRANSPARENT);
    blocks.register_with(
        BlockState::new(GLOWSTONE),
        BlockData {
            light_emission: 15,
            light_filter: 15,
            liquid: false,
        },
    );
    for level in 0..LIQUID_LEVELS {
        blocks.register_with(
            BlockState::new(WATER).with("level", PropertyValue::Int(level)),
            BlockData {
                light_emission: 0,
                light_filter: 2,
                liquid: true,
            },
        );
        blocks.register_with(
            BlockState::new(LAVA).with("level", PropertyValue::Int(level)),
            BlockData {
                light_emission: 15,
                light_filter: 2,
                liquid: true,
            },
        );
    }
}

/// Registers block items for the basic blocks plus a few plain items.
pub fn register_items(items: &mut ItemRegistry) {
    for name in [STONE, DIRT, GRASS_BLOCK, SAND, GLASS, GLOWSTONE] {
        items.register(name);
    }
    for name in ["stick", "bucket", "water_bucket", "lava_bucket"] {
        items.register(Identifier::vanilla_static(name));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_liquid_states_registered() {
        let mut blocks = BlockRegistry::new();
        register_blocks(&mut blocks);
        let still = BlockState::new(WATER).with("level", PropertyValue::Int(0));
        let id = blocks.id_of(&still).expect("water registered");
        assert!(blocks.data(id).liquid);
        assert_eq!(blocks.default_state(&WATER), Some(id));
        assert!(!blocks.data(BlockRegistry::AIR).liquid);
    }
}
