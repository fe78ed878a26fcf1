//! Sounds, particles and block events that a [`Handler`](super::Handler) may cancel.

use loam_registry::BlockRegistry;
use loam_utils::{
    BlockPos, BlockStateId, ChunkPos,
    math::{Aabb, Vector3},
};

use super::{Context, Explosion, Particle, SetOpts, Sound, Tx};

/// The largest radius [`Tx::explode`] honours.
pub const MAX_EXPLOSION_RADIUS: f64 = 64.0;

impl Tx<'_> {
    /// Plays a sound to the viewers of the column containing `pos`, unless the handler cancels it.
    pub fn play_sound(&mut self, pos: Vector3<f64>, sound: Sound) {
        let mut ctx = Context::new();
        self.state.handler.handle_sound(&mut ctx, &sound, pos);
        if ctx.is_cancelled() {
            return;
        }
        if let Some(column) = self.state.chunks.get(ChunkPos::from_vec(pos)) {
            for entry in &column.viewers {
                entry.viewer.view_sound(pos, &sound);
            }
        }
    }

    /// Shows a particle to the viewers of the column containing `pos`.
    pub fn add_particle(&mut self, pos: Vector3<f64>, particle: &Particle) {
        if let Some(column) = self.state.chunks.get(ChunkPos::from_vec(pos)) {
            for entry in &column.viewers {
                entry.viewer.view_particle(pos, particle);
            }
        }
    }

    /// Lets `liquid` flow from `from` into `into`. Returns false if the handler cancelled it.
    pub fn flow_liquid(&mut self, from: BlockPos, into: BlockPos, liquid: BlockStateId) -> bool {
        let replaced = self.block(into);
        let mut ctx = Context::new();
        self.state
            .handler
            .handle_liquid_flow(&mut ctx, from, into, liquid, replaced);
        if ctx.is_cancelled() {
            return false;
        }
        self.set_liquid(into, Some(liquid));
        true
    }

    /// Replaces the liquid at `pos` with `after`, or removes it. Returns false
    /// if there is no liquid or the handler cancelled the change.
    pub fn decay_liquid(&mut self, pos: BlockPos, after: Option<BlockStateId>) -> bool {
        let Some(before) = self.liquid(pos) else {
            return false;
        };
        let mut ctx = Context::new();
        self.state
            .handler
            .handle_liquid_decay(&mut ctx, pos, before, after);
        if ctx.is_cancelled() {
            return false;
        }
        self.set_liquid(pos, after);
        true
    }

    /// Spreads `fire` from `from` to `to`. Returns false if the handler cancelled it.
    pub fn spread_fire(&mut self, from: BlockPos, to: BlockPos, fire: BlockStateId) -> bool {
        let mut ctx = Context::new();
        self.state.handler.handle_fire_spread(&mut ctx, from, to);
        if ctx.is_cancelled() {
            return false;
        }
        self.set_block(to, fire, SetOpts::default());
        true
    }

    /// Burns the block at `pos` away. Returns false if the handler cancelled it.
    pub fn burn_block(&mut self, pos: BlockPos) -> bool {
        let mut ctx = Context::new();
        self.state.handler.handle_block_burn(&mut ctx, pos);
        if ctx.is_cancelled() {
            return false;
        }
        self.set_block(pos, BlockRegistry::AIR, SetOpts::default());
        self.play_sound(pos.bottom_center(), Sound::BURN);
        true
    }

    /// Blows up every non air block and finds every entity within `radius` of `center`.
    ///
    /// The handler may shrink the lists or cancel the explosion. Blocks left in
    /// the list are removed; the returned explosion tells the caller which
    /// entities to damage. `None` if the handler cancelled it, or if the radius
    /// or centre isn't finite. Radii are capped at [`MAX_EXPLOSION_RADIUS`].
    pub fn explode(&mut self, center: Vector3<f64>, radius: f64) -> Option<Explosion> {
        if !(radius.is_finite() && radius >= 0.0)
            || !(center.x.is_finite() && center.y.is_finite() && center.z.is_finite())
        {
            return None;
        }
        let radius = radius.min(MAX_EXPLOSION_RADIUS);
        let radius_squared = radius * radius;
        let reach = radius.ceil() as i32;
        let origin = BlockPos::from_vec(center);
        let mut blocks = Vec::new();
        for dx in -reach..=reach {
            for dy in -reach..=reach {
                for dz in -reach..=reach {
                    let (Some(x), Some(y), Some(z)) = (
                        origin.x().checked_add(dx),
                        origin.y().checked_add(dy),
                        origin.z().checked_add(dz),
                    ) else {
                        continue;
                    };
                    let pos = BlockPos::new(x, y, z);
                    let offset = pos.bottom_center() + Vector3::new(0.0, 0.5, 0.0) - center;
                    if offset.length_squared() <= radius_squared
                        && self.block(pos) != BlockRegistry::AIR
                    {
                        blocks.push(pos);
                    }
                }
            }
        }
        let entities = self
            .entities_within(Aabb::new(center, center).grow(radius))
            .into_iter()
            .filter(|h| {
                self.entity(*h)
                    .is_some_and(|e| e.position().distance(center) <= radius)
            })
            .collect();
        let mut explosion = Explosion {
            center,
            entities,
            blocks,
            radius,
        };

        let mut ctx = Context::new();
        self.state.handler.handle_explosion(&mut ctx, &mut explosion);
        if ctx.is_cancelled() {
            return None;
        }
        for pos in &explosion.blocks {
            self.set_block(*pos, BlockRegistry::AIR, SetOpts::default());
        }
        self.play_sound(center, Sound::EXPLOSION);
        Some(explosion)
    }
}
