//! Fixed-size particle population advected through a vector field.
//!
//! Particles are never added or removed after seeding. A particle whose
//! lifetime runs out, or that drifts past any margin, is respawned in place
//! near the left edge, where the rightward drift carries it back across the
//! surface.

use flowfield_core::prng::{jitter_hash, Xorshift64};
use flowfield_core::sampler::VectorField;
use flowfield_core::stimulus::StimulusState;
use flowfield_core::surface::SurfaceDimensions;
use glam::DVec2;

/// Initial ages are drawn from [0, INITIAL_LIFE_MAX).
const INITIAL_LIFE_MAX: u32 = 100;
/// Lifetimes are drawn from [TTL_MIN, TTL_MAX).
pub const TTL_MIN: u32 = 100;
pub const TTL_MAX: u32 = 300;
/// A particle is recycled once `x > width + EXIT_MARGIN_X`.
pub const EXIT_MARGIN_X: f64 = 10.0;
/// A particle is recycled once `y < -EXIT_MARGIN_Y` or `y > height + EXIT_MARGIN_Y`.
pub const EXIT_MARGIN_Y: f64 = 20.0;
/// Respawned particles enter at or right of `x = -ENTRY_MARGIN`, and a
/// particle that drifts left of it is recycled.
pub const ENTRY_MARGIN: f64 = 10.0;

/// Advection speed multiplier at rest.
const BASE_SPEED: f64 = 0.9;
/// Extra speed at full burst energy.
const BURST_SPEED: f64 = 1.1;

/// One particle: logical position, age in frames, and lifetime budget in frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub pos: DVec2,
    pub life: u32,
    pub ttl: u32,
}

/// Speed multiplier for a given burst energy.
pub fn speed_for_burst(burst_energy: f64) -> f64 {
    BASE_SPEED + burst_energy * BURST_SPEED
}

/// Owns the particle population and the generator used for respawn draws.
#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: Xorshift64,
}

impl ParticleSystem {
    /// Seeds `density` particles uniformly over the surface with random ages and lifetimes.
    pub fn new(density: usize, dims: &SurfaceDimensions, seed: u64) -> Self {
        let mut rng = Xorshift64::new(seed);
        let particles = (0..density)
            .map(|_| Particle {
                pos: DVec2::new(
                    rng.next_range(0.0, dims.width()),
                    rng.next_range(0.0, dims.height()),
                ),
                life: rng.next_u32_range(0, INITIAL_LIFE_MAX),
                ttl: rng.next_u32_range(TTL_MIN, TTL_MAX),
            })
            .collect();
        Self { particles, rng }
    }

    /// Builds a system from explicit particles.
    pub fn from_particles(particles: Vec<Particle>, seed: u64) -> Self {
        Self {
            particles,
            rng: Xorshift64::new(seed),
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Drops the particle buffer.
    pub fn release(&mut self) {
        self.particles = Vec::new();
    }

    /// Advances every particle by one frame.
    ///
    /// For each particle: age it, respawn it if its lifetime is spent, step
    /// it along `field` scaled by the burst-dependent speed, report the
    /// segment it travelled to `draw`, then recycle it if it left the
    /// margins. `dims` must be the dimensions captured at the start of the tick.
    pub fn advance<F>(
        &mut self,
        field: &F,
        dims: &SurfaceDimensions,
        t: f64,
        stimulus: &StimulusState,
        mut draw: impl FnMut(DVec2, DVec2),
    ) where
        F: VectorField + ?Sized,
    {
        let speed = speed_for_burst(stimulus.burst_energy());
        let left = -ENTRY_MARGIN;
        let right = dims.width() + EXIT_MARGIN_X;
        let top = -EXIT_MARGIN_Y;
        let bottom = dims.height() + EXIT_MARGIN_Y;
        let Self { particles, rng } = self;

        for (i, p) in particles.iter_mut().enumerate() {
            p.life += 1;
            if p.life > p.ttl {
                let x = -ENTRY_MARGIN + jitter_hash(i as f64, t) * 2.0 * ENTRY_MARGIN;
                respawn(p, x, rng, dims);
            }

            let next = p.pos + field.velocity(p.pos, t, stimulus) * speed;
            draw(p.pos, next);
            p.pos = next;

            let outside = next.x < left || next.x > right || next.y < top || next.y > bottom;
            if !next.is_finite() || outside {
                let x = rng.next_range(-ENTRY_MARGIN, 0.0);
                respawn(p, x, rng, dims);
            }
        }
    }
}

/// Resets a particle at horizontal position `x` with a fresh y, age and lifetime.
fn respawn(p: &mut Particle, x: f64, rng: &mut Xorshift64, dims: &SurfaceDimensions) {
    p.pos = DVec2::new(x, rng.next_range(0.0, dims.height()));
    p.life = 0;
    p.ttl = rng.next_u32_range(TTL_MIN, TTL_MAX);
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowfield_core::field::ScalarField;
    use flowfield_core::sampler::ContourSampler;

    /// Same velocity everywhere.
    struct Uniform(DVec2);

    impl VectorField for Uniform {
        fn velocity(&self, _pos: DVec2, _t: f64, _stimulus: &StimulusState) -> DVec2 {
            self.0
        }
    }

    fn dims(w: f64, h: f64) -> SurfaceDimensions {
        SurfaceDimensions::new(w, h, 1.0).unwrap()
    }

    fn particle(x: f64, y: f64, life: u32, ttl: u32) -> Particle {
        Particle {
            pos: DVec2::new(x, y),
            life,
            ttl,
        }
    }

    fn idle() -> StimulusState {
        StimulusState::default()
    }

    #[test]
    fn seeding_fills_surface_with_requested_density() {
        let d = dims(800.0, 600.0);
        let system = ParticleSystem::new(1200, &d, 42);
        assert_eq!(system.len(), 1200);
        for p in system.particles() {
            assert!((0.0..800.0).contains(&p.pos.x));
            assert!((0.0..600.0).contains(&p.pos.y));
            assert!(p.life < INITIAL_LIFE_MAX);
            assert!((TTL_MIN..TTL_MAX).contains(&p.ttl));
        }
    }

    #[test]
    fn seeding_is_reproducible() {
        let d = dims(320.0, 240.0);
        let a = ParticleSystem::new(50, &d, 9);
        let b = ParticleSystem::new(50, &d, 9);
        assert_eq!(a.particles(), b.particles());
    }

    #[test]
    fn advance_moves_by_velocity_times_speed() {
        let d = dims(100.0, 100.0);
        let mut system = ParticleSystem::from_particles(vec![particle(10.0, 50.0, 0, 200)], 1);
        let mut segments = Vec::new();
        system.advance(&Uniform(DVec2::new(1.0, 0.5)), &d, 0.0, &idle(), |a, b| {
            segments.push((a, b))
        });
        let expected = DVec2::new(10.0 + 0.9, 50.0 + 0.45);
        assert_eq!(segments, vec![(DVec2::new(10.0, 50.0), expected)]);
        assert!((system.particles()[0].pos - expected).length() < 1e-12);
        assert_eq!(system.particles()[0].life, 1);
    }

    #[test]
    fn burst_energy_raises_speed() {
        assert_eq!(speed_for_burst(0.0), 0.9);
        assert!((speed_for_burst(1.0) - 2.0).abs() < 1e-12);
        let d = dims(100.0, 100.0);
        let mut system = ParticleSystem::from_particles(vec![particle(10.0, 50.0, 0, 200)], 1);
        let mut burst = idle();
        burst.burst();
        system.advance(&Uniform(DVec2::X), &d, 0.0, &burst, |_, _| {});
        assert!((system.particles()[0].pos.x - 12.0).abs() < 1e-12);
    }

    #[test]
    fn particle_leaving_right_edge_reenters_left_in_same_tick() {
        let d = dims(800.0, 600.0);
        let mut system = ParticleSystem::from_particles(vec![particle(809.5, 300.0, 0, 200)], 3);
        system.advance(&Uniform(DVec2::new(1.0, 0.0)), &d, 0.0, &idle(), |_, _| {});
        let p = system.particles()[0];
        assert!((-ENTRY_MARGIN..0.0).contains(&p.pos.x), "x = {}", p.pos.x);
        assert!((0.0..600.0).contains(&p.pos.y));
        assert_eq!(p.life, 0);
        assert!((TTL_MIN..TTL_MAX).contains(&p.ttl));
    }

    #[test]
    fn particle_leaving_top_or_bottom_is_recycled() {
        let d = dims(800.0, 600.0);
        for (y, dy) in [(-19.9, -1.0), (619.9, 1.0)] {
            let mut system = ParticleSystem::from_particles(vec![particle(400.0, y, 5, 200)], 3);
            system.advance(&Uniform(DVec2::new(0.0, dy)), &d, 0.0, &idle(), |_, _| {});
            let p = system.particles()[0];
            assert!(p.pos.x < 0.0, "not recycled from y = {y}");
            assert!((0.0..600.0).contains(&p.pos.y));
            assert_eq!(p.life, 0);
        }
    }

    #[test]
    fn particle_drifting_past_left_margin_is_recycled() {
        let d = dims(4.0, 3.0);
        let mut system = ParticleSystem::from_particles(vec![particle(-9.5, 1.0, 5, 200)], 3);
        system.advance(&Uniform(DVec2::new(-1.0, 0.0)), &d, 0.0, &idle(), |_, _| {});
        let p = system.particles()[0];
        assert!((-ENTRY_MARGIN..0.0).contains(&p.pos.x), "x = {}", p.pos.x);
        assert_eq!(p.life, 0);
    }

    #[test]
    fn steady_leftward_drift_never_passes_left_margin() {
        let d = dims(20.0, 20.0);
        let mut system = ParticleSystem::new(50, &d, 11);
        for tick in 0..400 {
            system.advance(&Uniform(DVec2::new(-2.0, 0.0)), &d, tick as f64, &idle(), |_, _| {});
            assert!(system.particles().iter().all(|p| p.pos.x >= -ENTRY_MARGIN));
        }
    }

    #[test]
    fn particle_within_margins_is_kept() {
        let d = dims(800.0, 600.0);
        let mut system = ParticleSystem::from_particles(
            vec![particle(809.0, -19.0, 5, 200), particle(-9.0, 619.0, 5, 200)],
            3,
        );
        system.advance(&Uniform(DVec2::ZERO), &d, 0.0, &idle(), |_, _| {});
        assert!(system.particles().iter().all(|p| p.life == 6));
    }

    #[test]
    fn expired_particle_respawns_near_left_edge_with_hash_jitter() {
        let d = dims(800.0, 600.0);
        let mut system = ParticleSystem::from_particles(vec![particle(400.0, 300.0, 150, 150)], 5);
        let mut drawn_from = None;
        system.advance(&Uniform(DVec2::ZERO), &d, 2.5, &idle(), |a, _| drawn_from = Some(a));
        let p = system.particles()[0];
        let expected_x = -ENTRY_MARGIN + jitter_hash(0.0, 2.5) * 2.0 * ENTRY_MARGIN;
        assert_eq!(p.pos.x, expected_x);
        assert!((-ENTRY_MARGIN..ENTRY_MARGIN).contains(&p.pos.x));
        assert_eq!(p.life, 0);
        // The trail segment starts from the respawn point, not the old position.
        assert_eq!(drawn_from, Some(p.pos));
    }

    #[test]
    fn particle_at_ttl_survives_one_more_frame() {
        let d = dims(800.0, 600.0);
        let mut system = ParticleSystem::from_particles(vec![particle(400.0, 300.0, 149, 150)], 5);
        system.advance(&Uniform(DVec2::ZERO), &d, 0.0, &idle(), |_, _| {});
        assert_eq!(system.particles()[0].life, 150);
        system.advance(&Uniform(DVec2::ZERO), &d, 0.0, &idle(), |_, _| {});
        assert_eq!(system.particles()[0].life, 0);
    }

    #[test]
    fn non_finite_velocity_is_recycled_not_propagated() {
        let d = dims(800.0, 600.0);
        let mut system = ParticleSystem::from_particles(vec![particle(400.0, 300.0, 0, 200)], 5);
        system.advance(&Uniform(DVec2::new(f64::NAN, 0.0)), &d, 0.0, &idle(), |_, _| {});
        assert!(system.particles()[0].pos.is_finite());
    }

    #[test]
    fn release_empties_buffer() {
        let mut system = ParticleSystem::new(10, &dims(10.0, 10.0), 1);
        system.release();
        assert!(system.is_empty());
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn population_and_lifetime_invariants_hold(
                density in 1usize..200,
                seed: u64,
                ticks in 1usize..150,
                w in 0.0f64..1200.0,
                h in 0.0f64..900.0,
            ) {
                let d = dims(w, h);
                let sampler = ContourSampler::new(ScalarField::new(&d));
                let mut system = ParticleSystem::new(density, &d, seed);
                for tick in 0..ticks {
                    let t = tick as f64 / 60.0;
                    let mut segments = 0;
                    system.advance(&sampler, &d, t, &idle(), |_, _| segments += 1);
                    prop_assert_eq!(segments, density);
                    prop_assert_eq!(system.len(), density);
                    for p in system.particles() {
                        prop_assert!(p.life <= p.ttl + 1);
                        prop_assert!(p.pos.is_finite());
                        prop_assert!(p.pos.x >= -ENTRY_MARGIN && p.pos.x <= d.width() + EXIT_MARGIN_X);
                        prop_assert!(p.pos.y >= -EXIT_MARGIN_Y && p.pos.y <= d.height() + EXIT_MARGIN_Y);
                    }
                }
            }
        }
    }
}
