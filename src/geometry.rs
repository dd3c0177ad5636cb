// Stateless random and geometric helpers shared by the growth engine and seeding policy

use ::rand as external_rand;
use external_rand::Rng;

use crate::types::Vec2;

/// Uniform integer in `[min, max]`, both ends inclusive.
pub fn random_int<R: Rng + ?Sized>(rng: &mut R, (min, max): (u32, u32)) -> u32 {
    if min >= max {
        return min;
    }
    rng.gen_range(min..=max)
}

/// Uniform float in `[min, max)`; collapses to `min` for an empty range.
pub fn random_in<R: Rng + ?Sized>(rng: &mut R, (min, max): (f32, f32)) -> f32 {
    if min >= max {
        return min;
    }
    rng.gen_range(min..max)
}

/// `base` plus a uniform offset drawn from `[-range/2, range/2)`.
pub fn perturb_angle<R: Rng + ?Sized>(rng: &mut R, base: f32, range: f32) -> f32 {
    let half = range * 0.5;
    base + random_in(rng, (-half, half))
}

/// Point reached by walking `length * progress` from `origin` along `angle`.
#[inline]
pub fn tip_point(origin: Vec2, angle: f32, length: f32, progress: f32) -> Vec2 {
    origin + Vec2::from_angle(angle) * (length * progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use external_rand::rngs::StdRng;
    use external_rand::SeedableRng;

    #[test]
    fn random_int_is_inclusive() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 3];
        for _ in 0..500 {
            let v = random_int(&mut rng, (1, 3));
            assert!((1..=3).contains(&v));
            seen[(v - 1) as usize] = true;
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn degenerate_ranges_do_not_panic() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_int(&mut rng, (2, 2)), 2);
        assert_eq!(random_in(&mut rng, (0.5, 0.5)), 0.5);
        assert_eq!(perturb_angle(&mut rng, 1.0, 0.0), 1.0);
    }

    #[test]
    fn perturbation_stays_in_band() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..1000 {
            let a = perturb_angle(&mut rng, 0.0, 0.8);
            assert!((-0.4..0.4).contains(&a));
        }
    }

    #[test]
    fn tip_point_follows_progress() {
        let tip = tip_point(Vec2::ZERO, 0.0, 100.0, 0.5);
        assert_eq!(tip, Vec2::new(50.0, 0.0));

        let down = tip_point(Vec2::new(10.0, 10.0), std::f32::consts::FRAC_PI_2, 20.0, 1.0);
        assert!((down.x - 10.0).abs() < 1e-4);
        assert!((down.y - 30.0).abs() < 1e-4);
    }
}
