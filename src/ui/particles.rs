// Animated background: drifting particles linked when close together

use std::time::Duration;

use rand::Rng;
use ratatui::{
    layout::Rect,
    style::Color,
    symbols::Marker,
    widgets::canvas::{Canvas, Line as CanvasLine, Points},
    Frame,
};

pub const MAX_PARTICLES: usize = 80;
const MIN_PARTICLES: usize = 8;
/// Terminal cells per particle at full density.
const CELLS_PER_PARTICLE: f64 = 5000.0 / MAX_PARTICLES as f64;
/// Cells per second.
const SPEED: f64 = 2.0;
pub const LINK_DISTANCE: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub x: f64,
    pub y: f64,
    vx: f64,
    vy: f64,
}

#[derive(Debug, Default)]
pub struct ParticleField {
    particles: Vec<Particle>,
    width: f64,
    height: f64,
}

/// Particle count for a field of `width` x `height` cells.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn particle_count(width: f64, height: f64) -> usize {
    let by_area = ((width * height) / CELLS_PER_PARTICLE).round() as usize;
    by_area.clamp(MIN_PARTICLES, MAX_PARTICLES)
}

impl ParticleField {
    #[cfg(test)]
    pub fn new(width: f64, height: f64, rng: &mut impl Rng) -> Self {
        let mut field = Self::default();
        field.resize(width, height, rng);
        field
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub const fn bounds(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Re-bound the field. Existing particles are kept and clamped; the
    /// population grows or shrinks to match the new area.
    pub fn resize(&mut self, width: f64, height: f64, rng: &mut impl Rng) {
        let same_width = (width - self.width).abs() < f64::EPSILON;
        if same_width && (height - self.height).abs() < f64::EPSILON {
            return;
        }
        self.width = width.max(1.0);
        self.height = height.max(1.0);

        let target = particle_count(self.width, self.height);
        self.particles.truncate(target);
        for p in &mut self.particles {
            p.x = p.x.min(self.width);
            p.y = p.y.min(self.height);
        }
        while self.particles.len() < target {
            let angle = rng.gen_range(0.0..std::f64::consts::TAU);
            self.particles.push(Particle {
                x: rng.gen_range(0.0..=self.width),
                y: rng.gen_range(0.0..=self.height),
                vx: SPEED * angle.cos(),
                vy: SPEED * angle.sin(),
            });
        }
    }

    /// Advance every particle by `dt`, bouncing off the edges.
    pub fn step(&mut self, dt: Duration) {
        let secs = dt.as_secs_f64();
        for p in &mut self.particles {
            p.x += p.vx * secs;
            p.y += p.vy * secs;
            bounce(&mut p.x, &mut p.vx, self.width);
            bounce(&mut p.y, &mut p.vy, self.height);
        }
    }

    /// Pairs of particles within [`LINK_DISTANCE`] of each other.
    pub fn links(&self) -> Vec<(usize, usize)> {
        let mut pairs = Vec::new();
        for (i, a) in self.particles.iter().enumerate() {
            for (j, b) in self.particles.iter().enumerate().skip(i + 1) {
                if (a.x - b.x).hypot(a.y - b.y) <= LINK_DISTANCE {
                    pairs.push((i, j));
                }
            }
        }
        pairs
    }
}

fn bounce(pos: &mut f64, vel: &mut f64, max: f64) {
    if *pos < 0.0 {
        *pos = -*pos;
        *vel = vel.abs();
    } else if *pos > max {
        *pos = 2.0f64.mul_add(max, -*pos);
        *vel = -vel.abs();
    }
    *pos = pos.clamp(0.0, max);
}

pub fn render_particles(frame: &mut Frame, field: &ParticleField, color: Color, area: Rect) {
    let (width, height) = field.bounds();
    let links = field.links();
    let coords: Vec<(f64, f64)> = field.particles().iter().map(|p| (p.x, p.y)).collect();

    let canvas = Canvas::default()
        .marker(Marker::Braille)
        .x_bounds([0.0, width])
        .y_bounds([0.0, height])
        .paint(|ctx| {
            for &(i, j) in &links {
                let (a, b) = (field.particles()[i], field.particles()[j]);
                ctx.draw(&CanvasLine {
                    x1: a.x,
                    y1: a.y,
                    x2: b.x,
                    y2: b.y,
                    color: Color::DarkGray,
                });
            }
            ctx.draw(&Points {
                coords: &coords,
                color,
            });
        });

    frame.render_widget(canvas, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_particle_count_scales_with_area() {
        assert_eq!(particle_count(200.0, 100.0), MAX_PARTICLES);
        assert_eq!(particle_count(5.0, 5.0), MIN_PARTICLES);
        let mid = particle_count(80.0, 30.0);
        assert!(mid > MIN_PARTICLES && mid < MAX_PARTICLES);
    }

    #[test]
    fn test_particles_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut field = ParticleField::new(40.0, 20.0, &mut rng);
        for _ in 0..2_000 {
            field.step(Duration::from_millis(250));
        }
        for p in field.particles() {
            assert!((0.0..=40.0).contains(&p.x), "x out of bounds: {}", p.x);
            assert!((0.0..=20.0).contains(&p.y), "y out of bounds: {}", p.y);
        }
    }

    #[test]
    fn test_particles_move() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut field = ParticleField::new(100.0, 50.0, &mut rng);
        let before = field.particles().to_vec();
        field.step(Duration::from_secs(1));
        assert_ne!(before, field.particles());
    }

    #[test]
    fn test_bounce_reflects_velocity() {
        let (mut pos, mut vel) = (-1.0, -2.0);
        bounce(&mut pos, &mut vel, 10.0);
        assert!((pos - 1.0).abs() < f64::EPSILON);
        assert!(vel > 0.0);

        let (mut pos, mut vel) = (11.0, 2.0);
        bounce(&mut pos, &mut vel, 10.0);
        assert!((pos - 9.0).abs() < f64::EPSILON);
        assert!(vel < 0.0);
    }

    #[test]
    fn test_resize_clamps_and_repopulates() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut field = ParticleField::new(200.0, 100.0, &mut rng);
        assert_eq!(field.particles().len(), MAX_PARTICLES);

        field.resize(10.0, 10.0, &mut rng);
        assert_eq!(field.particles().len(), MIN_PARTICLES);
        assert!(field.particles().iter().all(|p| p.x <= 10.0 && p.y <= 10.0));
    }

    fn resting(x: f64) -> Particle {
        Particle {
            x,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
        }
    }

    #[test]
    fn test_links_respect_distance() {
        let field = ParticleField {
            particles: vec![resting(0.0), resting(5.0), resting(50.0)],
            width: 60.0,
            height: 10.0,
        };
        assert_eq!(field.links(), vec![(0, 1)]);
    }
}
