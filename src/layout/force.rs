//! Spring-electrical force-directed layout (Fruchterman-Reingold family).
//!
//! Repulsion between every pair is `C * K^(1+p) / d^p`, attraction along edges
//! is `d^2 / K`. Nodes move one at a time by `step` in the direction of their
//! net force and the step cools geometrically.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct ForceConfig {
    /// 理想边长
    pub k: f64,
    pub max_iterations: usize,
    /// 单轮总位移低于 `convergence_threshold * k` 时停止
    pub convergence_threshold: f64,
    pub initial_step_size: f64,
    pub cooling_factor: f64,
    /// 斥力指数
    pub p: f64,
    /// 斥力强度
    pub c: f64,
    pub seed: u64,
}

impl Default for ForceConfig {
    fn default() -> Self {
        Self {
            k: 1.0,
            max_iterations: 500,
            convergence_threshold: 0.01,
            initial_step_size: 1.0,
            cooling_factor: 0.95,
            p: 1.0,
            c: 0.2,
            seed: 42,
        }
    }
}

pub fn layout(adjacency: &[Vec<usize>], config: &ForceConfig) -> Vec<Position> {
    let n = adjacency.len();
    if n <= 1 {
        return vec![Position::new(0.0, 0.0); n];
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let spread = config.k * (n as f64).sqrt();
    let mut positions: Vec<Position> = (0..n)
        .map(|_| Position::new(rng.gen_range(-spread..spread), rng.gen_range(-spread..spread)))
        .collect();

    let mut step = config.initial_step_size * config.k;
    let mut iterations = 0;
    while iterations < config.max_iterations {
        iterations += 1;
        let mut moved = 0.0;
        for i in 0..n {
            let force = net_force(i, &positions, adjacency, config);
            let magnitude = force.x.hypot(force.y);
            if magnitude > 0.0 {
                positions[i].x += step * force.x / magnitude;
                positions[i].y += step * force.y / magnitude;
                moved += step;
            }
        }
        step *= config.cooling_factor;
        if moved / (n as f64) < config.convergence_threshold * config.k {
            break;
        }
    }

    log::debug!("Force layout stopped after {iterations} iterations");
    positions
}

fn net_force(i: usize, positions: &[Position], adjacency: &[Vec<usize>], config: &ForceConfig) -> Position {
    let pi = positions[i];
    let mut force = Position::new(0.0, 0.0);
    let repulsion = config.c * config.k.powf(1.0 + config.p);

    for (j, pj) in positions.iter().enumerate() {
        if j == i {
            continue;
        }
        let dx = pi.x - pj.x;
        let dy = pi.y - pj.y;
        let d = dx.hypot(dy).max(1e-9);
        let f = repulsion / d.powf(config.p);
        force.x += f * dx / d;
        force.y += f * dy / d;
    }

    for &j in &adjacency[i] {
        let dx = positions[j].x - pi.x;
        let dy = positions[j].y - pi.y;
        let d = dx.hypot(dy);
        let f = d * d / config.k;
        if d > 0.0 {
            force.x += f * dx / d;
            force.y += f * dy / d;
        }
    }
    force
}
