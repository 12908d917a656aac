//! Kamada-Kawai stress layout.
//!
//! Minimises `E = sum_{i<j} ((|p_i - p_j| - d_ij) / d_ij)^2` where `d_ij` is
//! the hop distance in the undirected graph. Unreachable pairs use the largest
//! finite distance plus one. Starts from the circular layout and runs gradient
//! descent with a backtracking step size, so the result depends only on the
//! input graph.

use super::{circular, hop_distances, Position};

/// 步长低于该值时停止
const MIN_STEP: f64 = 1e-9;
/// 梯度范数低于该值视为收敛
const GRADIENT_TOLERANCE: f64 = 1e-6;

pub fn layout(adjacency: &[Vec<usize>], max_iterations: usize) -> Vec<Position> {
    let n = adjacency.len();
    if n <= 1 {
        return vec![Position::new(0.0, 0.0); n];
    }

    let targets = target_distances(adjacency);
    let radius = targets.iter().flatten().copied().fold(1.0_f64, f64::max) / 2.0;
    let mut positions: Vec<Position> = circular(n)
        .into_iter()
        .map(|p| Position::new(p.x * radius, p.y * radius))
        .collect();

    let mut energy = stress(&positions, &targets);
    let mut step = 0.1 * radius;
    let mut iterations = 0;
    while iterations < max_iterations && step > MIN_STEP {
        iterations += 1;
        let gradient = gradient(&positions, &targets);
        let norm = gradient
            .iter()
            .map(|g| g.x * g.x + g.y * g.y)
            .sum::<f64>()
            .sqrt();
        if norm < GRADIENT_TOLERANCE {
            break;
        }

        // 沿负梯度方向回溯搜索
        loop {
            let candidate: Vec<Position> = positions
                .iter()
                .zip(&gradient)
                .map(|(p, g)| Position::new(p.x - step * g.x / norm, p.y - step * g.y / norm))
                .collect();
            let candidate_energy = stress(&candidate, &targets);
            if candidate_energy < energy {
                positions = candidate;
                energy = candidate_energy;
                step *= 1.2;
                break;
            }
            step *= 0.5;
            if step <= MIN_STEP {
                break;
            }
        }
    }

    log::debug!("Kamada-Kawai stopped after {iterations} iterations, stress {energy:.6}");
    positions
}

/// 目标距离矩阵；不可达节点对取最大有限距离 + 1
fn target_distances(adjacency: &[Vec<usize>]) -> Vec<Vec<f64>> {
    let hops = hop_distances(adjacency);
    let max_finite = hops.iter().flatten().flatten().copied().max().unwrap_or(0);
    let unreachable = (max_finite + 1) as f64;
    hops.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|d| d.map_or(unreachable, |d| d as f64))
                .collect()
        })
        .collect()
}

fn stress(positions: &[Position], targets: &[Vec<f64>]) -> f64 {
    let n = positions.len();
    let mut energy = 0.0;
    for i in 0..n {
        for j in (i + 1)..n {
            let d = targets[i][j];
            let r = positions[i].distance(&positions[j]);
            energy += ((r - d) / d).powi(2);
        }
    }
    energy
}

fn gradient(positions: &[Position], targets: &[Vec<f64>]) -> Vec<Position> {
    let n = positions.len();
    let mut grad = vec![Position::new(0.0, 0.0); n];
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = positions[i].x - positions[j].x;
            let dy = positions[i].y - positions[j].y;
            let r = dx.hypot(dy);
            if r == 0.0 {
                continue;
            }
            let d = targets[i][j];
            let coefficient = 2.0 * (r - d) / (d * d * r);
            grad[i].x += coefficient * dx;
            grad[i].y += coefficient * dy;
            grad[j].x -= coefficient * dx;
            grad[j].y -= coefficient * dy;
        }
    }
    grad
}
