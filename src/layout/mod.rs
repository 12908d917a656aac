// 图布局 - 为每个节点计算二维坐标（TikZ 单位）
pub mod force;
pub mod kamada_kawai;

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::f64::consts::PI;

use crate::citation_graph::CitationGraph;

/// 布局算法
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutAlgorithm {
    /// Kamada-Kawai 应力模型
    #[default]
    KamadaKawai,
    /// 弹簧-电荷力导向模型
    Force,
    /// 按键顺序均匀排布在圆上
    Circular,
}

/// 节点坐标
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// 布局参数
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub algorithm: LayoutAlgorithm,
    /// 缩放后坐标绝对值的最大值
    pub scale: f64,
    pub iterations: usize,
    pub seed: u64,
}

/// 计算布局并写入图节点
pub fn apply_layout(graph: &mut CitationGraph, options: &LayoutOptions) {
    let positions = compute_layout(&graph.undirected_adjacency(), options);
    for (i, position) in positions.into_iter().enumerate() {
        graph.node_at_mut(i).position = Some(position);
    }
    log::info!(
        "Laid out {} nodes with {:?} (scale {})",
        graph.node_count(),
        options.algorithm,
        options.scale
    );
}

/// 对无向邻接表计算布局，结果以原点为中心、最大坐标绝对值为 `scale`
pub fn compute_layout(adjacency: &[Vec<usize>], options: &LayoutOptions) -> Vec<Position> {
    let raw = match options.algorithm {
        LayoutAlgorithm::KamadaKawai => kamada_kawai::layout(adjacency, options.iterations),
        LayoutAlgorithm::Force => force::layout(
            adjacency,
            &force::ForceConfig {
                max_iterations: options.iterations,
                seed: options.seed,
                ..Default::default()
            },
        ),
        LayoutAlgorithm::Circular => circular(adjacency.len()),
    };
    rescale(raw, options.scale)
}

/// 单位圆上均匀分布，第一个节点位于 (1, 0)
pub fn circular(n: usize) -> Vec<Position> {
    if n == 1 {
        return vec![Position::new(0.0, 0.0)];
    }
    (0..n)
        .map(|i| {
            let theta = 2.0 * PI * i as f64 / n as f64;
            Position::new(theta.cos(), theta.sin())
        })
        .collect()
}

/// 平移到以原点为中心，并等比缩放使最大坐标绝对值为 `scale`
pub fn rescale(mut positions: Vec<Position>, scale: f64) -> Vec<Position> {
    if positions.is_empty() {
        return positions;
    }
    let n = positions.len() as f64;
    let cx = positions.iter().map(|p| p.x).sum::<f64>() / n;
    let cy = positions.iter().map(|p| p.y).sum::<f64>() / n;
    for p in positions.iter_mut() {
        p.x -= cx;
        p.y -= cy;
    }

    let extent = positions
        .iter()
        .map(|p| p.x.abs().max(p.y.abs()))
        .fold(0.0_f64, f64::max);
    if extent > 0.0 {
        let factor = scale / extent;
        for p in positions.iter_mut() {
            p.x *= factor;
            p.y *= factor;
        }
    }
    positions
}

/// 无向图最短路径跳数（BFS），不可达为 None
pub(crate) fn hop_distances(adjacency: &[Vec<usize>]) -> Vec<Vec<Option<usize>>> {
    let n = adjacency.len();
    let mut all = Vec::with_capacity(n);
    let mut queue = VecDeque::with_capacity(n);
    for s in 0..n {
        let mut dist = vec![None; n];
        dist[s] = Some(0);
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            let d = dist[v].unwrap_or(0);
            for &w in &adjacency[v] {
                if dist[w].is_none() {
                    dist[w] = Some(d + 1);
                    queue.push_back(w);
                }
            }
        }
        all.push(dist);
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(algorithm: LayoutAlgorithm) -> LayoutOptions {
        LayoutOptions {
            algorithm,
            scale: 20.0,
            iterations: 200,
            seed: 42,
        }
    }

    fn max_abs(positions: &[Position]) -> f64 {
        positions
            .iter()
            .map(|p| p.x.abs().max(p.y.abs()))
            .fold(0.0, f64::max)
    }

    #[test]
    fn test_circular_positions() {
        let ps = circular(4);
        assert!((ps[0].x - 1.0).abs() < 1e-12 && ps[0].y.abs() < 1e-12);
        assert!(ps[1].x.abs() < 1e-12 && (ps[1].y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_rescale_centers_and_scales() {
        let ps = rescale(vec![Position::new(1.0, 1.0), Position::new(3.0, 2.0)], 10.0);
        let cx = (ps[0].x + ps[1].x) / 2.0;
        assert!(cx.abs() < 1e-12);
        assert!((max_abs(&ps) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_single_node_at_origin() {
        for algorithm in [LayoutAlgorithm::KamadaKawai, LayoutAlgorithm::Force, LayoutAlgorithm::Circular] {
            let ps = compute_layout(&[vec![]], &options(algorithm));
            assert_eq!(ps, vec![Position::new(0.0, 0.0)]);
        }
    }

    #[test]
    fn test_every_algorithm_respects_scale() {
        let adj = vec![vec![1, 2], vec![0, 2], vec![0, 1, 3], vec![2], vec![]];
        for algorithm in [LayoutAlgorithm::KamadaKawai, LayoutAlgorithm::Force, LayoutAlgorithm::Circular] {
            let ps = compute_layout(&adj, &options(algorithm));
            assert_eq!(ps.len(), 5);
            assert!(ps.iter().all(|p| p.x.is_finite() && p.y.is_finite()));
            assert!((max_abs(&ps) - 20.0).abs() < 1e-6, "{algorithm:?}");
        }
    }

    #[test]
    fn test_layouts_are_deterministic() {
        let adj = vec![vec![1], vec![0, 2], vec![1, 3], vec![2]];
        for algorithm in [LayoutAlgorithm::KamadaKawai, LayoutAlgorithm::Force] {
            assert_eq!(
                compute_layout(&adj, &options(algorithm)),
                compute_layout(&adj, &options(algorithm))
            );
        }
    }

    #[test]
    fn test_apply_layout_annotates_every_node() {
        let corpus = crate::loader::Corpus {
            cited_keys: vec!["A".into(), "B".into(), "C".into()],
            citations: [("A".to_string(), "B".to_string())].into_iter().collect(),
            ..Default::default()
        };
        let mut graph = CitationGraph::build(&corpus);
        apply_layout(&mut graph, &options(LayoutAlgorithm::Circular));
        let positions = graph.positions();
        assert_eq!(positions.keys().collect::<Vec<_>>(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_hop_distances() {
        let d = hop_distances(&[vec![1], vec![0, 2], vec![1], vec![]]);
        assert_eq!(d[0][2], Some(2));
        assert_eq!(d[0][3], None);
        assert_eq!(d[3][3], Some(0));
    }
}
