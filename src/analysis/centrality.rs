//! Centrality measures on the undirected view of the graph: betweenness
//! (Brandes) and degree.

use std::collections::VecDeque;

/// 介数中心性
///
/// 归一化方式与 NetworkX 一致：无向图各节点对在累加中出现两次，
/// 乘以 `1 / ((n-1)(n-2))` 后落在 [0, 1]。节点数不超过 2 时全为 0。
pub fn betweenness_centrality(adjacency: &[Vec<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    let mut bc = vec![0.0_f64; n];
    if n <= 2 {
        return bc;
    }

    let mut stack: Vec<usize> = Vec::with_capacity(n);
    let mut predecessors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut sigma = vec![0.0_f64; n];
    let mut dist = vec![-1i64; n];
    let mut delta = vec![0.0_f64; n];
    let mut queue = VecDeque::with_capacity(n);

    for s in 0..n {
        stack.clear();
        for p in predecessors.iter_mut() {
            p.clear();
        }
        sigma.fill(0.0);
        dist.fill(-1);
        delta.fill(0.0);

        sigma[s] = 1.0;
        dist[s] = 0;
        queue.push_back(s);

        // BFS from source
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &adjacency[v] {
                if dist[w] < 0 {
                    queue.push_back(w);
                    dist[w] = dist[v] + 1;
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    predecessors[w].push(v);
                }
            }
        }

        // Back-propagation
        while let Some(w) = stack.pop() {
            for &v in &predecessors[w] {
                delta[v] += (sigma[v] / sigma[w]) * (1.0 + delta[w]);
            }
            if w != s {
                bc[w] += delta[w];
            }
        }
    }

    let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
    for b in bc.iter_mut() {
        *b *= scale;
    }
    bc
}

/// 度中心性（无向）：邻居数 / (n-1)
pub fn degree_centrality(adjacency: &[Vec<usize>]) -> Vec<f64> {
    let n = adjacency.len();
    if n <= 1 {
        return vec![0.0; n];
    }
    let denom = (n - 1) as f64;
    adjacency.iter().map(|ns| ns.len() as f64 / denom).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: &[f64], expected: &[f64]) {
        assert_eq!(actual.len(), expected.len());
        for (a, e) in actual.iter().zip(expected) {
            assert!((a - e).abs() < 1e-9, "{actual:?} != {expected:?}");
        }
    }

    #[test]
    fn test_star_center_is_maximal() {
        // 0 为中心，连接 1、2、3
        let adj = vec![vec![1, 2, 3], vec![0], vec![0], vec![0]];
        assert_close(&betweenness_centrality(&adj), &[1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_path_graph() {
        // 0 - 1 - 2 - 3 - 4，与 NetworkX 结果一致
        let adj = vec![vec![1], vec![0, 2], vec![1, 3], vec![2, 4], vec![3]];
        assert_close(
            &betweenness_centrality(&adj),
            &[0.0, 0.5, 4.0 / 6.0, 0.5, 0.0],
        );
    }

    #[test]
    fn test_triangle_all_zero() {
        let adj = vec![vec![1, 2], vec![0, 2], vec![0, 1]];
        assert_close(&betweenness_centrality(&adj), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_split_shortest_paths() {
        // 正方形 0-1-2-3-0：每对对角点有两条最短路径
        let adj = vec![vec![1, 3], vec![0, 2], vec![1, 3], vec![0, 2]];
        let expected = 1.0 / 6.0;
        assert_close(&betweenness_centrality(&adj), &[expected; 4]);
    }

    #[test]
    fn test_small_graphs() {
        assert!(betweenness_centrality(&[]).is_empty());
        assert_close(&betweenness_centrality(&[vec![1], vec![0]]), &[0.0, 0.0]);
    }

    #[test]
    fn test_degree_centrality() {
        let adj = vec![vec![1, 2], vec![0], vec![0]];
        assert_close(&degree_centrality(&adj), &[1.0, 0.5, 0.5]);
    }
}
