//! Community detection: Louvain modularity optimisation on the undirected view
//! of the citation graph.
//!
//! Node visiting order is shuffled with a seeded RNG, so equal inputs and seed
//! always give the same partition.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashMap;

/// 改进量低于该值视为没有改进
const MIN_GAIN: f64 = 1e-12;
/// 单层内局部移动的最大轮数
const MAX_SWEEPS: usize = 100;

#[derive(Debug, Clone, PartialEq)]
pub struct LouvainConfig {
    pub resolution: f64,
    pub max_passes: usize,
    pub seed: u64,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            max_passes: 20,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Partition {
    /// 每个节点的社区编号，编号连续，按社区规模降序
    pub membership: Vec<usize>,
    pub community_count: usize,
    pub modularity: f64,
    /// 实际执行的聚合轮数
    pub passes: usize,
}

impl Partition {
    /// 各社区规模（按社区编号）
    pub fn sizes(&self) -> Vec<usize> {
        let mut sizes = vec![0; self.community_count];
        for &c in &self.membership {
            sizes[c] += 1;
        }
        sizes
    }
}

/// 加权无向图；自环权重单独记录
struct WeightedGraph {
    adj: Vec<Vec<(usize, f64)>>,
    self_loops: Vec<f64>,
}

impl WeightedGraph {
    fn from_adjacency(adjacency: &[Vec<usize>]) -> Self {
        Self {
            adj: adjacency
                .iter()
                .map(|ns| ns.iter().map(|&j| (j, 1.0)).collect())
                .collect(),
            self_loops: vec![0.0; adjacency.len()],
        }
    }

    fn len(&self) -> usize {
        self.adj.len()
    }

    /// 节点加权度（自环计两次）
    fn degree(&self, i: usize) -> f64 {
        self.adj[i].iter().map(|&(_, w)| w).sum::<f64>() + 2.0 * self.self_loops[i]
    }

    /// 总边权（每条无向边计一次）
    fn total_weight(&self) -> f64 {
        let half: f64 = (0..self.len())
            .map(|i| self.adj[i].iter().map(|&(_, w)| w).sum::<f64>())
            .sum::<f64>()
            / 2.0;
        half + self.self_loops.iter().sum::<f64>()
    }

    /// 按社区划分收缩为新图
    fn aggregate(&self, community: &[usize], count: usize) -> Self {
        let mut self_loops = vec![0.0; count];
        let mut weights: Vec<HashMap<usize, f64>> = vec![HashMap::new(); count];
        for i in 0..self.len() {
            let ci = community[i];
            self_loops[ci] += self.self_loops[i];
            for &(j, w) in &self.adj[i] {
                let cj = community[j];
                if ci == cj {
                    // 内部边在两端各出现一次
                    self_loops[ci] += w / 2.0;
                } else {
                    *weights[ci].entry(cj).or_default() += w;
                }
            }
        }
        let adj = weights
            .into_iter()
            .map(|m| {
                let mut ns: Vec<(usize, f64)> = m.into_iter().collect();
                ns.sort_by_key(|&(j, _)| j);
                ns
            })
            .collect();
        Self { adj, self_loops }
    }
}

/// 对无向邻接表运行 Louvain
///
/// `adjacency[i]` 为节点 i 的邻居（不含自身、无重复）。孤立节点各自成为一个社区。
pub fn louvain(adjacency: &[Vec<usize>], config: &LouvainConfig) -> Partition {
    let n = adjacency.len();
    if n == 0 {
        return Partition {
            membership: vec![],
            community_count: 0,
            modularity: 0.0,
            passes: 0,
        };
    }

    let base = WeightedGraph::from_adjacency(adjacency);
    let m = base.total_weight();
    let mut membership: Vec<usize> = (0..n).collect();
    let mut passes = 0;

    if m > 0.0 {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let mut graph = WeightedGraph::from_adjacency(adjacency);

        while passes < config.max_passes {
            passes += 1;
            let (community, moved) = local_moving(&graph, m, config.resolution, &mut rng);
            if !moved {
                break;
            }
            let (community, count) = renumber(&community);
            for c in membership.iter_mut() {
                *c = community[*c];
            }
            if count == graph.len() {
                break;
            }
            graph = graph.aggregate(&community, count);
        }
    }

    let membership = order_by_size(&membership);
    let community_count = membership.iter().max().map_or(0, |&c| c + 1);
    let modularity = modularity(&base, &membership, config.resolution);
    log::debug!(
        "Louvain finished after {passes} passes: {community_count} communities, Q = {modularity:.4}"
    );

    Partition {
        membership,
        community_count,
        modularity,
        passes,
    }
}

/// 局部移动阶段：每个节点移入使模块度增益最大的相邻社区
fn local_moving(
    graph: &WeightedGraph,
    m: f64,
    resolution: f64,
    rng: &mut StdRng,
) -> (Vec<usize>, bool) {
    let n = graph.len();
    let mut community: Vec<usize> = (0..n).collect();
    let degrees: Vec<f64> = (0..n).map(|i| graph.degree(i)).collect();
    let mut tot: Vec<f64> = degrees.clone();

    let mut order: Vec<usize> = (0..n).collect();
    order.shuffle(rng);

    let mut moved_any = false;
    for _ in 0..MAX_SWEEPS {
        let mut moved = false;
        for &i in &order {
            let ci = community[i];
            let ki = degrees[i];

            // 到各相邻社区的边权，按首次出现顺序保存
            let mut links: Vec<(usize, f64)> = Vec::new();
            for &(j, w) in &graph.adj[i] {
                let cj = community[j];
                match links.iter_mut().find(|(c, _)| *c == cj) {
                    Some((_, acc)) => *acc += w,
                    None => links.push((cj, w)),
                }
            }

            tot[ci] -= ki;
            let gain = |c: usize, w: f64| w - resolution * tot[c] * ki / (2.0 * m);
            let own = links.iter().find(|(c, _)| *c == ci).map_or(0.0, |&(_, w)| w);
            let mut best = ci;
            let mut best_gain = gain(ci, own);
            for &(c, w) in &links {
                let g = gain(c, w);
                if g > best_gain + MIN_GAIN {
                    best = c;
                    best_gain = g;
                }
            }
            tot[best] += ki;

            if best != ci {
                community[i] = best;
                moved = true;
                moved_any = true;
            }
        }
        if !moved {
            break;
        }
    }

    (community, moved_any)
}

/// 社区编号压缩为 0..count
fn renumber(community: &[usize]) -> (Vec<usize>, usize) {
    let mut map: HashMap<usize, usize> = HashMap::new();
    let renumbered = community
        .iter()
        .map(|&c| {
            let next = map.len();
            *map.entry(c).or_insert(next)
        })
        .collect();
    (renumbered, map.len())
}

/// 按社区规模降序重新编号，规模相同时按最小成员下标
fn order_by_size(membership: &[usize]) -> Vec<usize> {
    let mut groups: HashMap<usize, (usize, usize)> = HashMap::new();
    for (i, &c) in membership.iter().enumerate() {
        let g = groups.entry(c).or_insert((0, i));
        g.0 += 1;
        g.1 = g.1.min(i);
    }
    let mut ranked: Vec<(usize, usize, usize)> =
        groups.into_iter().map(|(c, (size, first))| (c, size, first)).collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    let new_id: HashMap<usize, usize> = ranked
        .iter()
        .enumerate()
        .map(|(id, &(c, _, _))| (c, id))
        .collect();
    membership.iter().map(|c| new_id[c]).collect()
}

/// 划分的模块度 Q
fn modularity(graph: &WeightedGraph, membership: &[usize], resolution: f64) -> f64 {
    let m = graph.total_weight();
    if m == 0.0 {
        return 0.0;
    }
    let count = membership.iter().max().map_or(0, |&c| c + 1);
    let mut internal = vec![0.0; count];
    let mut tot = vec![0.0; count];
    for i in 0..graph.len() {
        let ci = membership[i];
        tot[ci] += graph.degree(i);
        internal[ci] += graph.self_loops[i];
        for &(j, w) in &graph.adj[i] {
            if membership[j] == ci {
                internal[ci] += w / 2.0;
            }
        }
    }
    (0..count)
        .map(|c| internal[c] / m - resolution * (tot[c] / (2.0 * m)).powi(2))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn undirected(n: usize, edges: &[(usize, usize)]) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); n];
        for &(a, b) in edges {
            adj[a].push(b);
            adj[b].push(a);
        }
        for ns in adj.iter_mut() {
            ns.sort_unstable();
            ns.dedup();
        }
        adj
    }

    fn two_cliques() -> Vec<Vec<usize>> {
        undirected(
            8,
            &[
                (0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3),
                (4, 5), (4, 6), (4, 7), (5, 6), (5, 7), (6, 7),
                (3, 4),
            ],
        )
    }

    #[test]
    fn test_empty_graph() {
        let p = louvain(&[], &LouvainConfig::default());
        assert!(p.membership.is_empty());
        assert_eq!(p.community_count, 0);
        assert_eq!(p.modularity, 0.0);
    }

    #[test]
    fn test_isolated_nodes_are_singletons() {
        let p = louvain(&vec![vec![]; 3], &LouvainConfig::default());
        assert_eq!(p.membership, vec![0, 1, 2]);
        assert_eq!(p.community_count, 3);
    }

    #[test]
    fn test_two_cliques_split() {
        let p = louvain(&two_cliques(), &LouvainConfig::default());
        assert_eq!(p.community_count, 2);
        assert!(p.membership[..4].iter().all(|&c| c == p.membership[0]));
        assert!(p.membership[4..].iter().all(|&c| c == p.membership[4]));
        assert_ne!(p.membership[0], p.membership[4]);
        // 同规模社区按最小成员排序
        assert_eq!(p.membership[0], 0);
        assert!(p.modularity > 0.4, "Q = {}", p.modularity);
    }

    #[test]
    fn test_deterministic_for_same_seed() {
        let adj = two_cliques();
        for seed in [1, 7, 42, 1234] {
            let config = LouvainConfig { seed, ..Default::default() };
            assert_eq!(louvain(&adj, &config), louvain(&adj, &config));
        }
    }

    #[test]
    fn test_every_node_assigned() {
        let adj = undirected(6, &[(0, 1), (2, 3), (3, 4)]);
        let p = louvain(&adj, &LouvainConfig::default());
        assert_eq!(p.membership.len(), 6);
        assert!(p.membership.iter().all(|&c| c < p.community_count));
        assert_eq!(p.sizes().iter().sum::<usize>(), 6);
    }

    #[test]
    fn test_modularity_of_known_partition() {
        // 两个不相连的三角形，各自成社区：Q = 2 * (3/6 - (6/12)^2) = 0.5
        let adj = undirected(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)]);
        let q = modularity(&WeightedGraph::from_adjacency(&adj), &[0, 0, 0, 1, 1, 1], 1.0);
        assert!((q - 0.5).abs() < 1e-9);
        let p = louvain(&adj, &LouvainConfig::default());
        assert!((p.modularity - 0.5).abs() < 1e-9);
    }
}
