// 引用关系图 - 节点为综述引用的文献，边为文献间的引用
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::layout::Position;
use crate::loader::Corpus;

/// 引用图
///
/// 节点按引用键排序插入，因此节点下标顺序即键的字典序，
/// 后续的社区检测、布局和输出都依赖这一顺序保证结果可复现。
#[derive(Debug, Clone)]
pub struct CitationGraph {
    graph: DiGraph<ArticleNode, ()>,
    /// 引用键 -> 节点下标
    index: HashMap<String, NodeIndex>,
    stats: BuildStatistics,
}

/// 图节点（一篇被综述引用的文献）
#[derive(Debug, Clone, PartialEq)]
pub struct ArticleNode {
    /// 引用键
    pub key: String,
    /// BibTeX 中的原始标题（LaTeX 源码，不做转义）
    pub title: Option<String>,
    /// 是否存在 BibTeX 条目
    pub has_entry: bool,
    /// 社区编号（分析阶段写入）
    pub community: Option<usize>,
    /// 介数中心性（分析阶段写入）
    pub centrality: f64,
    /// 是否为中心节点（分析阶段写入）
    pub is_central: bool,
    /// 布局坐标（布局阶段写入）
    pub position: Option<Position>,
}

impl ArticleNode {
    fn new(key: &str, corpus: &Corpus) -> Self {
        let entry = corpus.entries.get(key);
        Self {
            key: key.to_string(),
            title: entry.and_then(|e| e.title()).map(str::to_string),
            has_entry: entry.is_some(),
            community: None,
            centrality: 0.0,
            is_central: false,
            position: None,
        }
    }
}

/// 建图统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildStatistics {
    pub node_count: usize,
    pub edge_count: usize,
    /// 至少一端不在综述引用集合中而被丢弃的引用
    pub external_edges_dropped: usize,
    /// 被丢弃的自引用
    pub self_citations_dropped: usize,
    /// 无任何边的节点数
    pub isolated_nodes: usize,
}

impl CitationGraph {
    /// 从加载结果构建引用图
    ///
    /// 节点集合等于综述引用集合；只保留两端都在集合内的引用，
    /// 丢弃自引用，重复引用合并为一条边。
    pub fn build(corpus: &Corpus) -> Self {
        let keys: BTreeSet<&str> = corpus.cited_keys.iter().map(String::as_str).collect();

        let mut graph = DiGraph::with_capacity(keys.len(), corpus.citations.len());
        let mut index = HashMap::with_capacity(keys.len());
        for key in &keys {
            let idx = graph.add_node(ArticleNode::new(key, corpus));
            index.insert(key.to_string(), idx);
        }

        let mut stats = BuildStatistics::default();
        // citations 为 BTreeSet，已去重且有序
        for (citing, cited) in &corpus.citations {
            let (Some(&from), Some(&to)) = (index.get(citing), index.get(cited)) else {
                stats.external_edges_dropped += 1;
                continue;
            };
            if from == to {
                stats.self_citations_dropped += 1;
                log::debug!("Dropping self-citation of '{citing}'");
                continue;
            }
            graph.add_edge(from, to, ());
        }

        stats.node_count = graph.node_count();
        stats.edge_count = graph.edge_count();
        stats.isolated_nodes = graph
            .node_indices()
            .filter(|&n| graph.neighbors_undirected(n).next().is_none())
            .count();

        log::info!(
            "Built citation graph: {} nodes, {} edges ({} external, {} self-citations dropped)",
            stats.node_count,
            stats.edge_count,
            stats.external_edges_dropped,
            stats.self_citations_dropped
        );

        Self {
            graph,
            index,
            stats,
        }
    }

    pub fn statistics(&self) -> &BuildStatistics {
        &self.stats
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// 按键的字典序遍历节点
    pub fn nodes(&self) -> impl Iterator<Item = &ArticleNode> {
        self.graph.node_indices().map(move |i| &self.graph[i])
    }

    /// 第 i 个节点（与 `nodes()` 的顺序一致）
    pub fn node_at(&self, i: usize) -> &ArticleNode {
        &self.graph[NodeIndex::new(i)]
    }

    pub fn node_at_mut(&mut self, i: usize) -> &mut ArticleNode {
        &mut self.graph[NodeIndex::new(i)]
    }

    pub fn node(&self, key: &str) -> Option<&ArticleNode> {
        self.index.get(key).map(|&i| &self.graph[i])
    }

    /// 所有边 (施引键, 被引键)，按键排序
    pub fn edges(&self) -> Vec<(&str, &str)> {
        let mut edges: Vec<(&str, &str)> = self
            .graph
            .edge_indices()
            .filter_map(|e| self.graph.edge_endpoints(e))
            .map(|(a, b)| (self.graph[a].key.as_str(), self.graph[b].key.as_str()))
            .collect();
        edges.sort_unstable();
        edges
    }

    /// 无向邻接表（按节点下标），邻居有序且去重
    ///
    /// A→B 与 B→A 同时存在时只计一次。
    pub fn undirected_adjacency(&self) -> Vec<Vec<usize>> {
        self.graph
            .node_indices()
            .map(|n| {
                let neighbors: BTreeSet<usize> = self
                    .graph
                    .neighbors_undirected(n)
                    .map(|m| m.index())
                    .filter(|&m| m != n.index())
                    .collect();
                neighbors.into_iter().collect()
            })
            .collect()
    }

    /// 社区划分：引用键 -> 社区编号（未分析的节点不出现）
    pub fn communities(&self) -> BTreeMap<String, usize> {
        self.nodes()
            .filter_map(|n| n.community.map(|c| (n.key.clone(), c)))
            .collect()
    }

    /// 中心性：引用键 -> 分数
    pub fn centrality(&self) -> BTreeMap<String, f64> {
        self.nodes().map(|n| (n.key.clone(), n.centrality)).collect()
    }

    /// 布局：引用键 -> 坐标（未布局的节点不出现）
    pub fn positions(&self) -> BTreeMap<String, Position> {
        self.nodes()
            .filter_map(|n| n.position.map(|p| (n.key.clone(), p)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(cited: &[&str], citations: &[(&str, &str)]) -> Corpus {
        Corpus {
            cited_keys: cited.iter().map(|s| s.to_string()).collect(),
            citations: citations
                .iter()
                .map(|(a, b)| (a.to_string(), b.to_string()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_whitelist_filters_nodes_and_edges() {
        // D 不在综述引用集合中，D→A 必须被丢弃
        let graph = CitationGraph::build(&corpus(
            &["A", "B", "C"],
            &[("A", "B"), ("B", "C"), ("C", "A"), ("D", "A")],
        ));

        let keys: Vec<&str> = graph.nodes().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["A", "B", "C"]);
        assert_eq!(graph.edges(), vec![("A", "B"), ("B", "C"), ("C", "A")]);
        assert_eq!(graph.statistics().external_edges_dropped, 1);
    }

    #[test]
    fn test_self_citation_dropped() {
        let graph = CitationGraph::build(&corpus(&["A", "B"], &[("A", "A"), ("A", "B")]));
        assert_eq!(graph.edges(), vec![("A", "B")]);
        assert_eq!(graph.statistics().self_citations_dropped, 1);
    }

    #[test]
    fn test_isolated_and_missing_metadata_nodes_kept() {
        let graph = CitationGraph::build(&corpus(&["Z", "A", "B"], &[("A", "B")]));
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.statistics().isolated_nodes, 1);
        let z = graph.node("Z").unwrap();
        assert!(!z.has_entry);
        assert_eq!(z.title, None);
    }

    #[test]
    fn test_undirected_adjacency_merges_reciprocal_citations() {
        let graph = CitationGraph::build(&corpus(&["A", "B", "C"], &[("A", "B"), ("B", "A"), ("B", "C")]));
        assert_eq!(graph.edge_count(), 3);
        assert_eq!(graph.undirected_adjacency(), vec![vec![1], vec![0, 2], vec![1]]);
    }

    #[test]
    fn test_title_keeps_latex_markup() {
        let mut corpus = corpus(&["A"], &[]);
        let entries = crate::loader::bibtex::parse_bibtex(
            "@article{A, title = {{BERT}: \\emph{Deep} Transformers}}",
        )
        .unwrap();
        corpus.entries = entries.into_iter().map(|e| (e.key.clone(), e)).collect();
        let graph = CitationGraph::build(&corpus);
        assert_eq!(
            graph.node("A").unwrap().title.as_deref(),
            Some("{BERT}: \\emph{Deep} Transformers")
        );
    }
}
