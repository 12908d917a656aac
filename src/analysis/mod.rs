// 图分析 - 社区检测、中心性计算与中心节点选择
pub mod centrality;
pub mod community;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::citation_graph::CitationGraph;
use crate::error::CiteGraphError;
use community::{louvain, LouvainConfig};

/// 中心节点选择规则
///
/// 排名按中心性降序，分数相同时按引用键升序，因此选择结果是确定的。
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CentralRule {
    /// 每个社区中排名前 K 的节点
    PerCommunity(usize),
    /// 全局排名前 K 的节点
    TopK(usize),
    /// 中心性不低于阈值的节点
    Threshold(f64),
}

impl FromStr for CentralRule {
    type Err = CiteGraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CiteGraphError::InvalidRule(s.to_string());
        let (name, value) = s.trim().split_once(':').ok_or_else(invalid)?;
        let value = value.trim();
        match name.trim() {
            "per-community" => value.parse().map(Self::PerCommunity).map_err(|_| invalid()),
            "top" => value.parse().map(Self::TopK).map_err(|_| invalid()),
            "threshold" => match value.parse::<f64>() {
                Ok(t) if t.is_finite() && t >= 0.0 => Ok(Self::Threshold(t)),
                _ => Err(invalid()),
            },
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for CentralRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PerCommunity(k) => write!(f, "per-community:{k}"),
            Self::TopK(k) => write!(f, "top:{k}"),
            Self::Threshold(t) => write!(f, "threshold:{t}"),
        }
    }
}

/// 中心性度量
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CentralityMeasure {
    /// 介数中心性
    #[default]
    Betweenness,
    /// 度中心性
    Degree,
}

/// 分析参数
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisOptions {
    pub louvain: LouvainConfig,
    pub measure: CentralityMeasure,
    pub rule: CentralRule,
}

/// 分析结果摘要
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub modularity: f64,
    /// 各社区规模（按社区编号）
    pub community_sizes: Vec<usize>,
    /// 中心节点（按引用键排序）
    pub central_keys: Vec<String>,
    pub louvain_passes: usize,
}

/// 为图中每个节点写入社区编号、中心性和中心节点标记
pub fn analyze(graph: &mut CitationGraph, options: &AnalysisOptions) -> AnalysisReport {
    let adjacency = graph.undirected_adjacency();

    let partition = louvain(&adjacency, &options.louvain);
    let scores = match options.measure {
        CentralityMeasure::Betweenness => centrality::betweenness_centrality(&adjacency),
        CentralityMeasure::Degree => centrality::degree_centrality(&adjacency),
    };
    let central = select_central(&scores, &partition.membership, options.rule);

    for i in 0..graph.node_count() {
        let node = graph.node_at_mut(i);
        node.community = Some(partition.membership[i]);
        node.centrality = scores[i];
        node.is_central = false;
    }
    for &i in &central {
        graph.node_at_mut(i).is_central = true;
    }

    let central_keys: Vec<String> = central.iter().map(|&i| graph.node_at(i).key.clone()).collect();
    log::info!(
        "Detected {} communities (Q = {:.4}), {} central nodes by rule {}",
        partition.community_count,
        partition.modularity,
        central_keys.len(),
        options.rule
    );
    for key in &central_keys {
        if let Some(node) = graph.node(key) {
            log::debug!(
                "Central node '{}' (community {:?}, {:?} = {:.4})",
                key,
                node.community,
                options.measure,
                node.centrality
            );
        }
    }

    AnalysisReport {
        modularity: partition.modularity,
        community_sizes: partition.sizes(),
        central_keys,
        louvain_passes: partition.passes,
    }
}

/// 按规则选择中心节点，返回升序的节点下标
pub fn select_central(scores: &[f64], membership: &[usize], rule: CentralRule) -> Vec<usize> {
    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]).then(a.cmp(&b)));

    let mut selected: Vec<usize> = match rule {
        CentralRule::TopK(k) => ranked.into_iter().take(k).collect(),
        CentralRule::Threshold(t) => ranked.into_iter().filter(|&i| scores[i] >= t).collect(),
        CentralRule::PerCommunity(k) => {
            let communities = membership.iter().max().map_or(0, |&c| c + 1);
            let mut taken = vec![0usize; communities];
            ranked
                .into_iter()
                .filter(|&i| {
                    let c = membership[i];
                    if taken[c] < k {
                        taken[c] += 1;
                        true
                    } else {
                        false
                    }
                })
                .collect()
        }
    };
    selected.sort_unstable();
    selected
}
