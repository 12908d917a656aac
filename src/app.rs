// 主应用程序逻辑：加载 -> 建图 -> 分析 -> 布局 -> 输出

use anyhow::Context;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::analysis::community::LouvainConfig;
use crate::analysis::{self, AnalysisOptions, AnalysisReport, CentralRule};
use crate::args::Args;
use crate::citation_graph::{BuildStatistics, CitationGraph};
use crate::config::Config;
use crate::latex;
use crate::layout::{self, LayoutOptions};
use crate::loader::{self, InputPaths};
use crate::timed_stage;

/// 一次运行的结果摘要
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub statistics: BuildStatistics,
    pub analysis: AnalysisReport,
    pub output: PathBuf,
}

/// citegraph 应用程序
pub struct CiteGraphApp {
    config: Config,
    rule: CentralRule,
}

impl CiteGraphApp {
    /// 创建应用实例，规则在此处解析，避免读完输入后才报错
    pub fn new(config: Config) -> crate::error::Result<Self> {
        let rule = config.central_rule()?;
        Ok(Self { config, rule })
    }

    /// 读取配置文件并应用命令行覆盖
    pub fn from_args(args: &Args) -> anyhow::Result<Self> {
        let mut config = Config::load(args.config.as_deref()).context("加载配置失败")?;
        apply_overrides(&mut config, args);
        Ok(Self::new(config)?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行完整流程并写出 LaTeX 文件
    ///
    /// 任何错误都发生在写文件之前，失败时不会留下输出文件。
    pub fn run(&self, inputs: &InputPaths, output: &Path) -> anyhow::Result<RunReport> {
        let (mut graph, report) = self.build_and_analyze(inputs)?;

        timed_stage!("layout", {
            layout::apply_layout(
                &mut graph,
                &LayoutOptions {
                    algorithm: self.config.layout.algorithm,
                    scale: self.config.layout.scale,
                    iterations: self.config.layout.iterations,
                    seed: self.config.seed,
                },
            )
        });

        let content = timed_stage!("render", { latex::render(&graph, &self.config.style) });
        latex::write_atomic(output, &content).context("写入输出文件失败")?;
        log::info!("Wrote TikZ fragment to {}", output.display());

        Ok(RunReport {
            statistics: graph.statistics().clone(),
            analysis: report,
            output: output.to_path_buf(),
        })
    }

    /// 加载输入、建图并完成社区与中心性分析
    pub fn build_and_analyze(
        &self,
        inputs: &InputPaths,
    ) -> anyhow::Result<(CitationGraph, AnalysisReport)> {
        let corpus = timed_stage!("load", { loader::load(inputs) }).context("加载输入数据失败")?;

        let mut graph = timed_stage!("build", { CitationGraph::build(&corpus) });
        if graph.is_empty() {
            log::warn!("⚠️ No cited keys left after filtering, the graph is empty");
        }

        let options = AnalysisOptions {
            louvain: LouvainConfig {
                resolution: self.config.community.resolution,
                max_passes: self.config.community.max_passes,
                seed: self.config.seed,
            },
            measure: self.config.central.measure,
            rule: self.rule,
        };
        let report = timed_stage!("analyze", { analysis::analyze(&mut graph, &options) });
        Ok((graph, report))
    }
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(rule) = &args.central {
        config.central.rule = rule.clone();
    }
    if let Some(measure) = args.measure {
        config.central.measure = measure;
    }
    if let Some(algorithm) = args.layout {
        config.layout.algorithm = algorithm;
    }
    if let Some(label) = args.label {
        config.style.label = label;
    }
    log::debug!("Effective configuration: {config:?}");
}

/// 命令行入口使用的完整流程
pub fn run(args: &Args) -> anyhow::Result<RunReport> {
    let app = CiteGraphApp::from_args(args)?;
    let report = app.run(&args.input_paths(), &args.output)?;
    if let Some(path) = &args.report {
        write_report(&report, path)?;
    }
    Ok(report)
}

/// 将运行摘要写为 JSON
pub fn write_report(report: &RunReport, path: &Path) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(report).context("序列化运行摘要失败")?;
    latex::write_atomic(path, &json).context("写入运行摘要失败")?;
    log::info!("Wrote run report to {}", path.display());
    Ok(())
}

/// 在 stdout 打印运行摘要
pub fn print_summary(report: &RunReport) {
    println!("Number of nodes: {}", report.statistics.node_count);
    println!("Number of edges: {}", report.statistics.edge_count);
    println!("Modularity: {:.4}", report.analysis.modularity);
    println!("Louvain passes: {}", report.analysis.louvain_passes);
    for (id, size) in report.analysis.community_sizes.iter().enumerate() {
        println!(
            "Community {}: {} article{}",
            id,
            size,
            if *size > 1 { "s" } else { "" }
        );
    }
    if !report.analysis.central_keys.is_empty() {
        println!("Central nodes: {}", report.analysis.central_keys.join(", "));
    }
    println!("📁 引用关系图已导出: {}", report.output.display());
}
