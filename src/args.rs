use clap::Parser;
use std::path::PathBuf;

use crate::analysis::CentralityMeasure;
use crate::latex::LabelStyle;
use crate::layout::LayoutAlgorithm;
use crate::loader::InputPaths;

/// citegraph - 从引文数据库生成 LaTeX 引用关系图
#[derive(Parser, Debug, Clone)]
#[command(name = "citegraph", version)]
#[command(about = "从引文数据库生成带社区着色的 LaTeX/TikZ 引用关系图")]
pub struct Args {
    /// 引文 SQLite 数据库（包含 article 与 reference 表）
    #[arg(short, long)]
    pub database: PathBuf,

    /// LaTeX aux 文件，列出综述实际引用的文献
    #[arg(short, long)]
    pub aux: PathBuf,

    /// BibTeX 文件
    #[arg(short, long)]
    pub bibtex: PathBuf,

    /// 输出的 LaTeX 片段
    #[arg(short, long)]
    pub output: PathBuf,

    /// 排除列表（JSON：{"excluded": [...]}）
    #[arg(short = 'x', long)]
    pub exclude: Option<PathBuf>,

    /// TOML 配置文件
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 随机种子（覆盖配置文件）
    #[arg(long)]
    pub seed: Option<u64>,

    /// 中心节点规则：per-community:K | top:K | threshold:T
    #[arg(long)]
    pub central: Option<String>,

    /// 中心性度量
    #[arg(long, value_enum)]
    pub measure: Option<CentralityMeasure>,

    /// 布局算法
    #[arg(long, value_enum)]
    pub layout: Option<LayoutAlgorithm>,

    /// 节点标签样式
    #[arg(long, value_enum)]
    pub label: Option<LabelStyle>,

    /// 将运行摘要另存为 JSON
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// 输出调试日志
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    pub fn input_paths(&self) -> InputPaths {
        InputPaths {
            database: self.database.clone(),
            aux: self.aux.clone(),
            bibtex: self.bibtex.clone(),
            exclude: self.exclude.clone(),
        }
    }
}
