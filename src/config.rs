use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::analysis::{CentralRule, CentralityMeasure};
use crate::error::{CiteGraphError, Result};
use crate::latex::LabelStyle;
use crate::layout::LayoutAlgorithm;

// Defaults
const DEFAULT_SEED: u64 = 42;
const DEFAULT_CENTRAL_RULE: &str = "per-community:1";
const DEFAULT_LAYOUT_SCALE: f64 = 20.0;
const DEFAULT_LAYOUT_ITERATIONS: usize = 500;

/// citegraph 主配置结构
///
/// 所有字段都有默认值，配置文件中可只写需要覆盖的部分。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// 社区检测与力导向布局使用的随机种子
    pub seed: u64,
    pub community: CommunityConfig,
    pub central: CentralConfig,
    pub layout: LayoutConfig,
    pub style: StyleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CommunityConfig {
    /// 模块度分辨率参数
    pub resolution: f64,
    /// Louvain 聚合轮数上限
    pub max_passes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CentralConfig {
    /// 中心节点选择规则（per-community:K | top:K | threshold:T）
    pub rule: String,
    /// 中心性度量（betweenness | degree）
    pub measure: CentralityMeasure,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    pub algorithm: LayoutAlgorithm,
    /// 最大坐标绝对值（TikZ 单位）
    pub scale: f64,
    pub iterations: usize,
}

/// TikZ 输出样式
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StyleConfig {
    pub label: LabelStyle,
    /// 社区颜色调色板，按社区编号依次使用
    pub colors: Vec<String>,
    /// 填充色浓度（xcolor 的 `color!N` 写法）
    pub fill_opacity: u8,
    pub scalebox: f64,
    pub xscale: f64,
    pub yscale: f64,
    /// 节点标签字号命令
    pub font: String,
    /// 是否在输出中声明 bg 图层
    pub declare_layers: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            community: CommunityConfig::default(),
            central: CentralConfig::default(),
            layout: LayoutConfig::default(),
            style: StyleConfig::default(),
        }
    }
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            max_passes: 20,
        }
    }
}

impl Default for CentralConfig {
    fn default() -> Self {
        Self {
            rule: DEFAULT_CENTRAL_RULE.to_string(),
            measure: CentralityMeasure::Betweenness,
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            algorithm: LayoutAlgorithm::KamadaKawai,
            scale: DEFAULT_LAYOUT_SCALE,
            iterations: DEFAULT_LAYOUT_ITERATIONS,
        }
    }
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            label: LabelStyle::Cite,
            colors: crate::latex::DEFAULT_PALETTE
                .iter()
                .map(|c| c.to_string())
                .collect(),
            fill_opacity: 42,
            scalebox: 0.45,
            xscale: 0.9,
            yscale: 1.2,
            font: "\\LARGE".to_string(),
            declare_layers: false,
        }
    }
}

impl Config {
    /// 加载配置：未指定路径时使用默认配置
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            log::debug!("No config file given, using defaults");
            return Ok(Self::default());
        };

        let content =
            std::fs::read_to_string(path).map_err(|e| CiteGraphError::io(path, e))?;
        let config = Self::from_toml_str(&content).map_err(|message| CiteGraphError::Config {
            path: path.to_path_buf(),
            message,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn from_toml_str(content: &str) -> std::result::Result<Self, String> {
        let config: Self = toml::from_str(content).map_err(|e| e.to_string())?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.style.colors.is_empty() {
            return Err("style.colors 不能为空".to_string());
        }
        if self.style.fill_opacity > 100 {
            return Err("style.fill_opacity 必须在 0-100 之间".to_string());
        }
        if !(self.layout.scale > 0.0) {
            return Err("layout.scale 必须为正数".to_string());
        }
        if !(self.community.resolution > 0.0) {
            return Err("community.resolution 必须为正数".to_string());
        }
        self.central_rule().map_err(|e| e.to_string())?;
        Ok(())
    }

    /// 解析中心节点选择规则
    pub fn central_rule(&self) -> Result<CentralRule> {
        self.central.rule.parse()
    }
}
