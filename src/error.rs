// citegraph 错误处理模块
//
// 提供用户友好的错误信息和详细的日志记录

use std::path::{Path, PathBuf};

use log::{debug, error};
use thiserror::Error;

/// citegraph 统一错误类型
#[derive(Debug, Error)]
pub enum CiteGraphError {
    /// 输入文件读取失败
    #[error("无法读取文件 {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 数据库打开或查询失败
    #[error("数据库错误 ({}): {source}", path.display())]
    Database {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// 数据库缺少必要的表
    #[error("数据库 {} 缺少数据表 '{table}'", path.display())]
    Schema { path: PathBuf, table: String },

    /// 输入文件格式错误
    #[error("解析失败 {}:{line}: {message}", path.display())]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// 排除列表格式错误
    #[error("排除列表格式错误 {}: {source}", path.display())]
    Exclude {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// 配置文件错误
    #[error("配置错误 ({}): {message}", path.display())]
    Config { path: PathBuf, message: String },

    /// 输出文件写入失败
    #[error("无法写入输出文件 {}: {source}", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 中心节点选择规则无效
    #[error("无效的中心节点规则 '{0}'")]
    InvalidRule(String),
}

impl CiteGraphError {
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn database(path: &Path, source: rusqlite::Error) -> Self {
        Self::Database {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn output(path: &Path, source: std::io::Error) -> Self {
        Self::Output {
            path: path.to_path_buf(),
            source,
        }
    }

    /// 获取用户友好的错误消息
    pub fn user_message(&self) -> String {
        let hint = match self {
            Self::Io { .. } => "检查文件路径和读取权限",
            Self::Database { .. } | Self::Schema { .. } => {
                "数据库需要包含 article(msid, title) 和 reference(article, reference) 两张表"
            }
            Self::Parse { .. } => "文件格式可能不正确，请检查对应行",
            Self::Exclude { .. } => "排除列表应为 {\"excluded\": [\"key1\", \"key2\"]}",
            Self::Config { .. } => "检查 TOML 配置文件的字段名和取值",
            Self::Output { .. } => "确认输出目录存在且可写",
            Self::InvalidRule(_) => "可用规则: per-community:K、top:K、threshold:T",
        };
        format!("❌ {self}\n💡 提示: {hint}")
    }

    /// 记录错误到日志
    pub fn log(&self) {
        match self {
            Self::InvalidRule(_) | Self::Config { .. } => debug!("{self:?}"),
            _ => error!("{self:?}"),
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, CiteGraphError>;
