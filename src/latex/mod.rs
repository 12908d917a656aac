// LaTeX 输出 - 生成 TikZ 绘图命令并原子写入目标文件
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::io::Write as _;
use std::path::Path;

use crate::citation_graph::{ArticleNode, CitationGraph};
use crate::config::StyleConfig;
use crate::error::{CiteGraphError, Result};

/// 默认社区调色板（xcolor 基础颜色名）
pub const DEFAULT_PALETTE: &[&str] = &[
    "cyan", "red", "green", "violet", "orange", "blue", "magenta", "brown", "teal", "olive",
];

/// 调色板用尽后混色使用的比例
const MIX_RATIOS: &[u8] = &[50, 25, 75, 10, 90, 35, 65];

/// 节点标签样式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LabelStyle {
    /// `\cite{key}`，无 BibTeX 条目时退回 `\texttt{key}`
    #[default]
    Cite,
    /// `\texttt{key}`
    Key,
    /// 文献标题，无标题时退回 `\texttt{key}`
    Title,
}

/// 为 `count` 个社区分配颜色
///
/// 先按顺序使用调色板，再依次使用两两混色 `a!N!b`，结果互不相同。
pub fn community_colors(palette: &[String], count: usize) -> Vec<String> {
    let mut colors: Vec<String> = Vec::with_capacity(count);
    let mut seen: HashSet<String> = HashSet::new();
    for color in palette {
        if colors.len() == count {
            return colors;
        }
        if seen.insert(color.clone()) {
            colors.push(color.clone());
        }
    }

    let mut base: Vec<String> = colors.clone();
    if !base.iter().any(|c| c == "black") {
        base.push("black".to_string());
    }
    'mix: for &ratio in MIX_RATIOS {
        for (i, a) in base.iter().enumerate() {
            for b in &base[i + 1..] {
                if colors.len() == count {
                    break 'mix;
                }
                let mixed = format!("{a}!{ratio}!{b}");
                if seen.insert(mixed.clone()) {
                    colors.push(mixed);
                }
            }
        }
    }

    if colors.len() < count {
        log::warn!("⚠️ {count} communities exceed the available colors, colors will repeat");
        let distinct = colors.len().max(1);
        for i in colors.len()..count {
            let reused = colors.get(i % distinct).cloned().unwrap_or_else(|| "black".to_string());
            colors.push(reused);
        }
    }
    colors
}

/// 由引用键生成 TikZ 节点名：非字母数字替换为 `-`，重名时追加序号
pub fn node_names<'a>(keys: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    keys.into_iter()
        .map(|key| {
            let base: String = key
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
                .collect();
            let base = if base.is_empty() { "node".to_string() } else { base };
            let mut name = base.clone();
            let mut suffix = 2;
            while used.contains(&name) {
                name = format!("{base}-{suffix}");
                suffix += 1;
            }
            used.insert(name.clone());
            name
        })
        .collect()
}

/// 转义 LaTeX 特殊字符
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\textbackslash{}"),
            '{' | '}' | '$' | '&' | '#' | '%' | '_' => {
                out.push('\\');
                out.push(c);
            }
            '^' => out.push_str("\\textasciicircum{}"),
            '~' => out.push_str("\\textasciitilde{}"),
            _ => out.push(c),
        }
    }
    out
}

/// 坐标保留两位小数，避免输出 `-0.00`
fn coordinate(value: f64) -> String {
    let s = format!("{value:.2}");
    if s == "-0.00" {
        "0.00".to_string()
    } else {
        s
    }
}

fn label(node: &ArticleNode, style: LabelStyle) -> String {
    let texttt = || format!("\\texttt{{{}}}", escape_latex(&node.key));
    match style {
        LabelStyle::Cite if node.has_entry => format!("\\cite{{{}}}", node.key),
        // 标题本身是 LaTeX 源码，原样输出
        LabelStyle::Title => match &node.title {
            Some(title) => title.clone(),
            None => texttt(),
        },
        LabelStyle::Cite | LabelStyle::Key => texttt(),
    }
}

fn with_font(font: &str, label: &str) -> String {
    if font.is_empty() {
        label.to_string()
    } else if label.starts_with('\\') {
        format!("{font}{label}")
    } else {
        format!("{font} {label}")
    }
}

/// 生成 TikZ 片段
///
/// 普通节点先输出、中心节点最后输出；边位于 `bg` 图层。
pub fn render(graph: &CitationGraph, style: &StyleConfig) -> String {
    let community_count = graph
        .nodes()
        .filter_map(|n| n.community)
        .max()
        .map_or(0, |c| c + 1);
    let colors = community_colors(&style.colors, community_count);
    let names = node_names(graph.nodes().map(|n| n.key.as_str()));

    let mut out = String::new();
    out.push_str("\\tikzstyle{vertex}=[rectangle, minimum size=5pt]\n");
    out.push_str("\\tikzstyle{border} = [vertex, draw, line width=2pt, inner sep=2pt]\n");
    out.push_str("\\tikzstyle{edge} = [draw, very thick, ->, black!42]\n");
    for (c, color) in colors.iter().enumerate() {
        let _ = writeln!(
            out,
            "\\tikzstyle{{c{c} vertex}} = [vertex, fill={color}!{}]",
            style.fill_opacity
        );
        let _ = writeln!(
            out,
            "\\tikzstyle{{c{c} vertex border}} = [border, fill={color}!{}]",
            style.fill_opacity
        );
    }

    if style.declare_layers {
        out.push_str("\n\\pgfdeclarelayer{bg}\n\\pgfsetlayers{bg,main}\n");
    }

    let _ = write!(
        out,
        "\n\\scalebox{{{}}}{{\n\\begin{{tikzpicture}}[xscale={}, yscale={}, auto, swap]\n",
        style.scalebox, style.xscale, style.yscale
    );

    let mut central = String::new();
    for (node, name) in graph.nodes().zip(&names) {
        let position = node.position.unwrap_or(crate::layout::Position::new(0.0, 0.0));
        let community = node.community.unwrap_or(0);
        let line = format!(
            "\\node[c{community} vertex{}] ({name}) at ({}, {}) {{{}}};\n",
            if node.is_central { " border" } else { "" },
            coordinate(position.x),
            coordinate(position.y),
            with_font(&style.font, &label(node, style.label))
        );
        if node.is_central {
            central.push_str(&line);
        } else {
            out.push_str(&line);
        }
    }
    out.push_str(&central);

    let name_of: HashMap<&str, &str> = graph
        .nodes()
        .map(|n| n.key.as_str())
        .zip(names.iter().map(String::as_str))
        .collect();
    out.push_str("\n\\begin{pgfonlayer}{bg}\n");
    for (citing, cited) in graph.edges() {
        let _ = writeln!(out, "\\path[edge] ({}) -- ({});", name_of[citing], name_of[cited]);
    }
    out.push_str("\\end{pgfonlayer}\n\n");
    out.push_str("\\end{tikzpicture}\n}\n");
    out
}

/// 原子写入：先写入目标目录下的临时文件，再重命名为目标文件
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file =
        tempfile::NamedTempFile::new_in(dir).map_err(|e| CiteGraphError::output(path, e))?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.flush())
        .map_err(|e| CiteGraphError::output(path, e))?;
    if let Some(permissions) = target_permissions(path) {
        file.as_file()
            .set_permissions(permissions)
            .map_err(|e| CiteGraphError::output(path, e))?;
    }
    file.persist(path)
        .map_err(|e| CiteGraphError::output(path, e.error))?;
    log::debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// 覆盖已有文件时沿用其权限，新建文件为 0644
fn target_permissions(path: &Path) -> Option<std::fs::Permissions> {
    if let Ok(metadata) = std::fs::metadata(path) {
        return Some(metadata.permissions());
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(std::fs::Permissions::from_mode(0o644))
    }
    #[cfg(not(unix))]
    {
        None
    }
}
