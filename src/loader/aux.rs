// aux 文件解析 - 提取文档中实际引用的文献键
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::path::Path;

use crate::error::{CiteGraphError, Result};

lazy_static! {
    // BibTeX: \citation{key1,key2}
    static ref RE_CITATION: Regex = Regex::new(r"\\citation\{([^}]*)\}").unwrap();
    // biblatex: \abx@aux@cite{key} 或 \abx@aux@cite{0}{key}
    static ref RE_BIBLATEX_CITE: Regex =
        Regex::new(r"\\abx@aux@cite(?:\{[^}]*\})?\{([^}]*)\}").unwrap();
}

/// 读取 aux 文件并返回引用键（按首次出现顺序去重）
pub fn read_aux(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| CiteGraphError::io(path, e))?;
    let keys = parse_aux(&content);
    log::debug!("Found {} citation keys in {}", keys.len(), path.display());
    Ok(keys)
}

/// 从 aux 文本中提取引用键
pub fn parse_aux(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();

    for line in content.lines() {
        let groups = RE_CITATION
            .captures_iter(line)
            .chain(RE_BIBLATEX_CITE.captures_iter(line));
        for caps in groups {
            for key in caps[1].split(',') {
                let key = key.trim();
                // \nocite{*} 产生的通配符不对应具体文献
                if key.is_empty() || key == "*" {
                    continue;
                }
                if seen.insert(key.to_string()) {
                    keys.push(key.to_string());
                }
            }
        }
    }

    keys
}
