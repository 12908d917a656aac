// 数据加载 - 读取 aux、BibTeX、排除列表和引文数据库，并将数据库文章解析为引用键
pub mod aux;
pub mod bibtex;
pub mod database;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use crate::error::{CiteGraphError, Result};
use bibtex::BibEntry;
use database::CitationDatabase;

lazy_static! {
    static ref RE_NON_ALNUM: Regex = Regex::new(r"[^a-z0-9]").unwrap();
    static ref RE_SPACES: Regex = Regex::new(r" +").unwrap();
}

/// 输入文件路径
#[derive(Debug, Clone)]
pub struct InputPaths {
    pub database: PathBuf,
    pub aux: PathBuf,
    pub bibtex: PathBuf,
    pub exclude: Option<PathBuf>,
}

/// 排除列表文件格式：`{"excluded": ["key1", "key2"]}`
#[derive(Debug, Deserialize)]
struct ExcludeList {
    excluded: Vec<String>,
}

/// 加载阶段的产物
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// 综述实际引用的键（按首次出现顺序，已去除排除项）
    pub cited_keys: Vec<String>,
    /// 引用键对应的 BibTeX 条目（只含被引用的键）
    pub entries: HashMap<String, BibEntry>,
    /// 两端都能解析为引用键的引用关系 (施引键, 被引键)
    pub citations: BTreeSet<(String, String)>,
    /// 至少一端无法解析为引用键的引用记录数
    pub unresolved_references: usize,
    /// 在数据库中找到了对应文章的被引用键
    pub keys_in_database: HashSet<String>,
}

/// 标题归一化：小写，非字母数字替换为空格，合并连续空格
pub fn clean_title(title: &str) -> String {
    let lower = title.to_lowercase();
    let replaced = RE_NON_ALNUM.replace_all(&lower, " ");
    RE_SPACES.replace_all(&replaced, " ").trim().to_string()
}

/// 读取排除列表
pub fn read_exclude(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| CiteGraphError::io(path, e))?;
    let list: ExcludeList =
        serde_json::from_str(&content).map_err(|source| CiteGraphError::Exclude {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(list.excluded)
}

/// 加载全部输入
///
/// 任何输入文件缺失或格式错误都会直接返回错误；数据不一致只记录警告。
pub fn load(paths: &InputPaths) -> Result<Corpus> {
    let excluded: HashSet<String> = match &paths.exclude {
        Some(path) => read_exclude(path)?.into_iter().collect(),
        None => HashSet::new(),
    };

    let aux_keys = aux::read_aux(&paths.aux)?;
    let total_cited = aux_keys.len();
    let cited_keys: Vec<String> = aux_keys
        .into_iter()
        .filter(|k| !excluded.contains(k))
        .collect();
    log::info!(
        "Found {} cited keys in {} ({} excluded)",
        cited_keys.len(),
        paths.aux.display(),
        total_cited - cited_keys.len()
    );

    let bib_entries = bibtex::read_bibtex(&paths.bibtex)?;

    let db = CitationDatabase::open(&paths.database)?;
    let articles = db.articles()?;
    let references = db.references()?;
    drop(db);
    log::info!(
        "Loaded {} articles and {} references from {}",
        articles.len(),
        references.len(),
        paths.database.display()
    );

    Ok(resolve(cited_keys, bib_entries, &articles, &references))
}

/// 通过归一化标题把数据库文章对应到引用键
fn resolve(
    cited_keys: Vec<String>,
    bib_entries: Vec<BibEntry>,
    articles: &[database::DbArticle],
    references: &[database::DbReference],
) -> Corpus {
    let cited: HashSet<&str> = cited_keys.iter().map(String::as_str).collect();

    // 归一化标题 -> 引用键；同名标题优先对应被引用的键
    let mut title_to_key: HashMap<String, String> = HashMap::new();
    let mut entries: HashMap<String, BibEntry> = HashMap::new();
    for entry in bib_entries {
        if let Some(title) = entry.title() {
            let normalized = clean_title(title);
            if !normalized.is_empty() {
                let replace = match title_to_key.get(&normalized) {
                    None => true,
                    Some(existing) => {
                        if existing != &entry.key {
                            log::warn!(
                                "⚠️ BibTeX entries '{}' and '{}' share the title \"{}\"",
                                existing,
                                entry.key,
                                normalized
                            );
                        }
                        !cited.contains(existing.as_str()) && cited.contains(entry.key.as_str())
                    }
                };
                if replace {
                    title_to_key.insert(normalized, entry.key.clone());
                }
            }
        }
        if cited.contains(entry.key.as_str()) {
            if entries.contains_key(&entry.key) {
                log::warn!("⚠️ Duplicate BibTeX entry '{}', keeping the first one", entry.key);
            } else {
                entries.insert(entry.key.clone(), entry);
            }
        }
    }

    let msid_to_key: HashMap<&str, &str> = articles
        .iter()
        .filter_map(|a| {
            title_to_key
                .get(&clean_title(&a.title))
                .map(|key| (a.msid.as_str(), key.as_str()))
        })
        .collect();
    let keys_in_database: HashSet<String> = msid_to_key
        .values()
        .filter(|k| cited.contains(**k))
        .map(|k| k.to_string())
        .collect();

    for key in &cited_keys {
        if !entries.contains_key(key) {
            log::warn!("⚠️ No BibTeX entry for cited key '{key}', using the key as label");
        } else if !keys_in_database.contains(key) {
            log::warn!("⚠️ No database article matches cited key '{key}', node has no citations");
        }
    }

    let mut citations = BTreeSet::new();
    let mut unresolved_references = 0;
    for r in references {
        match (
            msid_to_key.get(r.citing.as_str()),
            msid_to_key.get(r.cited.as_str()),
        ) {
            (Some(citing), Some(cited)) => {
                citations.insert((citing.to_string(), cited.to_string()));
            }
            _ => unresolved_references += 1,
        }
    }
    log::debug!(
        "Resolved {} citations, {} references without a citation key",
        citations.len(),
        unresolved_references
    );

    Corpus {
        cited_keys,
        entries,
        citations,
        unresolved_references,
        keys_in_database,
    }
}

#[cfg(test)]
mod tests {
    use super::database::{DbArticle, DbReference};
    use super::*;

    fn entry(key: &str, title: &str) -> BibEntry {
        let mut fields = std::collections::BTreeMap::new();
        fields.insert("title".to_string(), title.to_string());
        BibEntry {
            entry_type: "article".to_string(),
            key: key.to_string(),
            fields,
            line: 1,
        }
    }

    fn article(msid: &str, title: &str) -> DbArticle {
        DbArticle {
            msid: msid.to_string(),
            title: title.to_string(),
        }
    }

    fn reference(citing: &str, cited: &str) -> DbReference {
        DbReference {
            citing: citing.to_string(),
            cited: cited.to_string(),
        }
    }

    #[test]
    fn test_clean_title() {
        assert_eq!(clean_title("On {Location}-Privacy:  A Survey!"), "on location privacy a survey");
        assert_eq!(clean_title("  "), "");
    }

    #[test]
    fn test_resolve_by_normalized_title() {
        let corpus = resolve(
            vec!["A".into(), "B".into()],
            vec![entry("A", "Alpha: Paper"), entry("B", "{Beta} paper"), entry("D", "Delta")],
            &[
                article("1", "alpha paper"),
                article("2", "BETA PAPER"),
                article("4", "Delta"),
                article("9", "Unknown"),
            ],
            &[reference("1", "2"), reference("4", "1"), reference("9", "1")],
        );

        assert_eq!(corpus.entries.len(), 2);
        assert!(corpus.citations.contains(&("A".to_string(), "B".to_string())));
        // D 可解析但未被引用，由建图阶段过滤
        assert!(corpus.citations.contains(&("D".to_string(), "A".to_string())));
        assert_eq!(corpus.unresolved_references, 1);
        assert!(corpus.keys_in_database.contains("A"));
        assert!(!corpus.keys_in_database.contains("D"));
    }

    #[test]
    fn test_duplicate_db_titles_map_to_same_key() {
        let corpus = resolve(
            vec!["A".into(), "B".into()],
            vec![entry("A", "Alpha"), entry("B", "Beta")],
            &[article("1", "Alpha"), article("11", "alpha"), article("2", "Beta")],
            &[reference("1", "2"), reference("11", "2")],
        );
        assert_eq!(corpus.citations.len(), 1);
    }

    #[test]
    fn test_shared_title_prefers_cited_key() {
        let corpus = resolve(
            vec!["B".into()],
            vec![entry("A", "Same Title"), entry("B", "Same title")],
            &[article("1", "same title")],
            &[],
        );
        assert!(corpus.keys_in_database.contains("B"));
    }

    #[test]
    fn test_read_exclude() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("exclude.json");
        std::fs::write(&path, r#"{"excluded": ["A", "C"]}"#).unwrap();
        assert_eq!(read_exclude(&path).unwrap(), vec!["A", "C"]);

        std::fs::write(&path, r#"["A"]"#).unwrap();
        assert!(matches!(read_exclude(&path), Err(CiteGraphError::Exclude { .. })));
    }
}
