#![allow(dead_code)]

use rusqlite::Connection;
use std::path::PathBuf;
use tempfile::TempDir;

use citegraph::loader::InputPaths;

/// 临时目录中的一组输入文件
pub struct Fixture {
    pub dir: TempDir,
    pub database: PathBuf,
    pub aux: PathBuf,
    pub bibtex: PathBuf,
}

impl Fixture {
    /// `articles` 为 (key, title)，`citations` 为 (施引键, 被引键)，`cited` 为 aux 中引用的键
    pub fn new(articles: &[(&str, &str)], citations: &[(&str, &str)], cited: &[&str]) -> Self {
        let dir = TempDir::new().unwrap();

        let database = dir.path().join("refs.db");
        let conn = Connection::open(&database).unwrap();
        conn.execute_batch(
            "CREATE TABLE article (msid INTEGER PRIMARY KEY, title TEXT);
             CREATE TABLE reference (article INTEGER, reference INTEGER);",
        )
        .unwrap();
        let msid = |key: &str| articles.iter().position(|(k, _)| *k == key).unwrap() as i64 + 100;
        for (key, title) in articles {
            // 数据库标题大小写与标点和 BibTeX 不同，依赖归一化匹配
            conn.execute(
                "INSERT INTO article (msid, title) VALUES (?1, ?2)",
                rusqlite::params![msid(key), title.to_uppercase().replace(' ', " - ")],
            )
            .unwrap();
        }
        for (citing, cited) in citations {
            conn.execute(
                "INSERT INTO reference (article, reference) VALUES (?1, ?2)",
                rusqlite::params![msid(citing), msid(cited)],
            )
            .unwrap();
        }
        drop(conn);

        let bibtex = dir.path().join("refs.bib");
        let bib: String = articles
            .iter()
            .map(|(key, title)| {
                format!("@article{{{key},\n  title = {{{title}}},\n  year = 2019,\n}}\n\n")
            })
            .collect();
        std::fs::write(&bibtex, bib).unwrap();

        let aux = dir.path().join("main.aux");
        let aux_content = format!(
            "\\relax\n\\citation{{{}}}\n\\bibstyle{{plain}}\n\\bibdata{{refs}}\n",
            cited.join(",")
        );
        std::fs::write(&aux, aux_content).unwrap();

        Self {
            dir,
            database,
            aux,
            bibtex,
        }
    }

    /// A、B、C、D 四篇文献，A→B、B→C、C→A、D→A，aux 只引用 A、B、C
    pub fn triangle() -> Self {
        Self::new(
            &[
                ("A", "Alpha Paper"),
                ("B", "Beta Paper"),
                ("C", "Gamma Paper"),
                ("D", "Delta Paper"),
            ],
            &[("A", "B"), ("B", "C"), ("C", "A"), ("D", "A")],
            &["A", "B", "C"],
        )
    }

    /// 两个四节点团，K4→K5 为桥
    pub fn two_cliques() -> Self {
        let keys = ["K1", "K2", "K3", "K4", "K5", "K6", "K7", "K8"];
        let titles: Vec<String> = (1..=8).map(|i| format!("Paper number {i}")).collect();
        let articles: Vec<(&str, &str)> = keys
            .iter()
            .zip(&titles)
            .map(|(k, t)| (*k, t.as_str()))
            .collect();
        let mut citations = Vec::new();
        for group in [&keys[..4], &keys[4..]] {
            for (i, a) in group.iter().enumerate() {
                for b in &group[i + 1..] {
                    citations.push((*a, *b));
                }
            }
        }
        citations.push(("K4", "K5"));
        Self::new(&articles, &citations, &keys)
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn inputs(&self) -> InputPaths {
        InputPaths {
            database: self.database.clone(),
            aux: self.aux.clone(),
            bibtex: self.bibtex.clone(),
            exclude: None,
        }
    }
}

/// 输出中的节点名（按出现顺序）
pub fn node_names(tex: &str) -> Vec<String> {
    tex.lines()
        .filter(|l| l.starts_with("\\node["))
        .filter_map(|l| {
            let start = l.find("] (")? + 3;
            let end = start + l[start..].find(')')?;
            Some(l[start..end].to_string())
        })
        .collect()
}

/// 输出中的边
pub fn edges(tex: &str) -> Vec<(String, String)> {
    tex.lines()
        .filter_map(|l| l.strip_prefix("\\path[edge] ("))
        .filter_map(|l| {
            let (a, rest) = l.split_once(") -- (")?;
            let b = rest.strip_suffix(");")?;
            Some((a.to_string(), b.to_string()))
        })
        .collect()
}
