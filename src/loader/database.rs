// 引文数据库读取（SQLite）
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

use crate::error::{CiteGraphError, Result};

/// 数据库中的一篇文章
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbArticle {
    /// 文章在数据库中的标识（msid 列，统一按文本处理）
    pub msid: String,
    pub title: String,
}

/// 一条引用记录：citing 引用了 cited
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbReference {
    pub citing: String,
    pub cited: String,
}

/// 只读的引文数据库
///
/// 需要两张表：`article(msid, title)` 和 `reference(article, reference)`，
/// 其中 `reference.article` 为施引文章，`reference.reference` 为被引文章。
pub struct CitationDatabase {
    conn: Connection,
    path: PathBuf,
}

impl CitationDatabase {
    /// 以只读方式打开数据库，文件不存在时不会创建
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CiteGraphError::io(
                path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "数据库文件不存在"),
            ));
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| CiteGraphError::database(path, e))?;

        let db = Self {
            conn,
            path: path.to_path_buf(),
        };
        for table in ["article", "reference"] {
            if !db.table_exists(table)? {
                return Err(CiteGraphError::Schema {
                    path: db.path.clone(),
                    table: table.to_string(),
                });
            }
        }

        log::debug!("Opened citation database {}", path.display());
        Ok(db)
    }

    fn table_exists(&self, name: &str) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name=?1",
                rusqlite::params![name],
                |row| row.get(0),
            )
            .map_err(|e| CiteGraphError::database(&self.path, e))?;
        Ok(count > 0)
    }

    /// 读取所有带标题的文章
    pub fn articles(&self) -> Result<Vec<DbArticle>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT DISTINCT CAST(msid AS TEXT), title FROM article \
                 WHERE msid IS NOT NULL AND title IS NOT NULL ORDER BY 1",
            )
            .map_err(|e| CiteGraphError::database(&self.path, e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DbArticle {
                    msid: row.get(0)?,
                    title: row.get(1)?,
                })
            })
            .and_then(|rows| rows.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(|e| CiteGraphError::database(&self.path, e))?;
        Ok(rows)
    }

    /// 读取所有引用记录（已去重）
    pub fn references(&self) -> Result<Vec<DbReference>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT DISTINCT CAST(article AS TEXT), CAST(reference AS TEXT) FROM reference \
                 WHERE article IS NOT NULL AND reference IS NOT NULL ORDER BY 1, 2",
            )
            .map_err(|e| CiteGraphError::database(&self.path, e))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DbReference {
                    citing: row.get(0)?,
                    cited: row.get(1)?,
                })
            })
            .and_then(|rows| rows.collect::<std::result::Result<Vec<_>, _>>())
            .map_err(|e| CiteGraphError::database(&self.path, e))?;
        Ok(rows)
    }
}
