// BibTeX 解析 - 只读取生成节点标签需要的条目字段
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::error::{CiteGraphError, Result};

/// BibTeX 条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibEntry {
    /// 条目类型（小写），如 article、inproceedings
    pub entry_type: String,
    /// 引用键
    pub key: String,
    /// 字段（字段名小写，值已合并空白）
    pub fields: BTreeMap<String, String>,
    /// 条目起始行号
    pub line: usize,
}

impl BibEntry {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// 标题（LaTeX 源文本）
    pub fn title(&self) -> Option<&str> {
        self.field("title")
    }
}

/// 读取并解析 BibTeX 文件
pub fn read_bibtex(path: &Path) -> Result<Vec<BibEntry>> {
    let content = std::fs::read_to_string(path).map_err(|e| CiteGraphError::io(path, e))?;
    let entries = parse_bibtex(&content).map_err(|(line, message)| CiteGraphError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    })?;
    log::debug!("Parsed {} BibTeX entries from {}", entries.len(), path.display());
    Ok(entries)
}

/// 解析 BibTeX 文本。出错时返回 (行号, 错误描述)
pub fn parse_bibtex(content: &str) -> std::result::Result<Vec<BibEntry>, (usize, String)> {
    let mut parser = Parser::new(content);
    let mut entries = Vec::new();

    while parser.skip_to_entry() {
        if let Some(entry) = parser.entry()? {
            entries.push(entry);
        }
    }

    Ok(entries)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    line: usize,
    /// @string 宏（名称小写）
    strings: HashMap<String, String>,
}

/// BibTeX 预定义的月份宏
const MONTHS: [(&str, &str); 12] = [
    ("jan", "January"),
    ("feb", "February"),
    ("mar", "March"),
    ("apr", "April"),
    ("may", "May"),
    ("jun", "June"),
    ("jul", "July"),
    ("aug", "August"),
    ("sep", "September"),
    ("oct", "October"),
    ("nov", "November"),
    ("dec", "December"),
];

type ParseResult<T> = std::result::Result<T, (usize, String)>;

impl Parser {
    fn new(content: &str) -> Self {
        Self {
            chars: content.chars().collect(),
            pos: 0,
            line: 1,
            strings: MONTHS
                .iter()
                .map(|(name, month)| (name.to_string(), month.to_string()))
                .collect(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn error<T>(&self, message: impl Into<String>) -> ParseResult<T> {
        Err((self.line, message.into()))
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    /// 跳过条目之间的自由文本，停在 '@' 之后
    fn skip_to_entry(&mut self) -> bool {
        while let Some(c) = self.bump() {
            if c == '@' {
                return true;
            }
        }
        false
    }

    fn expect(&mut self, expected: char) -> ParseResult<()> {
        self.skip_whitespace();
        match self.bump() {
            Some(c) if c == expected => Ok(()),
            Some(c) => self.error(format!("期望 '{expected}'，实际为 '{c}'")),
            None => self.error(format!("期望 '{expected}'，文件已结束")),
        }
    }

    fn identifier(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || "_-:./+'".contains(c) {
                ident.push(c);
                self.bump();
            } else {
                break;
            }
        }
        ident
    }

    /// 解析 '@' 之后的一个块；注释类块返回 None
    fn entry(&mut self) -> ParseResult<Option<BibEntry>> {
        let start_line = self.line;
        self.skip_whitespace();
        let entry_type = self.identifier().to_lowercase();
        if entry_type.is_empty() {
            return self.error("'@' 后缺少条目类型");
        }

        self.skip_whitespace();
        let close = match self.bump() {
            Some('{') => '}',
            Some('(') => ')',
            _ => return self.error(format!("条目 @{entry_type} 缺少左括号")),
        };

        match entry_type.as_str() {
            "comment" | "preamble" => {
                self.skip_balanced(close)?;
                return Ok(None);
            }
            "string" => {
                self.string_definition(close)?;
                return Ok(None);
            }
            _ => {}
        }

        self.skip_whitespace();
        let mut key = String::new();
        while let Some(c) = self.peek() {
            if c == ',' || c == close {
                break;
            }
            if c == '\n' {
                return self.error(format!("条目 @{entry_type} 的引用键未以逗号结束"));
            }
            key.push(c);
            self.bump();
        }
        let key = key.trim().to_string();
        if key.is_empty() {
            return self.error(format!("条目 @{entry_type} 缺少引用键"));
        }

        let mut fields = BTreeMap::new();
        loop {
            self.skip_whitespace();
            match self.bump() {
                Some(',') => {}
                Some(c) if c == close => break,
                Some(c) => return self.error(format!("条目 {key} 中出现意外字符 '{c}'")),
                None => return self.error(format!("条目 {key} 未闭合")),
            }

            self.skip_whitespace();
            // 允许最后一个字段后跟逗号
            if self.peek() == Some(close) {
                self.bump();
                break;
            }

            let name = self.identifier().to_lowercase();
            if name.is_empty() {
                return self.error(format!("条目 {key} 中缺少字段名"));
            }
            self.expect('=')?;
            let value = self.value(close)?;
            fields.insert(name, collapse_whitespace(&value));
        }

        Ok(Some(BibEntry {
            entry_type,
            key,
            fields,
            line: start_line,
        }))
    }

    /// `@string{name = value}`，记录的宏在之后的字段值中展开
    fn string_definition(&mut self, close: char) -> ParseResult<()> {
        self.skip_whitespace();
        let name = self.identifier().to_lowercase();
        if name.is_empty() {
            return self.error("@string 缺少宏名");
        }
        self.expect('=')?;
        let value = self.value(close)?;
        self.expect(close)?;
        self.strings.insert(name, collapse_whitespace(&value));
        Ok(())
    }

    /// 字段值：由 '#' 连接的若干 {…}、"…" 或裸词
    fn value(&mut self, close: char) -> ParseResult<String> {
        let mut value = String::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('{') => {
                    self.bump();
                    value.push_str(&self.braced()?);
                }
                Some('"') => {
                    self.bump();
                    value.push_str(&self.quoted()?);
                }
                Some(c) if c != ',' && c != close => {
                    let word = self.identifier();
                    if word.is_empty() {
                        return self.error(format!("无法识别的字段值起始字符 '{c}'"));
                    }
                    self.push_word(&mut value, &word);
                }
                _ => return self.error("字段值为空"),
            }

            self.skip_whitespace();
            if self.peek() == Some('#') {
                self.bump();
            } else {
                return Ok(value);
            }
        }
    }

    /// 裸词：数字原样保留，已定义的宏展开
    fn push_word(&self, value: &mut String, word: &str) {
        if word.chars().all(|c| c.is_ascii_digit()) {
            value.push_str(word);
        } else if let Some(expansion) = self.strings.get(&word.to_lowercase()) {
            value.push_str(expansion);
        } else {
            log::debug!("Undefined BibTeX macro '{}' on line {}, kept as is", word, self.line);
            value.push_str(word);
        }
    }

    /// 读取到匹配的 '}'，保留内部花括号
    fn braced(&mut self) -> ParseResult<String> {
        let mut depth = 1usize;
        let mut text = String::new();
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(text);
                    }
                }
                '\\' => {
                    // 转义的花括号不参与计数
                    text.push(c);
                    if let Some(next) = self.bump() {
                        text.push(next);
                    }
                    continue;
                }
                _ => {}
            }
            text.push(c);
        }
        self.error("花括号未闭合")
    }

    fn quoted(&mut self) -> ParseResult<String> {
        let mut depth = 0usize;
        let mut text = String::new();
        while let Some(c) = self.bump() {
            match c {
                '{' => depth += 1,
                '}' => depth = depth.saturating_sub(1),
                '"' if depth == 0 => return Ok(text),
                _ => {}
            }
            text.push(c);
        }
        self.error("引号未闭合")
    }

    fn skip_balanced(&mut self, close: char) -> ParseResult<()> {
        let open = if close == '}' { '{' } else { '(' };
        let mut depth = 1usize;
        while let Some(c) = self.bump() {
            if c == open {
                depth += 1;
            } else if c == close {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
        }
        self.error("注释块未闭合")
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
