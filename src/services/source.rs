//! # 行数据来源
//!
//! 为解析管线提供按顺序排列的原始行，管线本身不关心行来自哪里。
//!
//! ## 读取方式
//! - `read_lines`：一次性读取整个文件（`tokio::fs::read_to_string`），
//!   对典型的会话文件大小这是最高效的方式
//! - `read_sample`：逐行读取，只取前 N 行，用于超大文件的快速预览
//!
//! 两者都在文件不存在时返回空列表，与会话被删除后重新加载的场景保持一致。
//! 空行原样保留，由解析器跳过，这样行号与文件中的实际行号一致。

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

/// 行数据读取错误
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("读取会话文件失败 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SourceError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// 读取文件的全部行
///
/// # 参数
/// - `path` - JSONL 文件路径
///
/// # 返回值
/// 按文件顺序排列的行；文件不存在时返回空列表
///
/// # 错误
/// 文件存在但无法读取（权限、非 UTF-8 等）时返回 `SourceError::Io`
pub async fn read_lines(path: &Path) -> Result<Vec<String>, SourceError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SourceError::io(path, e)),
    };
    Ok(content.lines().map(str::to_string).collect())
}

/// 有界采样：只读取文件的前 `max_lines` 行
///
/// 逐行读取，读满即停止，不会把整个文件载入内存。
pub async fn read_sample(path: &Path, max_lines: usize) -> Result<Vec<String>, SourceError> {
    let file = match tokio::fs::File::open(path).await {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(SourceError::io(path, e)),
    };

    let mut reader = BufReader::new(file).lines();
    let mut lines = Vec::with_capacity(max_lines.min(4096));
    while lines.len() < max_lines {
        match reader.next_line().await {
            Ok(Some(line)) => lines.push(line),
            Ok(None) => break,
            Err(e) => return Err(SourceError::io(path, e)),
        }
    }

    log::debug!("采样读取 {}: {} 行", path.display(), lines.len());
    Ok(lines)
}

/// 按设置选择整文件读取或有界采样
pub async fn load_lines(path: &Path, sample: Option<usize>) -> Result<Vec<String>, SourceError> {
    match sample {
        Some(max_lines) => read_sample(path, max_lines).await,
        None => read_lines(path).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn fixture(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[tokio::test]
    async fn test_read_lines_keeps_order_and_blanks() {
        let file = fixture(&["{\"a\":1}", "", "{\"b\":2}"]);
        let lines = read_lines(file.path()).await.unwrap();
        assert_eq!(lines, vec!["{\"a\":1}", "", "{\"b\":2}"]);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("gone.jsonl");
        assert!(read_lines(&missing).await.unwrap().is_empty());
        assert!(read_sample(&missing, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sample_is_bounded() {
        let file = fixture(&["1", "2", "3", "4"]);
        assert_eq!(read_sample(file.path(), 2).await.unwrap(), vec!["1", "2"]);
        assert_eq!(read_sample(file.path(), 10).await.unwrap().len(), 4);
        assert_eq!(load_lines(file.path(), Some(3)).await.unwrap().len(), 3);
        assert_eq!(load_lines(file.path(), None).await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_directory_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_lines(dir.path()).await.unwrap_err();
        assert!(matches!(err, SourceError::Io { .. }));
    }
}
