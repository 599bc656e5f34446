//! Loader for the cleaned TSV corpora (`*_no_ignore_en*.tsv`, `*_no_ignore_clm.tsv`).
//!
//! Cells that are missing in the TSV read as empty strings. Only `id` and
//! `label` are required to carry a value.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::DataError;
use crate::types::{Comment, NewsLabel, RawNewsRecord};

/// Separator between comments in the `comments` column.
const COMMENT_SEP: &str = "::";
/// Separator between a comment's text and its score.
const SCORE_SEP: &str = "<>";
/// Separator between entity groups and between claims.
const GROUP_SEP: &str = "||";

/// Claims attached to each knowledge-graph entity.
pub type EntityClaims = HashMap<String, Vec<String>>;

/// All records of one data source, in file order.
#[derive(Debug, Clone)]
pub struct RawCorpus {
    pub records: Vec<RawNewsRecord>,
}

/// Counts over a raw corpus.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CorpusSummary {
    pub records: usize,
    pub with_image: usize,
    pub real: usize,
    pub fake: usize,
    pub total_comments: usize,
}

impl RawCorpus {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn summary(&self) -> CorpusSummary {
        let mut summary = CorpusSummary {
            records: self.records.len(),
            ..Default::default()
        };
        for record in &self.records {
            if record.image_path.is_some() {
                summary.with_image += 1;
            }
            match record.label {
                NewsLabel::Real => summary.real += 1,
                NewsLabel::Fake => summary.fake += 1,
            }
            summary.total_comments += record.comments.len();
        }
        summary
    }
}

/// Path of the entity/claims TSV for a data source.
pub fn claims_path(data_dir: &Path, data_source: &str) -> PathBuf {
    data_dir.join(format!("{data_source}_no_ignore_clm.tsv"))
}

/// Path of the news TSV for a data source.
pub fn records_path(data_dir: &Path, data_source: &str, suffix: &str) -> PathBuf {
    data_dir.join(format!("{data_source}_no_ignore_en{suffix}.tsv"))
}

/// Expected location of an article's image.
///
/// Images live under `{data_dir}/{data_source}/news_images/{real|fake}/` and
/// are named after the part of the data source before the first `_`.
pub fn image_path(data_dir: &Path, data_source: &str, id: &str, label: NewsLabel) -> PathBuf {
    let prefix = data_source.split('_').next().unwrap_or(data_source);
    data_dir
        .join(data_source)
        .join("news_images")
        .join(label.image_dir())
        .join(format!("{prefix}_{id}.jpg"))
}

/// Load the entity → claims map.
pub fn load_entity_claims(data_dir: &Path, data_source: &str) -> Result<EntityClaims, DataError> {
    let path = claims_path(data_dir, data_source);
    let table = TsvTable::open(&path)?;
    let entity_col = table.column("entity")?;
    let claims_col = table.column("claims")?;

    let mut claims = EntityClaims::new();
    for row in &table.rows {
        let entity = cell(row, entity_col);
        let entity_claims = cell(row, claims_col)
            .split(GROUP_SEP)
            .map(str::to_string)
            .collect();
        claims.insert(entity.to_string(), entity_claims);
    }

    tracing::debug!(
        entities = claims.len(),
        path = %path.display(),
        "Loaded entity claims"
    );
    Ok(claims)
}

/// Load news content, comments, entities, image paths and labels.
pub fn load_raw_records(
    data_dir: &Path,
    data_source: &str,
    suffix: &str,
) -> Result<RawCorpus, DataError> {
    let path = records_path(data_dir, data_source, suffix);
    let table = TsvTable::open(&path)?;
    let id_col = table.column("id")?;
    let text_col = table.column("text")?;
    let comments_col = table.column("comments")?;
    let entities_col = table.column("entities")?;
    let label_col = table.column("label")?;

    let mut records = Vec::with_capacity(table.rows.len());
    for (row_idx, row) in table.rows.iter().enumerate() {
        let bad_row = |reason: String| DataError::BadRow {
            path: path.clone(),
            row: row_idx,
            reason,
        };

        let id = cell(row, id_col).trim().to_string();
        if id.is_empty() {
            return Err(bad_row("empty id".to_string()));
        }
        let label_text = cell(row, label_col);
        let label = parse_int(label_text)
            .and_then(NewsLabel::from_i64)
            .ok_or_else(|| bad_row(format!("invalid label '{label_text}'")))?;

        let comments = parse_comments(cell(row, comments_col)).map_err(bad_row)?;
        let image = image_path(data_dir, data_source, &id, label);

        records.push(RawNewsRecord {
            content: strip_non_ascii(cell(row, text_col)),
            comments,
            entities: parse_entities(cell(row, entities_col)),
            image_path: image.exists().then_some(image),
            label,
            id,
        });
    }

    let corpus = RawCorpus { records };
    tracing::info!(
        records = corpus.len(),
        with_image = corpus.summary().with_image,
        path = %path.display(),
        "Loaded raw news records"
    );
    Ok(corpus)
}

/// Drop every non-ASCII character.
pub fn strip_non_ascii(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}

/// Decode the `text<>score::text<>score` comment encoding.
///
/// Comment text may itself contain `::`. A piece without a score is carried
/// over and prepended to the next piece that has one; a dangling piece at
/// the end is dropped.
pub fn parse_comments(raw: &str) -> Result<Vec<Comment>, String> {
    let cleaned = strip_non_ascii(raw);
    let mut comments = Vec::new();
    let mut buffer = String::new();

    for piece in cleaned.split(COMMENT_SEP) {
        let parts: Vec<&str> = piece.split(SCORE_SEP).collect();
        if parts.len() == 1 {
            buffer.push_str(piece);
            continue;
        }
        let score = parse_int(parts[1])
            .ok_or_else(|| format!("comment score '{}' is not an integer", parts[1]))?;
        let mut text = std::mem::take(&mut buffer);
        text.push_str(parts[0]);
        comments.push(Comment { text, score });
    }

    Ok(comments)
}

/// Flatten `a b||c` into `[a, b, c]`, dropping empty tokens.
pub fn parse_entities(raw: &str) -> Vec<String> {
    raw.split(GROUP_SEP)
        .flat_map(|group| group.split(' '))
        .filter(|e| !e.is_empty())
        .map(str::to_string)
        .collect()
}

/// Integers as pandas writes them: `3`, ` 3`, or `3.0`.
fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim();
    if let Ok(v) = text.parse::<i64>() {
        return Some(v);
    }
    let v = text.parse::<f64>().ok()?;
    (v.fract() == 0.0 && v.is_finite()).then_some(v as i64)
}

fn cell(row: &csv::StringRecord, col: usize) -> &str {
    row.get(col).unwrap_or("")
}

/// A fully read TSV file with a header row.
struct TsvTable {
    path: PathBuf,
    headers: csv::StringRecord,
    rows: Vec<csv::StringRecord>,
}

impl TsvTable {
    fn open(path: &Path) -> Result<Self, DataError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_path(path)?;
        let headers = reader.headers()?.clone();
        let rows = reader.records().collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            path: path.to_path_buf(),
            headers,
            rows,
        })
    }

    fn column(&self, name: &str) -> Result<usize, DataError> {
        self.headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| DataError::MissingColumn {
                path: self.path.clone(),
                column: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_comments_basic() {
        let comments = parse_comments("great read<>3::fake!!<>0").unwrap();
        assert_eq!(
            comments,
            vec![
                Comment { text: "great read".into(), score: 3 },
                Comment { text: "fake!!".into(), score: 0 },
            ]
        );
    }

    #[test]
    fn test_parse_comments_rejoins_split_text() {
        // "ratio 1::2" contains the comment separator inside the text.
        let comments = parse_comments("ratio 1::2<>5::ok<>1").unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "ratio 12");
        assert_eq!(comments[0].score, 5);
        assert_eq!(comments[1].text, "ok");
    }

    #[test]
    fn test_parse_comments_drops_dangling_text_and_non_ascii() {
        let comments = parse_comments("caf\u{e9}<>2::trailing").unwrap();
        assert_eq!(comments, vec![Comment { text: "caf".into(), score: 2 }]);
        assert!(parse_comments("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_comments_bad_score() {
        let err = parse_comments("hello<>lots").unwrap_err();
        assert!(err.contains("lots"));
    }

    #[test]
    fn test_parse_entities() {
        assert_eq!(
            parse_entities("Barack_Obama White_House||  Senate||"),
            vec!["Barack_Obama", "White_House", "Senate"]
        );
        assert!(parse_entities("").is_empty());
    }

    #[test]
    fn test_parse_int_pandas_forms() {
        assert_eq!(parse_int("1"), Some(1));
        assert_eq!(parse_int(" 0 "), Some(0));
        assert_eq!(parse_int("1.0"), Some(1));
        assert_eq!(parse_int("1.5"), None);
        assert_eq!(parse_int(""), None);
    }

    #[test]
    fn test_image_path_layout() {
        let p = image_path(Path::new("/data"), "politifact_v2", "42", NewsLabel::Real);
        assert_eq!(
            p,
            PathBuf::from("/data/politifact_v2/news_images/real/politifact_42.jpg")
        );
    }

    #[test]
    fn test_load_entity_claims() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            claims_path(tmp.path(), "gossipcop"),
            "entity\tclaims\nTaylor_Swift\tis a singer||won awards\nNobody\t\n",
        )
        .unwrap();

        let claims = load_entity_claims(tmp.path(), "gossipcop").unwrap();
        assert_eq!(claims["Taylor_Swift"], vec!["is a singer", "won awards"]);
        assert_eq!(claims["Nobody"], vec![String::new()]);
    }

    #[test]
    fn test_missing_column() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(claims_path(tmp.path(), "x"), "name\tclaims\na\tb\n").unwrap();
        let err = load_entity_claims(tmp.path(), "x").unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { ref column, .. } if column == "entity"));
    }
}
