use crate::error::IngestError;
use crate::models::ChunkRecord;
use std::fs;
use std::path::Path;

// The chunk table and the embedding matrix are positionally coupled: row i
// of the matrix is the embedding of record i of the table. They are only
// ever written together.
pub const CHUNK_TABLE_FILE: &str = "legal_text.csv";
pub const EMBEDDING_MATRIX_FILE: &str = "legal_embeddings.f32";

const CHUNK_TABLE_HEADER: &str = "file_name,chunk_id,text";

pub fn write_chunk_table(path: &Path, chunks: &[ChunkRecord]) -> Result<(), IngestError> {
    let mut out = String::from(CHUNK_TABLE_HEADER);
    out.push('\n');
    for chunk in chunks {
        out.push_str(&csv_field(&chunk.file_name));
        out.push(',');
        out.push_str(&chunk.chunk_id.to_string());
        out.push(',');
        out.push_str(&csv_field(&chunk.text));
        out.push('\n');
    }
    fs::write(path, out)?;
    Ok(())
}

pub fn read_chunk_table(path: &Path) -> Result<Vec<ChunkRecord>, IngestError> {
    let content = fs::read_to_string(path)?;
    let rows = parse_csv(&content)?;

    let mut records = Vec::new();
    for (index, row) in rows.into_iter().enumerate() {
        if index == 0 {
            if row.join(",") != CHUNK_TABLE_HEADER {
                return Err(IngestError::MalformedChunkTable(format!(
                    "unexpected header: {}",
                    row.join(",")
                )));
            }
            continue;
        }

        if row.len() != 3 {
            return Err(IngestError::MalformedChunkTable(format!(
                "row {index} has {} fields, expected 3",
                row.len()
            )));
        }

        let chunk_id = row[1].parse::<u32>().map_err(|_| {
            IngestError::MalformedChunkTable(format!("row {index} has bad chunk_id: {}", row[1]))
        })?;

        records.push(ChunkRecord {
            file_name: row[0].clone(),
            chunk_id,
            text: row[2].clone(),
        });
    }

    Ok(records)
}

pub fn write_embedding_matrix(
    path: &Path,
    rows: &[Vec<f32>],
    dimensions: usize,
) -> Result<(), IngestError> {
    let mut bytes = Vec::with_capacity(8 + rows.len() * dimensions * 4);
    bytes.extend_from_slice(&(rows.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&(dimensions as u32).to_le_bytes());

    for (index, row) in rows.iter().enumerate() {
        if row.len() != dimensions {
            return Err(IngestError::ArtifactMismatch(format!(
                "embedding row {index} has {} values, expected {dimensions}",
                row.len()
            )));
        }
        for value in row {
            bytes.extend_from_slice(&value.to_le_bytes());
        }
    }

    fs::write(path, bytes)?;
    Ok(())
}

pub fn read_embedding_matrix(path: &Path) -> Result<Vec<Vec<f32>>, IngestError> {
    let bytes = fs::read(path)?;
    if bytes.len() < 8 {
        return Err(IngestError::ArtifactMismatch(format!(
            "embedding matrix {} is truncated",
            path.display()
        )));
    }

    let rows = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize;
    let dimensions = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;

    // Header counts come from the file, so the size check must not trust
    // them enough to overflow.
    let expected = rows
        .checked_mul(dimensions)
        .and_then(|cells| cells.checked_mul(4))
        .and_then(|payload| payload.checked_add(8))
        .ok_or_else(|| {
            IngestError::ArtifactMismatch(format!(
                "embedding matrix {} header claims {rows} rows of {dimensions} values",
                path.display()
            ))
        })?;
    if bytes.len() != expected {
        return Err(IngestError::ArtifactMismatch(format!(
            "embedding matrix {} holds {} bytes, expected {expected}",
            path.display(),
            bytes.len()
        )));
    }

    let mut matrix = Vec::with_capacity(rows);
    let mut offset = 8;
    for _ in 0..rows {
        let mut row = Vec::with_capacity(dimensions);
        for _ in 0..dimensions {
            row.push(f32::from_le_bytes([
                bytes[offset],
                bytes[offset + 1],
                bytes[offset + 2],
                bytes[offset + 3],
            ]));
            offset += 4;
        }
        matrix.push(row);
    }

    Ok(matrix)
}

pub fn write_artifacts(
    dir: &Path,
    chunks: &[ChunkRecord],
    embeddings: &[Vec<f32>],
    dimensions: usize,
) -> Result<(), IngestError> {
    if chunks.len() != embeddings.len() {
        return Err(IngestError::ArtifactMismatch(format!(
            "{} chunks but {} embeddings",
            chunks.len(),
            embeddings.len()
        )));
    }
    write_chunk_table(&dir.join(CHUNK_TABLE_FILE), chunks)?;
    write_embedding_matrix(&dir.join(EMBEDDING_MATRIX_FILE), embeddings, dimensions)?;
    Ok(())
}

pub fn load_artifacts(dir: &Path) -> Result<(Vec<ChunkRecord>, Vec<Vec<f32>>), IngestError> {
    let chunks = read_chunk_table(&dir.join(CHUNK_TABLE_FILE))?;
    let embeddings = read_embedding_matrix(&dir.join(EMBEDDING_MATRIX_FILE))?;

    if chunks.len() != embeddings.len() {
        return Err(IngestError::ArtifactMismatch(format!(
            "chunk table has {} records but embedding matrix has {} rows",
            chunks.len(),
            embeddings.len()
        )));
    }

    Ok((chunks, embeddings))
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn parse_csv(content: &str) -> Result<Vec<Vec<String>>, IngestError> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;

    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            if c == '"' {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(c);
            }
            continue;
        }

        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            '\r' => {}
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(IngestError::MalformedChunkTable(
            "unterminated quoted field".to_string(),
        ));
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample_chunks() -> Vec<ChunkRecord> {
        vec![
            ChunkRecord {
                file_name: "ipc.pdf".to_string(),
                chunk_id: 0,
                text: "Section 378 defines theft, with \"dishonest\" intent".to_string(),
            },
            ChunkRecord {
                file_name: "crpc.pdf".to_string(),
                chunk_id: 1,
                text: "plain text".to_string(),
            },
        ]
    }

    #[test]
    fn chunk_table_round_trips_with_quoting() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join(CHUNK_TABLE_FILE);
        let chunks = sample_chunks();

        write_chunk_table(&path, &chunks)?;
        let read_back = read_chunk_table(&path)?;

        assert_eq!(read_back, chunks);
        Ok(())
    }

    #[test]
    fn embedding_matrix_round_trips() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join(EMBEDDING_MATRIX_FILE);
        let rows = vec![vec![0.5f32, -1.25, 3.0], vec![0.0, 2.5, -0.125]];

        write_embedding_matrix(&path, &rows, 3)?;
        let read_back = read_embedding_matrix(&path)?;

        assert_eq!(read_back, rows);
        Ok(())
    }

    #[test]
    fn uneven_embedding_rows_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join(EMBEDDING_MATRIX_FILE);
        let rows = vec![vec![1.0f32, 2.0], vec![1.0]];

        assert!(write_embedding_matrix(&path, &rows, 2).is_err());
        Ok(())
    }

    #[test]
    fn corrupt_header_counts_are_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join(EMBEDDING_MATRIX_FILE);

        let mut bytes = Vec::new();
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        fs::write(&path, &bytes)?;

        assert!(matches!(
            read_embedding_matrix(&path),
            Err(IngestError::ArtifactMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn mismatched_artifact_pair_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let chunks = sample_chunks();

        write_chunk_table(&dir.path().join(CHUNK_TABLE_FILE), &chunks)?;
        write_embedding_matrix(
            &dir.path().join(EMBEDDING_MATRIX_FILE),
            &[vec![1.0f32, 0.0]],
            2,
        )?;

        assert!(matches!(
            load_artifacts(dir.path()),
            Err(IngestError::ArtifactMismatch(_))
        ));
        Ok(())
    }

    #[test]
    fn artifact_pair_round_trips_together() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let chunks = sample_chunks();
        let embeddings = vec![vec![1.0f32, 0.0], vec![0.0, 1.0]];

        write_artifacts(dir.path(), &chunks, &embeddings, 2)?;
        let (read_chunks, read_embeddings) = load_artifacts(dir.path())?;

        assert_eq!(read_chunks, chunks);
        assert_eq!(read_embeddings, embeddings);
        Ok(())
    }
}
