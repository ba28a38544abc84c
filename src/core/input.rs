use crate::domain::model::InputRecord;
use crate::domain::ports::Storage;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::has_allowed_extension;

pub const SERVICE_TAG_COLUMN: &str = "serviceTag";

/// Reads the service tags listed in a CSV file.
///
/// The extension is checked before the filesystem is touched, and existence is
/// checked before the contents are opened. A header-only file yields an empty
/// vector; deciding whether that is fatal is left to the caller.
pub async fn load_service_tags<S: Storage>(storage: &S, path: &str) -> Result<Vec<InputRecord>> {
    tracing::info!("File path: {}", path);

    if !has_allowed_extension(path, &["csv"]) {
        return Err(EtlError::InvalidInput {
            path: path.to_string(),
            reason: "the provided file is not a CSV file".to_string(),
        });
    }

    if !storage.exists(path) {
        return Err(EtlError::InvalidInput {
            path: path.to_string(),
            reason: "the file does not exist".to_string(),
        });
    }

    let data = storage.read_file(path).await?;
    let records = parse_service_tags(&data).map_err(|message| EtlError::Parse {
        path: path.to_string(),
        message,
    })?;

    tracing::info!("Loaded {} service tags", records.len());
    tracing::debug!(
        "Service tags from file: {:?}",
        records.iter().map(|r| r.service_tag.as_str()).collect::<Vec<_>>()
    );

    Ok(records)
}

/// Parses CSV bytes with a header row into records, in file order.
///
/// Errors are returned as plain messages; [`load_service_tags`] attaches the
/// file path.
pub fn parse_service_tags(data: &[u8]) -> std::result::Result<Vec<InputRecord>, String> {
    // Spreadsheet exports often start with a UTF-8 BOM
    let data = data.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(data);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(data);

    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    let column = headers
        .iter()
        .position(|h| h == SERVICE_TAG_COLUMN)
        .ok_or_else(|| format!("header row has no '{}' column", SERVICE_TAG_COLUMN))?;

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row.map_err(|e| e.to_string())?;
        let tag = row.get(column).unwrap_or_default();
        if tag.is_empty() {
            let line = row.position().map(|p| p.line()).unwrap_or_default();
            return Err(format!("blank {} on line {}", SERVICE_TAG_COLUMN, line));
        }
        records.push(InputRecord::new(tag));
    }

    Ok(records)
}
