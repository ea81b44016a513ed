use crate::model::ParsedPrediction;
use std::path::Path;

/// Parse the script's output artifact into (identifier, predicted run)
/// pairs. The header must name an `id` and a `predicted_run` column
/// (case-insensitive, any position). Malformed rows are skipped, never
/// raised: an unreadable or invalid file yields an empty list, which
/// the caller treats as a failed submission.
pub fn parse_output_csv(path: &Path) -> Vec<ParsedPrediction> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read output artifact");
            return Vec::new();
        }
    };

    let mut lines = content.lines();
    let header = match lines.next() {
        Some(h) => h,
        None => return Vec::new(),
    };

    let cols: Vec<String> = header
        .trim_end_matches('\r')
        .split(',')
        .map(|c| c.trim().to_ascii_lowercase())
        .collect();
    let id_idx = match cols.iter().position(|c| c == "id") {
        Some(i) => i,
        None => return Vec::new(),
    };
    let pred_idx = match cols.iter().position(|c| c == "predicted_run") {
        Some(i) => i,
        None => return Vec::new(),
    };

    let mut predictions = Vec::new();
    for line in lines {
        let fields: Vec<&str> = line.trim_end_matches('\r').split(',').collect();
        if fields.len() <= id_idx.max(pred_idx) {
            continue;
        }
        let id = fields[id_idx].trim();
        if id.is_empty() {
            continue;
        }
        let predicted_run = match fields[pred_idx].trim().parse::<i64>() {
            Ok(n) => n,
            Err(_) => continue,
        };
        predictions.push(ParsedPrediction {
            id: id.to_string(),
            predicted_run,
        });
    }
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(content: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "scorebox-parser-{}.csv",
            uuid::Uuid::new_v4().simple()
        ));
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_well_formed_rows() {
        let path = write_temp("id,predicted_run\n1,165\n2,158\n");
        let preds = parse_output_csv(&path);
        assert_eq!(preds.len(), 2);
        assert_eq!(preds[0].id, "1");
        assert_eq!(preds[0].predicted_run, 165);
        assert_eq!(preds[1].predicted_run, 158);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn header_columns_matched_case_insensitively_any_position() {
        let path = write_temp("Predicted_Run,extra,ID\n200,x,inning1\n");
        let preds = parse_output_csv(&path);
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].id, "inning1");
        assert_eq!(preds[0].predicted_run, 200);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_id_column_yields_empty() {
        let path = write_temp("name,predicted_run\n1,165\n");
        assert!(parse_output_csv(&path).is_empty());
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn malformed_rows_skipped() {
        let path = write_temp("id,predicted_run\n1\n,170\n2,abc\n3,142\n");
        let preds = parse_output_csv(&path);
        assert_eq!(preds.len(), 1);
        assert_eq!(preds[0].id, "3");
        assert_eq!(preds[0].predicted_run, 142);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn unreadable_file_yields_empty() {
        let path = std::env::temp_dir().join("scorebox-parser-missing.csv");
        assert!(parse_output_csv(&path).is_empty());
    }

    #[test]
    fn crlf_tolerated() {
        let path = write_temp("id,predicted_run\r\n1,165\r\n2,158\r\n");
        assert_eq!(parse_output_csv(&path).len(), 2);
        std::fs::remove_file(path).ok();
    }
}
