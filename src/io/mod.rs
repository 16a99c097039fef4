//! File formats read and written by the heat-rejection pipeline.

pub mod demand;
pub mod export;
pub mod group_file;
pub mod supply;

use csv::StringRecord;

/// Position of a column, ignoring surrounding whitespace in the header.
pub(crate) fn column_index(headers: &StringRecord, name: &str) -> Option<usize> {
    headers.iter().position(|h| h.trim() == name)
}

/// Required columns absent from `headers`, in the order they were requested.
pub(crate) fn missing_columns(headers: &StringRecord, required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| column_index(headers, name).is_none())
        .map(|name| name.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_reports_in_request_order() {
        let headers = StringRecord::from(vec!["Name", " type_cs "]);
        assert!(missing_columns(&headers, &["type_cs", "Name"]).is_empty());
        assert_eq!(
            missing_columns(&headers, &["scale", "Name", "code"]),
            vec!["scale".to_string(), "code".to_string()]
        );
        assert_eq!(column_index(&headers, "type_cs"), Some(1));
    }
}
