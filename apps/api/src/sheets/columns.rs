//! Header detection and row mapping for the recruiter sheet.
//!
//! Column detection is a heuristic: headers are matched by case-insensitive
//! substring, and when nothing matches the sheet is assumed to follow the
//! `Name | Email | Company | Job Description` layout.

use std::collections::BTreeMap;

use tracing::debug;

/// Address → job description.
pub type DescriptionMap = BTreeMap<String, String>;

/// Column B.
pub const DEFAULT_ADDRESS_COLUMN: usize = 1;
/// Column D.
pub const DEFAULT_DESCRIPTION_COLUMN: usize = 3;

/// Zero-based indices of the columns holding addresses and descriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    pub address: usize,
    pub description: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            address: DEFAULT_ADDRESS_COLUMN,
            description: DEFAULT_DESCRIPTION_COLUMN,
        }
    }
}

impl ColumnLayout {
    /// Resolves columns from a header row. Later matching headers win, and a
    /// header that matches "email" is never considered for the description.
    pub fn detect(headers: &[String]) -> Self {
        let mut address = None;
        let mut description = None;

        for (index, header) in headers.iter().enumerate() {
            let text = header.to_lowercase();
            if text.contains("email") {
                address = Some(index);
            } else if text.contains("job") && (text.contains("description") || text.contains("desc"))
            {
                description = Some(index);
            }
        }

        Self {
            address: address.unwrap_or(DEFAULT_ADDRESS_COLUMN),
            description: description.unwrap_or(DEFAULT_DESCRIPTION_COLUMN),
        }
    }

    /// Rows shorter than this cannot hold both columns.
    pub fn min_row_len(&self) -> usize {
        self.address.max(self.description) + 1
    }
}

/// Maps data rows to address → description. Rows that are too short or whose
/// trimmed address lacks an `@` are skipped; the last row wins on duplicates.
pub fn map_rows(rows: &[Vec<String>], layout: ColumnLayout) -> DescriptionMap {
    let mut descriptions = DescriptionMap::new();

    for (row_index, row) in rows.iter().enumerate() {
        if row.len() < layout.min_row_len() {
            continue;
        }
        let address = row[layout.address].trim();
        if !address.contains('@') {
            continue;
        }
        // +2: one for the header row, one for 1-based sheet rows
        debug!("Row {}: mapping {address} to job description", row_index + 2);
        descriptions.insert(address.to_string(), row[layout.description].clone());
    }

    descriptions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    #[test]
    fn test_detect_standard_headers() {
        let layout = ColumnLayout::detect(&row(&["Name", "Email", "Company", "Job Description"]));
        assert_eq!(
            layout,
            ColumnLayout {
                address: 1,
                description: 3
            }
        );
    }

    #[test]
    fn test_detect_reordered_headers_case_insensitive() {
        let layout = ColumnLayout::detect(&row(&["JOB DESC", "Recruiter E-mail", "EMAIL ADDRESS"]));
        assert_eq!(layout.address, 2);
        assert_eq!(layout.description, 0);
    }

    #[test]
    fn test_detect_requires_job_and_description() {
        let layout = ColumnLayout::detect(&row(&["Email", "Description", "Job Title"]));
        assert_eq!(layout.address, 0);
        assert_eq!(layout.description, DEFAULT_DESCRIPTION_COLUMN);
    }

    #[test]
    fn test_detect_email_header_never_becomes_description() {
        let layout = ColumnLayout::detect(&row(&["Job description email"]));
        assert_eq!(layout.address, 0);
        assert_eq!(layout.description, DEFAULT_DESCRIPTION_COLUMN);
    }

    #[test]
    fn test_detect_empty_headers_falls_back() {
        assert_eq!(ColumnLayout::detect(&[]), ColumnLayout::default());
    }

    #[test]
    fn test_scenario_single_row() {
        let layout = ColumnLayout::detect(&row(&["Name", "Email", "Company", "Job Description"]));
        let rows = vec![row(&["Jane", "jane@co.com", "Acme", "Build widgets"])];
        let map = map_rows(&rows, layout);
        assert_eq!(map.len(), 1);
        assert_eq!(map["jane@co.com"], "Build widgets");
    }

    #[test]
    fn test_row_length_boundary() {
        let layout = ColumnLayout::default();
        let rows = vec![
            row(&["Short", "short@co.com", "Acme"]),
            row(&["Exact", "exact@co.com", "Acme", "Exact fit"]),
        ];
        let map = map_rows(&rows, layout);
        assert!(!map.contains_key("short@co.com"));
        assert_eq!(map["exact@co.com"], "Exact fit");
    }

    #[test]
    fn test_rows_without_at_sign_are_skipped() {
        let rows = vec![
            row(&["No", "not-an-address", "Acme", "desc"]),
            row(&["Blank", "", "Acme", "desc"]),
        ];
        assert!(map_rows(&rows, ColumnLayout::default()).is_empty());
    }

    #[test]
    fn test_address_is_trimmed_and_last_row_wins() {
        let rows = vec![
            row(&["A", "  dup@co.com ", "Acme", "first"]),
            row(&["B", "dup@co.com", "Acme", "second"]),
        ];
        let map = map_rows(&rows, ColumnLayout::default());
        assert_eq!(map.len(), 1);
        assert_eq!(map["dup@co.com"], "second");
    }
}
