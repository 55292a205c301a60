//! Shared utilities for serialization across blockcards crates.

use crate::{Error, Result};

/// Generic JSON serialization with consistent error handling
/// Works with any type that implements Serialize (including slices)
pub fn to_json_string<T: serde::Serialize + ?Sized>(data: &T, context: &str) -> Result<String> {
    serde_json::to_string_pretty(data).map_err(|e| {
        Error::parse_error(format!("Failed to serialize {} as JSON: {}", context, e))
    })
}

/// Quote a CSV cell when it contains separators, quotes or newlines
fn csv_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Generic CSV serialization builder
/// Use the CSVBuilder fluent API to construct and export CSV data
pub struct CSVBuilder {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CSVBuilder {
    /// Create a new CSV with headers
    pub fn new(headers: Vec<&str>) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Add a row of data
    pub fn add_row(mut self, values: Vec<&str>) -> Self {
        self.rows.push(values.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Add a row of data from owned strings
    pub fn add_row_owned(mut self, values: Vec<String>) -> Self {
        self.rows.push(values);
        self
    }

    /// Build the CSV string
    pub fn build(self) -> String {
        let header: Vec<String> = self.headers.iter().map(|h| csv_cell(h)).collect();
        let mut csv = header.join(",") + "\n";
        for row in self.rows {
            let cells: Vec<String> = row.iter().map(|c| csv_cell(c)).collect();
            csv.push_str(&cells.join(","));
            csv.push('\n');
        }
        csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_builder_quotes_cells() {
        let csv = CSVBuilder::new(vec!["uuid", "html"])
            .add_row(vec!["a", "<p>x, y</p>"])
            .add_row_owned(vec!["b".to_string(), "say \"hi\"".to_string()])
            .build();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "uuid,html");
        assert_eq!(lines[1], "a,\"<p>x, y</p>\"");
        assert_eq!(lines[2], "b,\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_to_json_string() {
        let json = to_json_string(&vec!["a", "b"], "list").unwrap();
        assert!(json.contains("\"a\""));
    }
}
