/// One parsed record from the input table: the original column values in
/// input order, plus the 1-based line number it was read from.
#[derive(Debug, Clone)]
pub struct Row {
    fields: Vec<(String, String)>,
    line_number: usize,
}

impl Row {
    pub fn new(headers: &[String], values: &[String], line_number: usize) -> Self {
        let fields = headers
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect();
        Self { fields, line_number }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Column names in their original input order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// Cell values in their original input order.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new(
            &["pc".to_string(), "hn".to_string()],
            &["1234AB".to_string(), "12".to_string()],
            1,
        )
    }

    #[test]
    fn get_returns_cell_by_column_name() {
        let row = row();
        assert_eq!(row.get("pc"), Some("1234AB"));
        assert_eq!(row.get("hn"), Some("12"));
        assert_eq!(row.get("missing"), None);
    }

    #[test]
    fn columns_preserve_input_order() {
        let row = row();
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["pc", "hn"]);
        assert_eq!(row.values().collect::<Vec<_>>(), vec!["1234AB", "12"]);
    }
}
