//! Domain models that mirror the `components` table and get passed between the
//! store, the in-memory sheet and the TUI. They stay plain data holders so the
//! other layers can focus on persistence and presentation.

#[derive(Debug, Clone, PartialEq, Eq)]
/// One stored electronic component. Every field except `id` and `stock` is
/// free text; the store never enforces the suggestion lists.
pub struct Component {
    /// Primary key assigned by SQLite. Bulk saves reassign it, so it is only
    /// stable between two saves.
    pub id: i64,
    /// Customer or catalog identifier.
    pub cus_id: String,
    /// Category, usually one of the configured type suggestions.
    pub kind: String,
    /// Part name or number.
    pub part: String,
    pub description: String,
    /// Package designator, usually one of the configured footprints.
    pub footprint: String,
    pub stock: i64,
    /// Datasheet location relative to the application base directory. Empty
    /// when nothing is linked.
    pub datasheet_path: String,
}

impl Component {
    /// Whether a datasheet has been linked to this component.
    pub fn has_datasheet(&self) -> bool {
        !self.datasheet_path.trim().is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
/// A component that has not been given an id yet. Bulk saves insert these.
pub struct NewComponent {
    pub cus_id: String,
    pub kind: String,
    pub part: String,
    pub description: String,
    pub footprint: String,
    pub stock: i64,
    pub datasheet_path: String,
}

/// Interpret raw stock input. Anything that is not made only of ASCII digits
/// (empty input, signs, letters, whitespace) counts as zero, as does a number
/// too large for the column.
pub fn parse_stock(raw: &str) -> i64 {
    if raw.is_empty() || !raw.chars().all(|ch| ch.is_ascii_digit()) {
        return 0;
    }
    raw.parse::<i64>().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_parse_as_stock() {
        assert_eq!(parse_stock("42"), 42);
        assert_eq!(parse_stock("007"), 7);
    }

    #[test]
    fn non_digit_stock_coerces_to_zero() {
        assert_eq!(parse_stock("abc"), 0);
        assert_eq!(parse_stock(""), 0);
        assert_eq!(parse_stock("-5"), 0);
        assert_eq!(parse_stock(" 5"), 0);
        assert_eq!(parse_stock("12a"), 0);
        assert_eq!(parse_stock("99999999999999999999999"), 0);
    }
}
