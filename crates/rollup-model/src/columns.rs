use crate::AggregateError;

/// Header spellings accepted for the group (department) column, after trim + lowercase.
///
/// Any header that merely *contains* `department` also matches.
pub const GROUP_COLUMN_SYNONYMS: &[&str] = &["department", "department name", "dept"];

/// Header spellings accepted for the value (sales) column, after trim + lowercase.
pub const VALUE_COLUMN_SYNONYMS: &[&str] = &[
    "sales",
    "total_sales",
    "total sales",
    "number of sales",
    "amount",
    "revenue",
];

/// Zero-based positions of the two columns an aggregation pass reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColumnIndices {
    pub group: usize,
    pub value: usize,
}

impl ColumnIndices {
    /// Minimum number of cells a data row needs for both columns to be present.
    pub fn required_cells(&self) -> usize {
        self.group.max(self.value) + 1
    }
}

fn is_group_header(normalized: &str) -> bool {
    GROUP_COLUMN_SYNONYMS.contains(&normalized) || normalized.contains("department")
}

fn is_value_header(normalized: &str) -> bool {
    VALUE_COLUMN_SYNONYMS.contains(&normalized)
}

/// Locate the group and value columns in a header row.
///
/// Both roles are matched in one left-to-right scan and each keeps its first match. The same
/// column may satisfy both roles. A missing group column is reported before a missing value
/// column.
pub fn resolve_columns<I, S>(header: I) -> Result<ColumnIndices, AggregateError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut group = None;
    let mut value = None;

    for (idx, cell) in header.into_iter().enumerate() {
        let normalized = cell.as_ref().trim().to_lowercase();
        if group.is_none() && is_group_header(&normalized) {
            group = Some(idx);
        }
        if value.is_none() && is_value_header(&normalized) {
            value = Some(idx);
        }
    }

    let group = group.ok_or(AggregateError::MissingGroupColumn)?;
    let value = value.ok_or(AggregateError::MissingValueColumn)?;

    log::info!("found department column at index {group}, sales column at index {value}");
    Ok(ColumnIndices { group, value })
}
