use std::io::{self, Write};

use serde::Serialize;

use crate::RollupStats;

/// Header line of the downloadable result file.
pub const RESULT_CSV_HEADER: &str = "Department Name,Total Number of Sales";

/// Final total for one department.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct GroupSummary {
    #[serde(rename = "department")]
    pub group: String,
    #[serde(rename = "total_sales")]
    pub total: i64,
}

/// Output of one aggregation pass.
///
/// `summaries` has exactly one entry per department, in no particular order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Rollup {
    pub summaries: Vec<GroupSummary>,
    pub stats: RollupStats,
}

impl Rollup {
    /// Sum of every department total.
    pub fn total(&self) -> i128 {
        self.summaries.iter().map(|s| s.total as i128).sum()
    }

    pub fn into_summaries(self) -> Vec<GroupSummary> {
        self.summaries
    }
}

/// Render summaries as `Department Name,Total Number of Sales` followed by one
/// `<department>,<total>` line each.
///
/// Department names are written verbatim, without CSV quoting.
pub fn write_summary_csv<W: Write>(mut sink: W, summaries: &[GroupSummary]) -> io::Result<()> {
    writeln!(sink, "{RESULT_CSV_HEADER}")?;
    for summary in summaries {
        writeln!(sink, "{},{}", summary.group, summary.total)?;
    }
    sink.flush()
}
