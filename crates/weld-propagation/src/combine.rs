//! Combination of resolved per-criterion labels into one verdict.
use ndarray::Array1;

use crate::binarize::{FAIL, PASS};
use crate::data_handling::LabelTable;
use crate::error::{Result, WeldError};

/// Overall pass/fail per sample.
///
/// With K criteria in table order, a sample passes when it passes all of the
/// first K-1 criteria, or when it passes the last criterion on its own. The
/// required count is derived from the table. For K = 1 there are no leading
/// criteria to satisfy and the verdict is the single criterion itself.
pub fn combine_labels(table: &LabelTable) -> Result<Array1<i32>> {
    let n_criteria = table.len();
    let n_rows = table.nrows().ok_or_else(|| {
        WeldError::precondition("combine", "no resolved criteria to combine")
    })?;
    let required = (n_criteria - 1) as i32;

    let columns: Vec<&Array1<i32>> = table.iter().map(|(_, labels)| labels).collect();
    let (last, leading) = columns
        .split_last()
        .ok_or_else(|| WeldError::precondition("combine", "no resolved criteria to combine"))?;

    let combined = (0..n_rows)
        .map(|row| {
            let leading_passes: i32 = leading.iter().map(|labels| labels[row]).sum();
            if (n_criteria > 1 && leading_passes == required) || last[row] == PASS {
                PASS
            } else {
                FAIL
            }
        })
        .collect();

    Ok(combined)
}
