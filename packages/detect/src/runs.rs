//! Run-length grouping of a boolean series.
//!
//! [`group_runs`] gives every row the index of the maximal run it belongs
//! to, and [`assign_run_ids`] keeps that index only for `true` runs that are
//! long enough. Both are a single forward scan with local accumulators.

/// Labels each row with the run it belongs to.
///
/// A new run starts at the first row, whenever the flag changes, and
/// wherever `continues[i]` is `false`. Rows beyond the end of `continues`
/// are treated as continuing, so an empty slice means pure row-order
/// grouping. Run indices start at 1 and increase by one per run.
#[must_use]
pub fn group_runs(flags: &[bool], continues: &[bool]) -> Vec<u32> {
    let mut groups = Vec::with_capacity(flags.len());
    let mut group = 0u32;
    let mut previous: Option<bool> = None;

    for (i, &flag) in flags.iter().enumerate() {
        let continues_run = continues.get(i).copied().unwrap_or(true);
        if previous != Some(flag) || !continues_run {
            group += 1;
        }
        previous = Some(flag);
        groups.push(group);
    }

    groups
}

/// Returns the run index for rows in a `true` run of at least `min_run`
/// rows, and `None` for every other row.
///
/// `continues` has the same meaning as in [`group_runs`].
#[must_use]
pub fn assign_run_ids(flags: &[bool], continues: &[bool], min_run: usize) -> Vec<Option<u32>> {
    let groups = group_runs(flags, continues);

    let mut lengths = vec![0usize; groups.last().map_or(0, |last| *last as usize)];
    for &group in &groups {
        lengths[group as usize - 1] += 1;
    }

    flags
        .iter()
        .zip(&groups)
        .map(|(&flag, &group)| (flag && lengths[group as usize - 1] >= min_run).then_some(group))
        .collect()
}
