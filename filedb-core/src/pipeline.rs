//! Query execution over a materialized record set.
//!
//! Every query is a full linear scan: filter, then sort on the primary sort key,
//! then skip and limit. There is no index and no planning step.

use std::cmp::Ordering;

use crate::{
    error::StoreResult,
    evaluator::{Predicate, compare_field},
    query::{QueryPlan, SortDirection},
    record::Record,
};

/// Runs `plan` against `records`, which are in stored order.
///
/// # Errors
///
/// Fails if the plan's filter does not compile (unsupported operator or invalid
/// regex). Compilation happens before any record is looked at, so the failure
/// does not depend on the collection's contents.
pub fn apply(plan: &QueryPlan, records: Vec<Record>) -> StoreResult<Vec<Record>> {
    let predicate = Predicate::compile(&plan.filter)?;
    let mut matched = predicate.filter_records(records);

    if let Some(sort) = plan
        .sort
        .as_ref()
        .and_then(|spec| spec.primary())
    {
        let field = sort.field.as_str();
        matched = merge_sort_by(matched, &|left, right| {
            let ordering = compare_field(left, right, field);
            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    Ok(matched
        .into_iter()
        .skip(plan.skip)
        .take(plan.limit.unwrap_or(usize::MAX))
        .collect())
}

/// Stable top-down merge sort.
///
/// Relational comparison across mixed types is not a total order, which the
/// standard library sorts are allowed to reject. A plain merge sort accepts any
/// comparator and keeps equal elements in input order.
fn merge_sort_by<T>(mut items: Vec<T>, compare: &impl Fn(&T, &T) -> Ordering) -> Vec<T> {
    if items.len() <= 1 {
        return items;
    }

    let right = items.split_off(items.len() / 2);
    let left = merge_sort_by(items, compare);
    let right = merge_sort_by(right, compare);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();

    loop {
        let take_right = match (left.peek(), right.peek()) {
            (Some(l), Some(r)) => compare(r, l) == Ordering::Less,
            _ => break,
        };

        if take_right {
            merged.extend(right.next());
        } else {
            merged.extend(left.next());
        }
    }
    merged.extend(left);
    merged.extend(right);

    merged
}
