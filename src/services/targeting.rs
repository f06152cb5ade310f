use crate::db::models::{Assignment, User};

const WILDCARDS: [&str; 2] = ["all", "general"];

fn dimension_matches(allowed: &[String], value: &str) -> bool {
    allowed.iter().any(|entry| WILDCARDS.contains(&entry.as_str()) || entry == value)
}

/// An assignment targets a student when every dimension either lists the
/// student's value or carries a wildcard ("all" or "general").
pub(crate) fn matches(assignment: &Assignment, user: &User) -> bool {
    dimension_matches(&assignment.colleges, &user.college)
        && dimension_matches(&assignment.batches, &user.batch)
        && dimension_matches(&assignment.departments, &user.department)
}
