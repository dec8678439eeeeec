//! Predicate composition for soft-deletable tables.
//!
//! Every read, update and pre-delete lookup against a soft-deletable table
//! must go through [`where_live`]; omitting it is a correctness bug, not a
//! style choice. Deleted rows must be indistinguishable from rows that never
//! existed.

/// Predicate excluding logically deleted rows.
#[must_use]
pub(crate) fn exclude_deleted() -> &'static str {
    "deleted_at IS NULL"
}

/// Combine the given conditions with the deletion filter.
///
/// With zero conditions this reduces to the exclusion predicate alone. The
/// conditions are caller-provided SQL fragments with positional binds; this
/// function only composes, it never inspects them.
#[must_use]
pub(crate) fn where_live(conditions: &[&str]) -> String {
    let mut predicate = String::from(exclude_deleted());
    for condition in conditions {
        predicate.push_str(" AND ");
        predicate.push_str(condition);
    }
    predicate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_conditions_reduces_to_exclusion() {
        assert_eq!(where_live(&[]), "deleted_at IS NULL");
    }

    #[test]
    fn single_condition_is_anded_with_exclusion() {
        assert_eq!(where_live(&["id = $1"]), "deleted_at IS NULL AND id = $1");
    }

    #[test]
    fn conditions_keep_their_order() {
        assert_eq!(
            where_live(&["id = $1", "text <> ''"]),
            "deleted_at IS NULL AND id = $1 AND text <> ''"
        );
    }
}
