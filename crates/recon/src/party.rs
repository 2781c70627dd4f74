//! Composite party fields.
//!
//! A transaction has a primary party and up to three joint parties. Their
//! names are joined with `-`, their ids with `|`. Blank slots are kept as
//! empty segments so slot N means the same party across every source.

pub const MAX_PARTIES: usize = 4;
pub const NAME_SEPARATOR: &str = "-";
pub const ID_SEPARATOR: &str = "|";

/// Join party slots in order, keeping blank slots.
pub fn join_slots<'a, I>(slots: I, separator: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    slots.into_iter().collect::<Vec<_>>().join(separator)
}

/// All slots of a composite id, blanks included.
pub fn split_slots(composite: &str) -> Vec<&str> {
    composite.split(ID_SEPARATOR).collect()
}

/// Party ids that can be looked up: trimmed, blank slots skipped.
pub fn party_ids(composite: &str) -> Vec<&str> {
    composite
        .split(ID_SEPARATOR)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .collect()
}
