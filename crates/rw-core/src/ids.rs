//! ID prefixes for entities minted by the store.
//!
//! IDs look like `wl-a3f8b2c1`: a short prefix, a dash, and eight lowercase hex
//! characters generated by libSQL (`randomblob(4)`). Update, dossier and policy
//! ids are supplied by collaborators and carry no prefix guarantee.

pub const PREFIX_WATCH_LIST: &str = "wl";
pub const PREFIX_MATCH: &str = "mat";
pub const PREFIX_TEMPLATE: &str = "wft";
pub const PREFIX_CHANGE_ITEM: &str = "rci";
pub const PREFIX_LINK: &str = "lnk";

/// All prefixes the store mints.
pub const ALL_PREFIXES: &[&str] = &[
    PREFIX_WATCH_LIST,
    PREFIX_MATCH,
    PREFIX_TEMPLATE,
    PREFIX_CHANGE_ITEM,
    PREFIX_LINK,
];

/// Whether `id` has the shape `{prefix}-{8 hex}`.
#[must_use]
pub fn has_prefix(id: &str, prefix: &str) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| hex.len() == 8 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}
