//! Property-like query helpers shared by the KiCad formats.
//!
//! KiCad writes small key/value nodes such as `(uuid "..")`. Older files are
//! inconsistent about quoting, so [`atom_prop`] accepts either form.

use crate::{Sexpr, find_child_list};

/// Find a property `(tag VALUE)` whose value may be quoted or bare.
pub fn atom_prop(list: &[Sexpr], tag: &str) -> Option<String> {
    find_child_list(list, tag)?.get(1)?.as_atom().map(str::to_string)
}
