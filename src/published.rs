//! Published-state defaulting for filtered queries.
use crate::filter::{Filter, StringFilter};

pub const PUBLISHED: &str = "published";

/// Constrain `filter` to published rows unless it already names a state.
/// An explicit state filter, even `state: {}`, is left untouched.
pub fn with_published_default<F: Filter>(mut filter: F) -> F {
    let state = filter.state_mut();
    if state.is_none() {
        *state = Some(StringFilter::equals(PUBLISHED));
    }
    filter
}
