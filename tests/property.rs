//! Property-based tests.

mod common;

#[path = "property/agenda_props.rs"]
mod agenda_props;
#[path = "property/matcher_props.rs"]
mod matcher_props;
#[path = "property/suffix_array_props.rs"]
mod suffix_array_props;
#[path = "property/topk_props.rs"]
mod topk_props;
