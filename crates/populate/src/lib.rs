//! Content population: recovered value trees → live object graphs.
//!
//! Each key of a value tree is dispatched by the declared relation
//! cardinality of the target object's type:
//!
//! | cardinality | expected value | effect |
//! |---|---|---|
//! | single | mapping | create, populate and persist one related object, link it by id |
//! | multi (owned) | list of mappings | one child per item, owning key set to the parent id |
//! | multi (associated) | list of mappings | one child per item, added to the association |
//! | block area | list of tagged mappings | blocks in the area container, sorted from 1 |
//! | none | scalar | written as is (choice labels become option values) |
//!
//! Shape mismatches are skipped with a diagnostic. Store failures abort the
//! whole call, which runs in a single transaction.

mod populator;
mod tags;

pub use populator::{PopulateStats, Populator};
