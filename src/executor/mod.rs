pub mod create_table;
pub mod delete;
pub mod hash_join;
pub mod insert;
pub mod partition;
pub mod predicate;
pub mod scan;
pub mod sequential_scan;
