pub mod funding;
pub mod inspect;
pub mod lookup_table;
pub mod misbehaviour;
pub mod relay;
pub mod submitter;
