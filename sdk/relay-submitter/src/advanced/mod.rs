pub mod builders;
pub mod chunking;
pub mod instructions;
