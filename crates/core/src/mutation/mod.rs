mod types;

pub use types::{Actor, Mutation, MutationAction, MutationRequest, Record};
