//! Pipeline item lifecycle: typestate definitions and transitions.

pub mod state;
pub mod transitions;

pub use state::{
    Delivered, Done, Drafted, GenerationFailure, Item, ItemState, ProduceResult, Producing,
    RecordFailed,
};
