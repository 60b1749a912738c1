mod selector;

pub use selector::{ParticipantSelector, Selection};
