//! State machine primitives: rounds, events and transition graphs

pub mod event;
pub mod round_id;
pub mod transition;

pub use event::Event;
pub use round_id::RoundId;
pub use transition::{
    documents_manager_table, researcher_table, scraper_table, FsmError, TransitionTable,
};
