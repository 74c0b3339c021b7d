//! Service layer for business logic.

pub mod recorder;
pub mod resolver;
pub mod selection;

pub use recorder::{FavoriteLabels, LocationRecorder};
pub use resolver::GeocodeResolver;
pub use selection::{
    SelectionChange, SelectionHub, SelectionOrigin, SelectionSnapshot, SelectionState,
    SelectionTicket,
};
