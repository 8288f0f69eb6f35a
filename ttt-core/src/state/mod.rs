mod initiator;
mod session;

pub use initiator::InitiatorPhase;
pub use session::{ObserverState, SessionState};
