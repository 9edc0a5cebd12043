pub mod controller;
pub mod request;
pub mod settings;
pub mod state;
pub mod view;

pub use controller::{ScanSession, SessionHandle, SessionInput};
pub use request::{SessionRequest, StartDecision, ValidatedRequest};
pub use settings::SessionSettings;
pub use state::SessionPhase;
pub use view::SessionView;
