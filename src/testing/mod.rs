//! Testing utilities

pub mod mock_radio;
pub mod scenario;

pub use mock_radio::MockRadio;
pub use scenario::ClockScenario;
