// Server implementations behind the dispatcher.
// Only one tool provider today: the UNHCR demographics fetch.

pub mod demographics;

pub use demographics::{reshape_payload, DemographicsServer, NO_DATA_TEXT, TOOL_NAME};
