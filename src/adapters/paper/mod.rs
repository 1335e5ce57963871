//! Paper trading venue used for local replays

mod broker;

pub use broker::{PaperBroker, PaperSnapshot, PaperStats};
