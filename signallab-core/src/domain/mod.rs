//! Domain types for SignalLab

pub mod bar;
pub mod signal;

pub use bar::{Bar, BarSeries};
pub use signal::{Bias, PriceLevels, Signal};

/// Symbol type alias
pub type Symbol = String;
