//! Reusable pieces embedded by the view layer.

pub mod input;
pub mod select_list;
pub mod spinner;

pub use input::Input;
pub use select_list::{SelectList, SelectRow};
pub use spinner::{Spinner, SpinnerTick};
