pub mod driver;
pub mod navigation;

pub use driver::{advance, DisplayDriver};
pub use navigation::{EventAddress, NavChannel, NavCommand};
