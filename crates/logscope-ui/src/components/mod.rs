//! Small reusable pieces of the viewer screen.

pub mod header;
pub mod status;
