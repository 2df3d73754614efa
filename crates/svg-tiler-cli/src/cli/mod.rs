//! CLI command implementations.
//!
//! - `export` - Write the tiled composite as SVG, PNG or PDF
//! - `layout` - Print tile placements (table or JSON)
//! - `params` - List layout parameters with defaults and ranges

pub mod common;
pub mod export;
pub mod layout;
pub mod params;

pub use export::cmd_export;
pub use layout::cmd_layout;
pub use params::cmd_params;
