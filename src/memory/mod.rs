//! Reading and mapping target process memory
//!
//! Three layers: `regions` reports maximal readable regions, `copier`
//! performs single bulk reads, and `walker` combines the two into a
//! resilient traversal of everything readable.

pub mod copier;
pub mod regions;
pub mod walker;

pub use copier::copy_memory;
pub use regions::next_readable_region;
pub use walker::walk_memory;
