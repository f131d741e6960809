pub mod compile;
pub mod diagnostics;
pub mod model;
pub mod signature;
pub mod xml;

mod assemble;
