//! printf-family formatting.

pub mod args;
mod decimal;
pub mod float;
pub mod integer;
pub mod printf;
pub mod sink;
pub mod spec;

pub use args::{Arg, ArgCursor};
pub use printf::{MAX_OUTPUT_LEN, format_to, format_to_mode, snprintf, vformat_to};
pub use sink::OutputSink;
pub use spec::{
    Conversion, DirectiveError, FormatFlags, FormatSpec, LengthMod, Precision, Width,
    parse_directive,
};
