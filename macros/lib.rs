//! Re-exports the option-registration proc macros used to build the solver's
//! settings and dispatch enums.
pub use options::{build_option_enum, build_options, explicit_options, use_option};
