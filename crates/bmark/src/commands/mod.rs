//! CLI command implementations.

pub(crate) mod convert;
pub(crate) mod options;

pub(crate) use convert::ConvertArgs;
pub(crate) use options::OptionsArgs;
