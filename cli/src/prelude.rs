#![allow(unused)]

pub use tracing::{debug, error, info, instrument, trace, warn};

pub use crate::error::{Error, Result};
