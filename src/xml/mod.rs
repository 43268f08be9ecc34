//! XML dialect parsing (CML and AnIML)
//!
//! Both dialects share one forward-only streaming cursor built on quick-xml;
//! the per-dialect modules own the tag dispatch and spectrum assembly.

pub mod animl;
pub mod cml;
pub mod cursor;
pub mod encoded;

pub use cursor::{Attributes, XmlCursor, XmlToken};
