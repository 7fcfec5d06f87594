//! Remote file download and archive extraction
//!
//! - `core` - HTTP download of single files (get-pip.py, source archives)
//! - `extract` - pulling requirement files out of source tarballs

mod core;
mod extract;

pub use core::download_file;
pub use extract::extract_named_files;
