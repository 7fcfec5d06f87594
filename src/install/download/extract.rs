//! Selective extraction of requirement files from source tarballs

use std::fs::{self, File};
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use crate::error::{InstallerError, Result};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Extract members of `archive` whose file name is in `names` into `destination`
///
/// Gzip-compressed and plain tarballs are both accepted. Directory structure
/// inside the archive is preserved. Returns the extracted paths.
pub fn extract_named_files(
    archive: &Path,
    destination: &Path,
    names: &[&str],
) -> Result<Vec<PathBuf>> {
    let to_error = |source: io::Error| InstallerError::Extract {
        archive: archive.to_path_buf(),
        source,
    };

    let mut file = File::open(archive).map_err(to_error)?;
    let gzipped = is_gzip(&mut file).map_err(to_error)?;
    fs::create_dir_all(destination)?;

    let extracted = if gzipped {
        unpack_matching(Archive::new(GzDecoder::new(file)), destination, names)
    } else {
        unpack_matching(Archive::new(file), destination, names)
    };
    extracted.map_err(to_error)
}

fn is_gzip(file: &mut File) -> io::Result<bool> {
    let mut magic = [0u8; 2];
    let gzipped = match file.read_exact(&mut magic) {
        Ok(()) => magic == GZIP_MAGIC,
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(e) => return Err(e),
    };
    file.seek(SeekFrom::Start(0))?;
    Ok(gzipped)
}

fn unpack_matching<R: Read>(
    mut archive: Archive<R>,
    destination: &Path,
    names: &[&str],
) -> io::Result<Vec<PathBuf>> {
    let mut extracted = Vec::new();
    for entry in archive.entries()? {
        let mut entry = entry?;
        if entry.header().entry_type() != EntryType::Regular {
            continue;
        }
        let path = entry.path()?.into_owned();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| names.contains(&name));
        if matches && entry.unpack_in(destination)? {
            extracted.push(destination.join(&path));
        }
    }
    Ok(extracted)
}
