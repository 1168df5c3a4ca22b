use std::io::{Cursor, Read, Seek};
use std::path::Path;

use tracing::info;
use zip::ZipArchive;

use crate::error::Error;

/// Largest style package we are willing to unpack.
const MAX_STYLE_BYTES: usize = 64 * 1024 * 1024;

/// Download the style package at `url` and unpack it into `dest`.
pub fn fetch_style(url: &str, dest: &Path) -> Result<(), Error> {
    info!(url, dest = %dest.display(), "downloading style package");
    let response = ureq::get(url).call().map_err(|e| Error::Download {
        reason: format!("request to {url} failed: {e}"),
    })?;
    let data = response
        .into_body()
        .read_to_vec()
        .map_err(|e| Error::Download {
            reason: format!("failed to read style package body: {e}"),
        })?;
    unpack_style(&data, dest)
}

/// Unpack a zipped style package into `dest`, creating it if needed.
pub fn unpack_style(data: &[u8], dest: &Path) -> Result<(), Error> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    check_unpacked_size(&mut archive, MAX_STYLE_BYTES)?;
    std::fs::create_dir_all(dest)?;
    archive.extract(dest)?;
    Ok(())
}

/// Sum the uncompressed entry sizes from the central directory and reject
/// archives larger than `limit`.
fn check_unpacked_size<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    limit: usize,
) -> Result<(), Error> {
    let mut total: u64 = 0;
    for i in 0..archive.len() {
        total = total.saturating_add(archive.by_index_raw(i)?.size());
    }
    if total > limit as u64 {
        return Err(Error::InputTooLarge {
            size: usize::try_from(total).unwrap_or(usize::MAX),
            limit,
        });
    }
    Ok(())
}
