// toprefix-core/src/source/extract.rs
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use toprefix_common::error::Result;
use tracing::debug;
use xz2::read::XzDecoder;
use zip::ZipArchive;

use super::naming::ArchiveFormat;

/// Unpacks `archive_path` into `dest`, dispatching on the declared format.
pub fn unpack_archive(archive_path: &Path, dest: &Path, format: ArchiveFormat) -> Result<()> {
    debug!(
        "Unpacking {} into {}",
        archive_path.display(),
        dest.display()
    );
    let file = File::open(archive_path)?;
    match format {
        ArchiveFormat::TarGz => unpack_tar(GzDecoder::new(BufReader::new(file)), dest),
        ArchiveFormat::TarBz2 => unpack_tar(BzDecoder::new(BufReader::new(file)), dest),
        ArchiveFormat::TarXz => unpack_tar(XzDecoder::new(BufReader::new(file)), dest),
        ArchiveFormat::Zip => unpack_zip(file, dest),
    }
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_permissions(true);
    archive.unpack(dest)?;
    Ok(())
}

fn unpack_zip(file: File, dest: &Path) -> Result<()> {
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(std::io::Error::other)?;
    archive.extract(dest).map_err(std::io::Error::other)?;
    Ok(())
}
