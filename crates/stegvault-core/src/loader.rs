//! Format detection by magic bytes, device construction and atomic persistence.

use std::fs;
use std::io::Write;
use std::path::Path;

use log::{debug, error};
use tempfile::NamedTempFile;

use crate::device::raster::{open_bitmap, open_png};
use crate::device::{CarrierFormat, CoefficientDevice, Device, SlotDevice};
use crate::options::DeviceOptions;
use crate::{Result, StegError};

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const JPEG_SIGNATURE: [u8; 3] = [0xFF, 0xD8, 0xFF];
const BITMAP_SIGNATURE: [u8; 2] = *b"BM";

/// Formats in detection order.
pub fn supported_formats() -> &'static [CarrierFormat] {
    &[CarrierFormat::Bitmap, CarrierFormat::Png, CarrierFormat::Jpeg]
}

/// Identifies the carrier format from its leading bytes, the file name plays no role.
pub fn detect(bytes: &[u8]) -> Option<CarrierFormat> {
    if bytes.starts_with(&BITMAP_SIGNATURE) {
        Some(CarrierFormat::Bitmap)
    } else if bytes.starts_with(&PNG_SIGNATURE) {
        Some(CarrierFormat::Png)
    } else if bytes.starts_with(&JPEG_SIGNATURE) {
        Some(CarrierFormat::Jpeg)
    } else {
        None
    }
}

pub fn open<P: AsRef<Path>>(path: P, options: &DeviceOptions) -> Result<Device> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| {
        error!("Error reading carrier {path:?}: {source}");
        StegError::ReadError { source }
    })?;
    debug!("read carrier {path:?}, {} bytes", bytes.len());

    open_bytes(bytes, options)
}

pub fn open_bytes(bytes: Vec<u8>, options: &DeviceOptions) -> Result<Device> {
    let format = detect(&bytes).ok_or(StegError::UnsupportedFormat)?;
    debug!("carrier format detected: {format}");

    let device: Device = match format {
        CarrierFormat::Bitmap => open_bitmap(bytes, &options.raster)?.into(),
        CarrierFormat::Png => open_png(&bytes, &options.raster)?.into(),
        CarrierFormat::Jpeg => CoefficientDevice::decode(&bytes, &options.coefficient)?.into(),
    };
    debug!("{format} carrier offers {} slots", device.capacity());

    Ok(device)
}

/// Encodes the device and writes it to `path` atomically.
pub fn save<P: AsRef<Path>>(device: &mut Device, path: P) -> Result<()> {
    let bytes = device.flush()?;
    persist(&bytes, path)
}

/// Writes `bytes` to `path` so that `path` either keeps its previous state or holds all of `bytes`.
///
/// The data goes to a temporary file next to the target first, which is then renamed.
pub fn persist<P: AsRef<Path>>(bytes: &[u8], path: P) -> Result<()> {
    let path = path.as_ref();
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let write_error = |source: std::io::Error| {
        error!("Error writing {path:?}: {source}");
        StegError::WriteError { source }
    };
    let mut file = NamedTempFile::new_in(directory).map_err(write_error)?;
    file.write_all(bytes).map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;
    file.persist(path).map_err(|e| write_error(e.error))?;
    debug!("wrote {} bytes to {path:?}", bytes.len());

    Ok(())
}
