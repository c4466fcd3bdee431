mod common;

use std::fs;

use stegvault_core::{
    extract, loader, CarrierFormat, CoefficientOptions, Device, ErrorKind, Extract, Session,
    SlotDevice, StegError,
};
use tempfile::tempdir;

#[test]
fn devices_match_formats() {
    let options = common::options();

    let bmp = loader::open_bytes(common::bitmap(8, 8), &options.device).unwrap();
    let png = loader::open_bytes(common::png_rgb(8, 8), &options.device).unwrap();
    let jpg = loader::open_bytes(common::jpeg(16, 16), &options.device).unwrap();

    assert!(matches!(bmp, Device::RasterDevice(_)));
    assert!(matches!(png, Device::RasterDevice(_)));
    assert!(matches!(jpg, Device::CoefficientDevice(_)));
    assert_eq!(bmp.format(), CarrierFormat::Bitmap);
    assert_eq!(png.format(), CarrierFormat::Png);
    assert_eq!(jpg.format(), CarrierFormat::Jpeg);
}

#[test]
fn unknown_format_is_unsupported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("carrier.gif");
    fs::write(&path, b"GIF89a\x01\x00\x01\x00").unwrap();

    let error = extract(&path, b"pw", &common::options()).unwrap_err();

    assert!(matches!(error, StegError::UnsupportedFormat));
    assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn truncated_png_is_corrupt() {
    let mut data = common::png_rgb(32, 32);
    data.truncate(data.len() / 2);

    let error = loader::open_bytes(data, &common::options().device).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::CorruptCarrier);
}

#[test]
fn truncated_jpeg_is_corrupt() {
    let mut data = common::jpeg(64, 64);
    data.truncate(data.len() / 2);

    let error = loader::open_bytes(data, &common::options().device).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::CorruptCarrier);
}

#[test]
fn progressive_jpeg_is_unsupported() {
    let mut data = common::jpeg(16, 16);
    let sof = data
        .windows(2)
        .position(|w| w == [0xFF, 0xC0])
        .expect("baseline frame marker");
    data[sof + 1] = 0xC2;

    let error = loader::open_bytes(data, &common::options().device).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::UnsupportedFormat);
}

#[test]
fn carrier_without_payload_is_corrupt() {
    for data in [common::bitmap(64, 64), common::png_rgb(64, 64), common::jpeg(128, 128)] {
        let result = Session::<Extract>::from_bytes(data, &common::options())
            .unwrap()
            .extract(b"pw");

        assert_eq!(result.unwrap_err().kind(), ErrorKind::CorruptCarrier);
    }
}

#[test]
fn coefficient_policy_changes_capacity() {
    let data = common::jpeg(64, 64);
    let narrow = common::options().with_coefficient(CoefficientOptions {
        highest_frequency: 10,
        ..Default::default()
    });
    let wide = common::options().with_coefficient(CoefficientOptions {
        highest_frequency: 63,
        skip_zero_and_one: false,
    });

    let narrow = loader::open_bytes(data.clone(), &narrow.device).unwrap().capacity();
    let wide = loader::open_bytes(data, &wide.device).unwrap().capacity();

    assert!(narrow < wide);
}
