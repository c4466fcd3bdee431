mod common;

use std::fs;

use stegvault_core::{capacity, embed, loader, Embed, ErrorKind, Session, SlotDevice, StegError};
use tempfile::tempdir;

/// 10 payload bytes become 26 ciphertext bytes: 296 + 26 * 8 = 504 slots.
const REQUIRED_SLOTS: u32 = 504;

#[test]
fn payload_fits_exactly() {
    let options = common::one_slot_per_pixel();
    let session =
        Session::<Embed>::from_bytes(common::bitmap(REQUIRED_SLOTS, 1), &options).unwrap();
    assert_eq!(session.capacity().slots, 504);
    assert_eq!(session.capacity().max_payload_bytes, 10);

    let sealed = session.embed(b"pw", &[0xA5; 10]).unwrap();

    let payload = Session::<stegvault_core::Extract>::from_bytes(sealed.into_bytes(), &options)
        .unwrap()
        .extract(b"pw")
        .unwrap();
    assert_eq!(payload, [0xA5; 10]);
}

#[test]
fn one_slot_short_is_capacity_exceeded() {
    let options = common::one_slot_per_pixel();
    let result = Session::<Embed>::from_bytes(common::bitmap(REQUIRED_SLOTS - 1, 1), &options)
        .unwrap()
        .embed(b"pw", &[0xA5; 10]);

    match result {
        Err(StegError::CapacityExceeded {
            required,
            available,
        }) => {
            assert_eq!(required, 504);
            assert_eq!(available, 503);
        }
        other => panic!("expected CapacityExceeded, got {other:?}"),
    }
}

#[test]
fn failed_embedding_leaves_no_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("small.bmp");
    let output = dir.path().join("out.bmp");
    fs::write(&input, common::bitmap(16, 16)).unwrap();

    let error = embed(&input, b"pw", &[0u8; 1000], &output, &common::options()).unwrap_err();

    assert_eq!(error.kind(), ErrorKind::CapacityExceeded);
    assert!(!output.exists());
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn failed_embedding_keeps_an_existing_output() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("small.bmp");
    let output = dir.path().join("out.bmp");
    fs::write(&input, common::bitmap(16, 16)).unwrap();
    fs::write(&output, b"previous").unwrap();

    assert!(embed(&input, b"pw", &[0u8; 1000], &output, &common::options()).is_err());
    assert_eq!(fs::read(&output).unwrap(), b"previous");
}

#[test]
fn capacity_reports_all_formats() {
    let dir = tempdir().unwrap();
    for (name, data) in [
        ("c.bmp", common::bitmap(10, 10)),
        ("c.png", common::png_rgba(10, 10)),
        ("c.jpg", common::jpeg(64, 64)),
    ] {
        let path = dir.path().join(name);
        fs::write(&path, data).unwrap();
        let c = capacity(&path, &common::options()).unwrap();

        assert_eq!(c.header_slots, 296, "{name}");
        if name != "c.jpg" {
            assert_eq!(c.slots, 300, "{name}");
        } else {
            assert!(c.slots > 0);
        }
    }
}

#[test]
fn jpeg_slot_set_survives_embedding() {
    let options = common::options();
    let carrier = common::jpeg(96, 80);
    let before = loader::open_bytes(carrier.clone(), &options.device)
        .unwrap()
        .capacity();

    let sealed = Session::<Embed>::from_bytes(carrier, &options)
        .unwrap()
        .embed(b"pw", b"stable")
        .unwrap();
    let after = loader::open_bytes(sealed.into_bytes(), &options.device)
        .unwrap()
        .capacity();

    assert_eq!(before, after);
}
