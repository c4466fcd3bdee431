mod common;

use std::fs;

use stegvault_core::{api, commands, ErrorKind, Password, StegError};
use tempfile::tempdir;

#[test]
fn illustrate_api_usage() {
    let dir = tempdir().unwrap();
    let carrier = dir.path().join("carrier.png");
    let output = dir.path().join("image-with-secret.png");
    fs::write(&carrier, common::png_rgb(64, 64)).unwrap();

    api::embed::prepare()
        .with_options(common::options())
        .with_payload("Hello, World!")
        .with_password("SuperSecret42")
        .with_carrier(&carrier)
        .with_output(&output)
        .execute()
        .expect("Failed to hide payload in image");

    let payload = api::extract::prepare()
        .with_options(common::options())
        .with_carrier(&output)
        .with_password("SuperSecret42")
        .read()
        .expect("Failed to unveil payload from image");

    assert_eq!(payload, b"Hello, World!");
}

#[test]
fn commands_work_on_files() {
    let dir = tempdir().unwrap();
    let carrier = dir.path().join("carrier.bmp");
    let payload_file = dir.path().join("payload.txt");
    let secret = dir.path().join("secret.bmp");
    let unveiled = dir.path().join("unveiled.txt");
    fs::write(&carrier, common::bitmap(80, 60)).unwrap();
    fs::write(&payload_file, b"file content to hide").unwrap();

    commands::insert(
        &carrier,
        &payload_file,
        &secret,
        "hunter2".into(),
        common::options(),
    )
    .unwrap();
    commands::extract(&secret, &unveiled, "hunter2".into(), common::options()).unwrap();

    assert_eq!(fs::read(&unveiled).unwrap(), b"file content to hide");
    let capacity = commands::capacity(&secret, common::options()).unwrap();
    assert_eq!(capacity.slots, 80 * 60 * 3);
}

#[test]
fn wrong_password_writes_nothing() {
    let dir = tempdir().unwrap();
    let carrier = dir.path().join("carrier.bmp");
    let secret = dir.path().join("secret.bmp");
    let unveiled = dir.path().join("unveiled.txt");
    fs::write(&carrier, common::bitmap(64, 64)).unwrap();

    api::embed::prepare()
        .with_options(common::options())
        .with_payload([1u8, 2, 3])
        .with_password("right")
        .with_carrier(&carrier)
        .with_output(&secret)
        .execute()
        .unwrap();

    let error = commands::extract(&secret, &unveiled, "wrong".into(), common::options())
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::IntegrityFailure);
    assert!(!unveiled.exists());
}

#[test]
fn missing_payload_file_is_a_read_error() {
    let dir = tempdir().unwrap();
    let carrier = dir.path().join("carrier.bmp");
    fs::write(&carrier, common::bitmap(8, 8)).unwrap();

    let error = commands::insert(
        &carrier,
        &dir.path().join("missing.txt"),
        &dir.path().join("out.bmp"),
        Password::from("pw"),
        common::options(),
    )
    .unwrap_err();

    assert!(matches!(error, StegError::ReadError { .. }));
}

#[test]
fn empty_password_is_rejected() {
    let dir = tempdir().unwrap();
    let carrier = dir.path().join("carrier.bmp");
    fs::write(&carrier, common::bitmap(64, 64)).unwrap();

    let error = api::embed::prepare()
        .with_options(common::options())
        .with_payload("x")
        .with_password("")
        .with_carrier(&carrier)
        .with_output(dir.path().join("out.bmp"))
        .execute()
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::InvalidInput);
}

#[test]
fn binary_password_round_trips() {
    let dir = tempdir().unwrap();
    let carrier = dir.path().join("carrier.bmp");
    let secret = dir.path().join("secret.bmp");
    fs::write(&carrier, common::bitmap(64, 64)).unwrap();
    let password = vec![0xFFu8, 0x00, 0xC3, 0x28];

    api::embed::prepare()
        .with_options(common::options())
        .with_payload("bytes, not text")
        .with_password(password.clone())
        .with_carrier(&carrier)
        .with_output(&secret)
        .execute()
        .unwrap();

    let payload = api::extract::prepare()
        .with_options(common::options())
        .with_carrier(&secret)
        .with_password(&password[..])
        .read()
        .unwrap();
    assert_eq!(payload, b"bytes, not text");

    let error = api::extract::prepare()
        .with_options(common::options())
        .with_carrier(&secret)
        .with_password(&password[..3])
        .read()
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::IntegrityFailure);
}
