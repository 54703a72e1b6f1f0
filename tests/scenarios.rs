extern crate tempfile;
extern crate wonderbox_icons;

use std::fs;
use wonderbox_icons::{
    ElementSpecSet, FsIconStore, IconBinder, IconError, IconFamily, IconType, Image, OSType,
    PixelFormat, FOLDER_ICON_FILE_NAME, VOLUME_ICON_FILE_NAME,
};

fn gradient(width: u32, height: u32) -> Image {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            let alpha = if (x + y) % 7 == 0 { 0 } else { 255 };
            data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 128, alpha]);
        }
    }
    Image::from_data(PixelFormat::RGBA, width, height, data).unwrap()
}

#[test]
fn generate_new_elements_from_large_source() {
    let source = gradient(512, 512);
    let family = IconFamily::from_image(&source, ElementSpecSet::ALL_NEW_AVAILABLE).unwrap();
    assert_eq!(family.elements().len(), 8);
    for element in family.elements() {
        let icon_type = element.icon_type().unwrap();
        let pixels = (icon_type.pixel_width() * icon_type.pixel_height()) as usize;
        if icon_type.is_mask() {
            assert_eq!(element.data.len(), pixels);
        } else {
            assert_eq!(element.data.len(), pixels * 4);
        }
    }
    for icon_type in ElementSpecSet::ALL_NEW_AVAILABLE.icon_types() {
        assert!(family.has_icon_with_type(icon_type), "missing {:?}", icon_type);
    }
}

#[test]
fn family_survives_serialization() {
    let source = gradient(48, 48);
    let family = IconFamily::from_image(&source, ElementSpecSet::ALL_AVAILABLE).unwrap();
    let bytes = family.to_bytes().unwrap();
    assert_eq!(&bytes[0..4], b"icns");
    let declared = u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
    assert_eq!(declared as usize, bytes.len());
    assert_eq!(family.total_length().unwrap() as usize, bytes.len());
    assert_eq!(IconFamily::from_bytes(&bytes).unwrap(), family);
}

#[test]
fn generation_is_deterministic() {
    let source = gradient(100, 60);
    let first = IconFamily::from_image(&source, ElementSpecSet::ALL_OLD_AVAILABLE).unwrap();
    let second = IconFamily::from_image(&source, ElementSpecSet::ALL_OLD_AVAILABLE).unwrap();
    assert_eq!(first.to_bytes().unwrap(), second.to_bytes().unwrap());
}

#[test]
fn each_selector_yields_exactly_its_element() {
    let source = gradient(16, 16);
    for &icon_type in IconType::ALL.iter() {
        let family = IconFamily::from_image(&source, ElementSpecSet::of(icon_type)).unwrap();
        let tags: Vec<OSType> = family.elements().iter().map(|el| el.ostype).collect();
        assert_eq!(tags, vec![icon_type.ostype()]);
        assert_eq!(family.elements()[0].data.len(), icon_type.data_length());
    }
}

#[test]
fn set_element_twice_matches_once() {
    let mut once = IconFamily::new();
    once.set_element(OSType(*b"il32"), vec![1; 4096]);
    let mut twice = once.clone();
    twice.set_element(OSType(*b"il32"), vec![1; 4096]);
    assert_eq!(once.to_bytes().unwrap(), twice.to_bytes().unwrap());
}

#[test]
fn truncated_family_is_a_format_error() {
    let mut input: Vec<u8> = b"icns\0\0\0\x64il32\0\0\0\x5c".to_vec();
    input.resize(50, 0xaa);
    assert!(matches!(IconFamily::from_bytes(&input), Err(IconError::Format(_))));
}

#[test]
fn file_icon_in_apple_double_sidecar() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    fs::write(&file, b"hello").unwrap();
    let family = IconFamily::from_image(&gradient(32, 32), ElementSpecSet::ALL_LARGE).unwrap();

    let mut binder = IconBinder::new(FsIconStore::new());
    binder.set_icon(&file, &family).unwrap();
    assert!(dir.path().join("._notes.txt").is_file());
    assert!(binder.has_custom_icon(&file).unwrap());
    assert_eq!(binder.icon_of(&file).unwrap(), Some(family));
    assert_eq!(fs::read(&file).unwrap(), b"hello");

    assert!(binder.remove_icon(&file).unwrap());
    assert!(!binder.has_custom_icon(&file).unwrap());
    assert!(!dir.path().join("._notes.txt").exists());
}

#[test]
fn volume_root_gets_folder_and_volume_icons() {
    let dir = tempfile::tempdir().unwrap();
    let family = IconFamily::from_image(&gradient(32, 32), ElementSpecSet::ALL_NEW_AVAILABLE)
        .unwrap();
    let mut binder = IconBinder::new(FsIconStore::new().with_volume_root(dir.path()));

    binder.set_icon(dir.path(), &family).unwrap();
    let volume_icon = dir.path().join(VOLUME_ICON_FILE_NAME);
    assert!(dir.path().join(FOLDER_ICON_FILE_NAME).exists());
    assert_eq!(IconFamily::read_from_path(&volume_icon).unwrap(), family);
    assert!(binder.has_custom_icon(dir.path()).unwrap());

    binder.remove_icon(dir.path()).unwrap();
    assert!(!dir.path().join(FOLDER_ICON_FILE_NAME).exists());
    assert!(!volume_icon.exists());
    assert!(!binder.has_custom_icon(dir.path()).unwrap());
}

#[test]
fn missing_target_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let mut binder = IconBinder::new(FsIconStore::new());
    let result = binder.set_icon(dir.path().join("absent"), &IconFamily::new());
    assert!(matches!(result, Err(IconError::TargetNotFound(_))));
}
