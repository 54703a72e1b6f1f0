//! Lists the elements of an ICNS file.
//!
//! ```shell
//! cargo run --example readicns <path/to/file.icns>
//! ```

extern crate wonderbox_icons;

use std::env;
use wonderbox_icons::IconFamily;

fn main() {
    if env::args().count() != 2 {
        println!("Usage: readicns <path>");
        return;
    }
    let path = env::args().nth(1).unwrap();
    let family = IconFamily::read_from_path(&path).expect("failed to read ICNS file");
    println!("ICNS file contains {} element(s).", family.elements().len());
    for (index, element) in family.elements().iter().enumerate() {
        let kind = match element.icon_type() {
            Some(icon_type) => format!(
                "{}x{}, {:?}",
                icon_type.pixel_width(),
                icon_type.pixel_height(),
                icon_type.encoding()
            ),
            None => "not an image".to_string(),
        };
        println!(
            "Element {}: {} ({} byte payload, {})",
            index,
            element.ostype,
            element.data.len(),
            kind
        );
    }
    if family.has_variants() {
        println!("The family carries state variants.");
    }
}
