//! Generates an ICNS file from a PNG image of any size.
//!
//! ```shell
//! cargo run --example png2icns <path/to/file.png> [<selector>]
//! # ICNS will be saved to path/to/file.icns
//! ```
//!
//! The optional selector is one of `new` (32-bit data and masks, the
//! default), `old` (indexed and 1-bit elements) or `all`.  Pass a third
//! argument to also attach the result as the custom icon of that path.

extern crate wonderbox_icons;

use std::env;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use wonderbox_icons::{set_custom_icon, ElementSpecSet, IconFamily, Image};

fn main() {
    let num_args = env::args().count();
    if !(2..=4).contains(&num_args) {
        println!("Usage: png2icns <path> [new|old|all] [<attach-to>]");
        return;
    }
    let png_path = env::args().nth(1).unwrap();
    let png_path = Path::new(&png_path);
    let selector = match env::args().nth(2).as_deref() {
        None | Some("new") => ElementSpecSet::ALL_NEW_AVAILABLE,
        Some("old") => ElementSpecSet::ALL_OLD_AVAILABLE,
        Some("all") => ElementSpecSet::ALL_AVAILABLE,
        Some(other) => {
            println!("Unknown selector: {}", other);
            return;
        }
    };
    let png_file = BufReader::new(File::open(png_path).expect("failed to open PNG file"));
    let image = Image::read_png(png_file).expect("failed to read PNG file");
    let family = IconFamily::from_image(&image, selector).expect("failed to generate icons");
    let icns_path = png_path.with_extension("icns");
    family
        .write_to_path(&icns_path)
        .expect("failed to write ICNS file");
    println!(
        "Wrote {} element(s) to {}",
        family.elements().len(),
        icns_path.display()
    );
    if let Some(target) = env::args().nth(3) {
        set_custom_icon(&target, &family).expect("failed to set custom icon");
        println!("Attached icon to {}", target);
    }
}
