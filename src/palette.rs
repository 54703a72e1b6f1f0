//! The fixed system color tables used by legacy indexed icon elements.

/// Channel steps of the 6x6x6 color cube, brightest first.
const CUBE_STEPS: [u8; 6] = [0xFF, 0xCC, 0x99, 0x66, 0x33, 0x00];

/// Intermediate steps used by the red, green, blue and gray ramps.
const RAMP_STEPS: [u8; 10] = [0xEE, 0xDD, 0xBB, 0xAA, 0x88, 0x77, 0x55, 0x44, 0x22, 0x11];

/// The 256-color system palette: the color cube without black, then the
/// red, green, blue and gray ramps, then black.
pub const SYSTEM_PALETTE_8: [[u8; 3]; 256] = build_palette_8();

/// The 16-color system palette.
pub const SYSTEM_PALETTE_4: [[u8; 3]; 16] = [
    [0xFF, 0xFF, 0xFF],
    [0xFC, 0xF3, 0x05],
    [0xFF, 0x64, 0x02],
    [0xDD, 0x08, 0x06],
    [0xF2, 0x08, 0x84],
    [0x46, 0x00, 0xA5],
    [0x00, 0x00, 0xD4],
    [0x02, 0xAB, 0xEA],
    [0x1F, 0xB7, 0x14],
    [0x00, 0x64, 0x11],
    [0x56, 0x2C, 0x05],
    [0x90, 0x71, 0x3A],
    [0xC0, 0xC0, 0xC0],
    [0x80, 0x80, 0x80],
    [0x40, 0x40, 0x40],
    [0x00, 0x00, 0x00],
];

const fn build_palette_8() -> [[u8; 3]; 256] {
    let mut palette = [[0u8; 3]; 256];
    let mut index = 0;
    let mut r = 0;
    while r < 6 {
        let mut g = 0;
        while g < 6 {
            let mut b = 0;
            while b < 6 {
                if r < 5 || g < 5 || b < 5 {
                    palette[index] = [CUBE_STEPS[r], CUBE_STEPS[g], CUBE_STEPS[b]];
                    index += 1;
                }
                b += 1;
            }
            g += 1;
        }
        r += 1;
    }
    let mut channel = 0;
    while channel < 4 {
        let mut step = 0;
        while step < RAMP_STEPS.len() {
            let value = RAMP_STEPS[step];
            palette[index] = match channel {
                0 => [value, 0, 0],
                1 => [0, value, 0],
                2 => [0, 0, value],
                _ => [value, value, value],
            };
            index += 1;
            step += 1;
        }
        channel += 1;
    }
    // The final entry stays black.
    palette
}

/// Returns the index of the palette entry closest to `rgb` by squared
/// distance.  Ties go to the lowest index.
pub fn nearest_index(palette: &[[u8; 3]], rgb: [u8; 3]) -> u8 {
    let mut best_index = 0;
    let mut best_distance = u32::MAX;
    for (index, entry) in palette.iter().enumerate() {
        let distance: u32 = entry
            .iter()
            .zip(rgb.iter())
            .map(|(&a, &b)| {
                let delta = i32::from(a) - i32::from(b);
                (delta * delta) as u32
            })
            .sum();
        if distance < best_distance {
            best_distance = distance;
            best_index = index;
            if distance == 0 {
                break;
            }
        }
    }
    best_index as u8
}
