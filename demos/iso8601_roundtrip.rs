//! Read ISO 8601 images through a few formats and write them back.
//!
//! Run with: cargo run --example iso8601-roundtrip

use tempus::format::Format;

fn main() {
    let cases = [
        ("YYYY-MM-DD", "1985-04-12"),
        ("YYYY-MM-DD", "1985-04"),
        ("YYYY-Www-D", "1985-W15-5"),
        ("hh:mm:ss±hh:mm", "15:27:46-05:00"),
        ("Pnn\u{0332}Ynn\u{0332}Mnn\u{0332}DTnn\u{0332}Hnn\u{0332}Mnn\u{0332}S", "P2Y10M15DT10H30M20S"),
        ("Rn\u{0332}/YYYYMMDDThhmmss/Pnn\u{0332}Ynn\u{0332}M", "R12/19850412T232050/P1Y2M"),
    ];
    for (repr, image) in cases {
        let format = match Format::new(repr) {
            Ok(f) => f,
            Err(e) => {
                eprintln!("bad format {:?}: {}", repr, e);
                continue;
            }
        };
        match format.read(image) {
            Ok(value) => {
                let back = format.format(&value).unwrap_or_else(|e| e.to_string());
                println!("{:>24}  {}  ->  {:?}", repr, image, value);
                println!("{:>24}  wrote back: {}", "", back);
            }
            Err(e) => println!("{:>24}  {}  !!  {}", repr, image, e),
        }
    }
}
