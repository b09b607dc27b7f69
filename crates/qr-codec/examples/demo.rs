//! Command-line demonstration: encodes a handful of payloads, prints them to
//! the terminal, and decodes one back through the full image pipeline.

use qr_codec::{
    decode, DecodeOptions, EccLevel, EncodeOptions, PixelBuf, QrCode, SegmentMode,
};

fn main() {
    basic_demo();
    mode_demo();
    round_trip_demo();
}

// One symbol printed as half-block art, plus its SVG.
fn basic_demo() {
    let opts = EncodeOptions::default();
    let qr = QrCode::encode("Hello, world!", &opts).unwrap();
    let art = qr.to_bitmap(opts.border, 1).unwrap();
    println!("{}", art.to_ascii());
    println!("{}", art.to_svg(true));
}

// The three segment modes at different error correction levels.
fn mode_demo() {
    let samples = [
        ("314159265358979323846264338327950288", EccLevel::Medium, None),
        ("DOLLAR-AMOUNT:$39.87 PERCENTAGE:100.00%", EccLevel::High, None),
        ("こんにちは世界, αβγδ", EccLevel::Quartile, None),
        ("forced byte mode", EccLevel::Low, Some(SegmentMode::Byte)),
    ];
    for (text, ecc, encoding) in samples {
        let qr = QrCode::encode(
            text,
            &EncodeOptions {
                ecc,
                encoding,
                ..Default::default()
            },
        )
        .unwrap();
        println!(
            "version {} mask {} ({} modules per side)",
            qr.version().value(),
            qr.mask().value(),
            qr.size()
        );
        println!("{}", qr.to_bitmap(2, 1).unwrap().to_ascii());
    }
}

// Renders a symbol to a raw RGB buffer and feeds it back to the decoder.
fn round_trip_demo() {
    let text = "https://example.com/round-trip";
    let qr = QrCode::encode(text, &EncodeOptions::default()).unwrap();
    let art = qr.to_bitmap(4, 6).unwrap();
    let rgb = art.to_image(3).unwrap();
    let image = PixelBuf {
        width: art.width() as usize,
        height: art.height() as usize,
        data: &rgb,
    };
    let decoded = decode(&image, &DecodeOptions::default()).unwrap();
    println!("decoded back: {decoded}");
    assert_eq!(decoded, text);
}
