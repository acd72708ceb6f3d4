//! End-to-end scenarios: real files written and reopened, plus crafted
//! wire-format buffers decoded against known values.

use logimage_io::{create, open, open_from_memory, CreateOptions, SourceFormat};
use logimage_transfer::printing_density::{log_to_lin_lut, FilmParams};

fn temp_path(name: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(name)
}

fn put_u32(buf: &mut Vec<u8>, v: u32, is_msb: bool) {
    if is_msb {
        buf.extend_from_slice(&v.to_be_bytes());
    } else {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

fn put_u16(buf: &mut Vec<u8>, v: u16, is_msb: bool) {
    if is_msb {
        buf.extend_from_slice(&v.to_be_bytes());
    } else {
        buf.extend_from_slice(&v.to_le_bytes());
    }
}

fn put_f32(buf: &mut Vec<u8>, v: f32, is_msb: bool) {
    put_u32(buf, v.to_bits(), is_msb);
}

fn pad(buf: &mut Vec<u8>, n: usize) {
    buf.extend(std::iter::repeat(0u8).take(n));
}

/// Packs one row of 10-bit samples into filled method A words (offsets
/// 22, 12, 2; pad bits at the low end).
fn pack_filled_a(samples: &[u32], is_msb: bool) -> Vec<u8> {
    let mut bytes = Vec::new();
    for chunk in samples.chunks(3) {
        let mut word = 0u32;
        let mut offset = 22;
        for &s in chunk {
            word |= s << offset;
            offset -= 10;
        }
        put_u32(&mut bytes, word, is_msb);
    }
    bytes
}

/// Crafts a minimal single-element 8-bit RGB DPX with the pixel data at
/// offset 2048, in either byte order.
fn craft_dpx_8bit_rgb(width: u32, height: u32, pixels: &[u8], is_msb: bool) -> Vec<u8> {
    const UNDEFINED: u32 = u32::MAX;
    let row = ((width as usize * 3).div_ceil(4)) * 4;
    let mut buf = Vec::new();

    // File information.
    put_u32(&mut buf, 0x53445058, is_msb); // magic, byte order selects SDPX/XPDS
    put_u32(&mut buf, 2048, is_msb);
    buf.extend_from_slice(b"V2.0\0\0\0\0");
    put_u32(&mut buf, 2048 + (row * height as usize) as u32, is_msb);
    put_u32(&mut buf, 1, is_msb);
    put_u32(&mut buf, 1664, is_msb);
    put_u32(&mut buf, 384, is_msb);
    put_u32(&mut buf, 0, is_msb);
    pad(&mut buf, 100 + 24 + 100 + 200 + 200);
    put_u32(&mut buf, UNDEFINED, is_msb);
    pad(&mut buf, 104);
    assert_eq!(buf.len(), 768);

    // Image information: one RGB element, linear transfer.
    put_u16(&mut buf, 0, is_msb);
    put_u16(&mut buf, 1, is_msb);
    put_u32(&mut buf, width, is_msb);
    put_u32(&mut buf, height, is_msb);
    put_u32(&mut buf, 0, is_msb); // data sign
    put_u32(&mut buf, UNDEFINED, is_msb);
    put_u32(&mut buf, UNDEFINED, is_msb);
    put_u32(&mut buf, UNDEFINED, is_msb);
    put_u32(&mut buf, UNDEFINED, is_msb);
    buf.push(50); // RGB
    buf.push(2); // linear
    buf.push(2);
    buf.push(8);
    put_u16(&mut buf, 0, is_msb);
    put_u16(&mut buf, 0, is_msb);
    put_u32(&mut buf, 2048, is_msb);
    put_u32(&mut buf, 0, is_msb);
    put_u32(&mut buf, 0, is_msb);
    pad(&mut buf, 32);
    pad(&mut buf, 7 * 72 + 52);
    assert_eq!(buf.len(), 1408);

    // Orientation, film and television sections, all unset.
    pad(&mut buf, 256 + 256 + 128);
    assert_eq!(buf.len(), 2048);

    for y in 0..height as usize {
        let line = &pixels[y * width as usize * 3..(y + 1) * width as usize * 3];
        buf.extend_from_slice(line);
        pad(&mut buf, row - line.len());
    }
    buf
}

/// Crafts a 10-bit Cineon from per-channel code planes, either pixel
/// interleaved (`interleave == 0`) or planar (`interleave == 2`).
fn craft_cineon(width: u32, height: u32, planes: &[Vec<u32>; 3], interleave: u8) -> Vec<u8> {
    const UNDEFINED: u32 = u32::MAX;
    let is_msb = true;
    let mut buf = Vec::new();

    // File information.
    put_u32(&mut buf, 0x802A_5FD7, is_msb);
    put_u32(&mut buf, 2048, is_msb);
    put_u32(&mut buf, 1024, is_msb);
    put_u32(&mut buf, 1024, is_msb);
    put_u32(&mut buf, 0, is_msb);
    put_u32(&mut buf, 0, is_msb); // file size left unset
    buf.extend_from_slice(b"V4.5\0\0\0\0");
    pad(&mut buf, 100 + 12 + 12 + 36);
    assert_eq!(buf.len(), 192);

    // Image information: R, G, B channels.
    buf.push(0);
    buf.push(3);
    pad(&mut buf, 2);
    for designator in 1..=3u8 {
        buf.push(0);
        buf.push(designator);
        buf.push(10);
        buf.push(0);
        put_u32(&mut buf, width, is_msb);
        put_u32(&mut buf, height, is_msb);
        put_f32(&mut buf, 0.0, is_msb);
        put_f32(&mut buf, 0.0, is_msb);
        put_f32(&mut buf, 1023.0, is_msb);
        put_f32(&mut buf, 2.048, is_msb);
    }
    pad(&mut buf, 5 * 28);
    for _ in 0..8 {
        put_u32(&mut buf, UNDEFINED, is_msb);
    }
    pad(&mut buf, 200 + 28);
    assert_eq!(buf.len(), 680);

    // Data format.
    buf.push(interleave);
    buf.push(5); // longword filled, left justified
    buf.push(0);
    buf.push(0);
    put_u32(&mut buf, 0, is_msb);
    put_u32(&mut buf, 0, is_msb);
    pad(&mut buf, 20);
    assert_eq!(buf.len(), 712);

    // Origination and film industry sections, all unset.
    pad(&mut buf, 312 + 1024);
    assert_eq!(buf.len(), 2048);

    let w = width as usize;
    match interleave {
        0 => {
            for y in 0..height as usize {
                let mut row = Vec::with_capacity(w * 3);
                for x in 0..w {
                    for plane in planes {
                        row.push(plane[y * w + x]);
                    }
                }
                buf.extend(pack_filled_a(&row, is_msb));
            }
        }
        2 => {
            for plane in planes {
                for y in 0..height as usize {
                    buf.extend(pack_filled_a(&plane[y * w..(y + 1) * w], is_msb));
                }
            }
        }
        _ => unreachable!(),
    }
    buf
}

#[test]
fn dpx_8bit_linear_decodes_exact() {
    // 2x1 RGB, pixels (0x00, 0x80, 0xFF) and (0xFF, 0x00, 0x80).
    let pixels = [0x00u8, 0x80, 0xFF, 0xFF, 0x00, 0x80];
    for is_msb in [true, false] {
        let file = craft_dpx_8bit_rgb(2, 1, &pixels, is_msb);
        let mut image = open_from_memory(&file).unwrap();
        assert_eq!(image.size(), (2, 1, 3));
        assert_eq!(image.is_msb(), is_msb);

        let rgba = image.read_rgba(false).unwrap();
        let expected = [
            0.0,
            128.0 / 255.0,
            1.0,
            1.0,
            1.0,
            0.0,
            128.0 / 255.0,
            1.0,
        ];
        for (i, (&got, &want)) in rgba.iter().zip(&expected).enumerate() {
            assert!((got - want).abs() < 1e-6, "sample {}: {} vs {}", i, got, want);
        }
    }
}

#[test]
fn cineon_printing_density_decodes_via_lut() {
    // 1x1 image, code 500 on all three channels.
    let planes = [vec![500u32], vec![500], vec![500]];
    let file = craft_cineon(1, 1, &planes, 0);
    let mut image = open_from_memory(&file).unwrap();

    let rgba = image.read_rgba(false).unwrap();
    let lut = log_to_lin_lut(&FilmParams::default());
    for c in 0..3 {
        assert_eq!(rgba[c], lut[500], "channel {}", c);
    }
    assert_eq!(rgba[3], 1.0);
}

#[test]
fn cineon_planar_matches_interleaved() {
    let planes = [
        vec![100u32, 200, 300, 400],
        vec![500, 600, 700, 800],
        vec![900, 1000, 64, 512],
    ];
    let interleaved = craft_cineon(2, 2, &planes, 0);
    let planar = craft_cineon(2, 2, &planes, 2);

    let mut a = open_from_memory(&interleaved).unwrap();
    let mut b = open_from_memory(&planar).unwrap();
    assert_eq!(a.elements().len(), 1);
    assert_eq!(b.elements().len(), 3);
    assert_eq!(a.size(), b.size());

    let rgba_a = a.read_rgba(false).unwrap();
    let rgba_b = b.read_rgba(false).unwrap();
    assert_eq!(rgba_a, rgba_b);

    // Both match the printing-density decode of the raw codes.
    let lut = log_to_lin_lut(&FilmParams::default());
    for p in 0..4 {
        for c in 0..3 {
            assert_eq!(rgba_a[p * 4 + c], lut[planes[c][p] as usize]);
        }
        assert_eq!(rgba_a[p * 4 + 3], 1.0);
    }
}

#[test]
fn dpx_16bit_rgba_linear_roundtrip() {
    let path = temp_path("logimage_e2e_16bit.dpx");
    let width = 4u32;
    let height = 2u32;
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for i in 0..(width * height) as usize {
        data.push(i as f32 / 16.0);
        data.push(0.5 - i as f32 / 32.0);
        data.push(1.0 - i as f32 / 16.0);
        data.push(if i % 2 == 0 { 1.0 } else { 0.0 });
    }

    let options = CreateOptions {
        format: SourceFormat::Dpx,
        width,
        height,
        bits_per_sample: 16,
        has_alpha: true,
        ..CreateOptions::default()
    };
    {
        let mut image = create(&path, &options).unwrap();
        image.write_rgba(&data, true).unwrap();
    }

    let mut image = open(&path).unwrap();
    assert_eq!(image.size(), (width, height, 4));
    let decoded = image.read_rgba(true).unwrap();
    for (i, (&got, &want)) in decoded.iter().zip(&data).enumerate() {
        let tolerance = if i % 4 == 3 { 0.0 } else { 5e-5 };
        assert!(
            (got - want).abs() <= tolerance,
            "sample {}: {} vs {}",
            i,
            got,
            want
        );
    }
    let _ = std::fs::remove_file(&path);
}

#[test]
fn dpx_16bit_display_roundtrip_is_quantization_exact() {
    let path = temp_path("logimage_e2e_16bit_display.dpx");
    let width = 3u32;
    let height = 3u32;
    let data: Vec<f32> = (0..(width * height * 4) as usize)
        .map(|i| (i as f32 * 0.031) % 1.0)
        .collect();

    let options = CreateOptions {
        width,
        height,
        bits_per_sample: 16,
        has_alpha: true,
        ..CreateOptions::default()
    };
    {
        let mut image = create(&path, &options).unwrap();
        image.write_rgba(&data, false).unwrap();
    }

    let mut image = open(&path).unwrap();
    let decoded = image.read_rgba(false).unwrap();
    for (i, (&got, &want)) in decoded.iter().zip(&data).enumerate() {
        assert!(
            (got - want).abs() <= 0.5 / 65535.0 + 1e-7,
            "sample {}: {} vs {}",
            i,
            got,
            want
        );
    }
    let _ = std::fs::remove_file(&path);
}

#[test]
fn dpx_8bit_quantization_bound() {
    let path = temp_path("logimage_e2e_8bit.dpx");
    let width = 5u32;
    let height = 4u32;
    let data: Vec<f32> = (0..(width * height * 4) as usize)
        .map(|i| ((i * 37) % 101) as f32 / 100.0)
        .collect();

    let options = CreateOptions {
        width,
        height,
        bits_per_sample: 8,
        ..CreateOptions::default()
    };
    {
        let mut image = create(&path, &options).unwrap();
        image.write_rgba(&data, false).unwrap();
    }

    let mut image = open(&path).unwrap();
    let decoded = image.read_rgba(false).unwrap();
    // RGB within half a code step; alpha synthesized as 1 for RGB files.
    for p in 0..(width * height) as usize {
        for c in 0..3 {
            let got = decoded[p * 4 + c];
            let want = data[p * 4 + c];
            assert!(
                (got - want).abs() <= 0.5 / 255.0 + 1e-6,
                "pixel {} channel {}: {} vs {}",
                p,
                c,
                got,
                want
            );
        }
        assert_eq!(decoded[p * 4 + 3], 1.0);
    }
    let _ = std::fs::remove_file(&path);
}

#[test]
fn dpx_10bit_code_roundtrip() {
    let path = temp_path("logimage_e2e_10bit.dpx");
    let width = 7u32;
    let height = 3u32;
    let data: Vec<f32> = (0..(width * height * 4) as usize)
        .map(|i| ((i * 89) % 1024) as f32 / 1023.0)
        .collect();

    let options = CreateOptions {
        width,
        height,
        bits_per_sample: 10,
        has_alpha: true,
        ..CreateOptions::default()
    };
    {
        let mut image = create(&path, &options).unwrap();
        image.write_rgba(&data, false).unwrap();
    }

    let mut image = open(&path).unwrap();
    let decoded = image.read_rgba(false).unwrap();
    assert_eq!(decoded, data);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn dpx_12bit_code_roundtrip() {
    let path = temp_path("logimage_e2e_12bit.dpx");
    let width = 4u32;
    let height = 2u32;
    let data: Vec<f32> = (0..(width * height * 4) as usize)
        .map(|i| ((i * 611) % 4096) as f32 / 4095.0)
        .collect();

    let options = CreateOptions {
        width,
        height,
        bits_per_sample: 12,
        has_alpha: true,
        ..CreateOptions::default()
    };
    {
        let mut image = create(&path, &options).unwrap();
        image.write_rgba(&data, false).unwrap();
    }

    let mut image = open(&path).unwrap();
    let decoded = image.read_rgba(false).unwrap();
    assert_eq!(decoded, data);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn dpx_printing_density_roundtrip() {
    let path = temp_path("logimage_e2e_logdpx.dpx");
    let width = 4u32;
    let height = 4u32;
    let data: Vec<f32> = (0..(width * height * 4) as usize)
        .map(|i| {
            if i % 4 == 3 {
                1.0
            } else {
                ((i * 13) % 97) as f32 / 96.0
            }
        })
        .collect();

    let options = CreateOptions {
        width,
        height,
        bits_per_sample: 10,
        logarithmic: true,
        has_alpha: true,
        ..CreateOptions::default()
    };
    {
        let mut image = create(&path, &options).unwrap();
        image.write_rgba(&data, false).unwrap();
    }

    let mut image = open(&path).unwrap();
    let element = &image.elements()[0];
    assert_eq!(element.transfer, logimage_io::Transfer::PrintingDensity);

    let decoded = image.read_rgba(false).unwrap();
    // One log-domain code step of slack.
    for (i, (&got, &want)) in decoded.iter().zip(&data).enumerate() {
        let tolerance = if i % 4 == 3 { 0.0 } else { 0.006 };
        assert!(
            (got - want).abs() <= tolerance,
            "sample {}: {} vs {}",
            i,
            got,
            want
        );
    }
    let _ = std::fs::remove_file(&path);
}

#[test]
fn cineon_file_roundtrip() {
    let path = temp_path("logimage_e2e_cineon.cin");
    let width = 6u32;
    let height = 2u32;
    let data: Vec<f32> = (0..(width * height * 4) as usize)
        .map(|i| {
            if i % 4 == 3 {
                1.0
            } else {
                ((i * 7) % 90) as f32 / 89.0
            }
        })
        .collect();

    let options = CreateOptions {
        format: SourceFormat::Cineon,
        width,
        height,
        bits_per_sample: 10,
        ..CreateOptions::default()
    };
    {
        let mut image = create(&path, &options).unwrap();
        image.write_rgba(&data, false).unwrap();
    }

    let mut image = open(&path).unwrap();
    assert_eq!(image.source_format(), SourceFormat::Cineon);
    let decoded = image.read_rgba(false).unwrap();
    for (i, (&got, &want)) in decoded.iter().zip(&data).enumerate() {
        let tolerance = if i % 4 == 3 { 0.0 } else { 0.006 };
        assert!(
            (got - want).abs() <= tolerance,
            "sample {}: {} vs {}",
            i,
            got,
            want
        );
    }
    let _ = std::fs::remove_file(&path);
}
