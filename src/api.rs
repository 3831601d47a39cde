// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

mod options;
mod output;

pub use options::*;
pub use output::*;

use crate::decode::Decoder;
use crate::encode::encode_image;
use crate::error::Result;
use crate::quantizer::QuantizationTable;
use crate::util::tracing_wrappers::*;

/// Encodes `width * height` interleaved RGB pixels as a baseline JFIF stream,
/// quantizing every component with `table`.
pub fn encode(pixels: &[u8], width: usize, height: usize, table: &QuantizationTable) -> Result<Vec<u8>> {
    let options = EncoderOptions {
        luma_table: *table,
        ..Default::default()
    };
    encode_with_options(pixels, width, height, &options)
}

#[instrument(skip(pixels, options), err)]
pub fn encode_with_options(
    pixels: &[u8],
    width: usize,
    height: usize,
    options: &EncoderOptions,
) -> Result<Vec<u8>> {
    encode_image(pixels, width, height, options)
}

/// Decodes a baseline JFIF stream to interleaved RGB.
pub fn decode(data: &[u8]) -> Result<DecodedImage> {
    decode_with_options(data, &DecoderOptions::default())
}

#[instrument(skip_all, fields(len = data.len()), err)]
pub fn decode_with_options(data: &[u8], options: &DecoderOptions) -> Result<DecodedImage> {
    Decoder::new(data, options.clone()).decode()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::{Error, Malformed, Unsupported};
    use crate::headers::DensityUnits;
    use crate::util::test::{assert_all_almost_eq, gradient_rgb};
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use test_log::test;

    fn reference_decode(data: &[u8]) -> (Vec<u8>, usize, usize) {
        let mut decoder = jpeg_decoder::Decoder::new(data);
        let pixels = decoder.decode().unwrap();
        let info = decoder.info().unwrap();
        assert_eq!(info.pixel_format, jpeg_decoder::PixelFormat::RGB24);
        (pixels, info.width as usize, info.height as usize)
    }

    #[test]
    fn white_block_with_any_table() -> Result<()> {
        let white = vec![255u8; 8 * 8 * 3];
        for table in [
            QuantizationTable::DEFAULT,
            QuantizationTable::UNIT,
            QuantizationTable::luminance(10),
        ] {
            let data = encode(&white, 8, 8, &table)?;
            let (pixels, width, height) = reference_decode(&data);
            assert_eq!((width, height), (8, 8));
            assert!(pixels.iter().all(|&p| p == 255));
            let image = decode(&data)?;
            assert!(image.pixels.iter().all(|&p| p == 255));
        }
        Ok(())
    }

    #[test]
    fn gradient_round_trip() -> Result<()> {
        let pixels = gradient_rgb(16, 16);
        let data = encode(&pixels, 16, 16, &QuantizationTable::UNIT)?;
        let image = decode(&data)?;
        assert_eq!((image.width, image.height, image.components), (16, 16, 3));
        assert_all_almost_eq!(image.pixels, pixels, 3);
        Ok(())
    }

    #[test]
    fn agrees_with_reference_decoder() -> Result<()> {
        let (width, height) = (37, 21);
        let pixels = gradient_rgb(width, height);
        for subsampling in [
            ChromaSubsampling::Yuv444,
            ChromaSubsampling::Yuv422,
            ChromaSubsampling::Yuv420,
        ] {
            let options = EncoderOptions {
                subsampling,
                ..EncoderOptions::with_quality(90)
            };
            let data = encode_with_options(&pixels, width, height, &options)?;
            let (reference, ref_width, ref_height) = reference_decode(&data);
            assert_eq!((ref_width, ref_height), (width, height));
            assert_all_almost_eq!(reference, pixels, 24);
            let ours = decode(&data)?;
            assert_all_almost_eq!(ours.pixels, pixels, 24);
            if subsampling == ChromaSubsampling::Yuv444 {
                // Without upsampling, only the color conversion rounding differs.
                assert_all_almost_eq!(ours.pixels, reference, 5);
            }
        }
        Ok(())
    }

    #[test]
    fn subsampled_round_trip_of_flat_regions() -> Result<()> {
        // Four flat quadrants keep the error away from the block edges.
        let (width, height) = (32, 32);
        let colors = [[200, 30, 40], [20, 180, 60], [50, 60, 220], [240, 240, 10]];
        let mut pixels = Vec::with_capacity(width * height * 3);
        for y in 0..height {
            for x in 0..width {
                pixels.extend(colors[(y / 16) * 2 + x / 16]);
            }
        }
        for upsampling in [Upsampling::Bilinear, Upsampling::NearestNeighbor] {
            let options = EncoderOptions {
                luma_table: QuantizationTable::UNIT,
                subsampling: ChromaSubsampling::Yuv420,
                ..Default::default()
            };
            let data = encode_with_options(&pixels, width, height, &options)?;
            let image = decode_with_options(&data, &DecoderOptions { upsampling })?;
            assert_all_almost_eq!(image.pixels, pixels, 3);
        }
        Ok(())
    }

    #[test]
    fn random_image_within_tolerance() -> Result<()> {
        let mut rng = XorShiftRng::seed_from_u64(0);
        let (width, height) = (13, 11);
        let pixels: Vec<u8> = (0..width * height * 3).map(|_| rng.random()).collect();
        let data = encode(&pixels, width, height, &QuantizationTable::UNIT)?;
        let image = decode(&data)?;
        assert_all_almost_eq!(image.pixels, pixels, 4);
        let (reference, _, _) = reference_decode(&data);
        assert_all_almost_eq!(image.pixels, reference, 5);
        Ok(())
    }

    #[test]
    fn metadata_round_trip() -> Result<()> {
        let options = EncoderOptions {
            density: Density {
                units: DensityUnits::PerInch,
                x: 300,
                y: 300,
            },
            comment: Some("calibration target".into()),
            ..Default::default()
        };
        let data = encode_with_options(&[90; 4 * 4 * 3], 4, 4, &options)?;
        let image = decode(&data)?;
        let jfif = image.jfif.as_ref().unwrap();
        assert_eq!((jfif.units, jfif.x_density, jfif.y_density), (DensityUnits::PerInch, 300, 300));
        assert_eq!(jfif.version, (1, 2));
        assert_eq!(image.comments.len(), 1);
        assert_eq!(image.comments[0].as_text(), "calibration target");
        assert_eq!(image.restart_interval, None);
        assert_eq!(image.pixel(3, 3), [90, 90, 90]);
        Ok(())
    }

    /// Inserts a segment right after SOI.
    fn with_segment(data: &[u8], segment: &[u8]) -> Vec<u8> {
        let mut out = data[..2].to_vec();
        out.extend_from_slice(segment);
        out.extend_from_slice(&data[2..]);
        out
    }

    #[test]
    fn restart_interval_is_tolerated_without_markers() -> Result<()> {
        let data = encode(&[10; 8 * 8 * 3], 8, 8, &QuantizationTable::DEFAULT)?;
        let data = with_segment(&data, &[0xff, 0xdd, 0, 4, 0, 1]);
        assert_eq!(decode(&data)?.restart_interval, Some(1));
        Ok(())
    }

    #[test]
    fn second_frame_is_unsupported() -> Result<()> {
        let data = encode(&[10; 8 * 8 * 3], 8, 8, &QuantizationTable::DEFAULT)?;
        let sof = [0xff, 0xc0, 0, 11, 8, 0, 8, 0, 8, 1, 1, 0x11, 0];
        let data = with_segment(&data, &sof);
        assert_eq!(
            decode(&data).unwrap_err(),
            Error::Unsupported(Unsupported::MultipleFrames)
        );
        Ok(())
    }

    #[test]
    fn progressive_frame_is_unsupported() -> Result<()> {
        let data = encode(&[10; 8 * 8 * 3], 8, 8, &QuantizationTable::DEFAULT)?;
        let sof0 = data.windows(2).position(|w| w == [0xff, 0xc0]).unwrap();
        let mut data = data;
        data[sof0 + 1] = 0xc2;
        assert_eq!(
            decode(&data).unwrap_err(),
            Error::Unsupported(Unsupported::FrameType(2))
        );
        Ok(())
    }

    #[test]
    fn second_scan_is_unsupported() -> Result<()> {
        let data = encode(&[10; 8 * 8 * 3], 8, 8, &QuantizationTable::DEFAULT)?;
        let sos = data.windows(2).position(|w| w == [0xff, 0xda]).unwrap();
        let mut doubled = data[..data.len() - 2].to_vec();
        doubled.extend_from_slice(&data[sos..]);
        assert_eq!(
            decode(&doubled).unwrap_err(),
            Error::Unsupported(Unsupported::MultipleScans)
        );
        Ok(())
    }

    #[test]
    fn truncated_stream() -> Result<()> {
        let data = encode(&gradient_rgb(16, 16), 16, 16, &QuantizationTable::UNIT)?;
        let sos = data.windows(2).position(|w| w == [0xff, 0xda]).unwrap();
        let err = decode(&data[..sos + 20]).unwrap_err();
        let Error::Malformed(Malformed::Block {
            mcu,
            component,
            source,
            ..
        }) = &err
        else {
            panic!("{err:?}");
        };
        assert!(*mcu < 4, "{err:?}");
        assert!((1..=3).contains(component), "{err:?}");
        assert!(
            matches!(**source, Error::Malformed(Malformed::OutOfBits { .. })),
            "{err:?}"
        );
        let err = decode(&data[..sos - 3]).unwrap_err();
        assert!(
            matches!(err, Error::Malformed(Malformed::Truncated { .. })),
            "{err:?}"
        );
        Ok(())
    }

    /// A one-component stream with a flat quantization table and one-symbol
    /// DC and AC tables, so every block codes as its DC symbol then EOB.
    fn grayscale_stream(
        width: u8,
        height: u8,
        quant: u8,
        dc_symbol: u8,
        entropy: &[u8],
    ) -> Vec<u8> {
        let mut data = vec![0xff, 0xd8];
        data.extend([0xff, 0xdb, 0, 67, 0x00]);
        data.extend([quant; 64]);
        data.extend([0xff, 0xc0, 0, 11, 8, 0, height, 0, width, 1, 1, 0x11, 0]);
        let mut dht = vec![0xff, 0xc4, 0, 2 + 2 * 18];
        for (class, symbol) in [(0x00, dc_symbol), (0x10, 0)] {
            dht.push(class);
            dht.push(1);
            dht.extend([0u8; 15]);
            dht.push(symbol);
        }
        data.extend(dht);
        data.extend([0xff, 0xda, 0, 8, 1, 1, 0x00, 0, 63, 0]);
        data.extend(entropy);
        data.extend([0xff, 0xd9]);
        data
    }

    #[test]
    fn grayscale_frames_replicate_luma() -> Result<()> {
        // DC category 0, then end of block: bits "0" "0", padded with ones.
        let data = grayscale_stream(3, 2, 1, 0, &[0b0011_1111]);
        let image = decode(&data)?;
        assert_eq!((image.width, image.height, image.components), (3, 2, 1));
        assert_eq!(image.pixels, vec![128; 3 * 2 * 3]);
        Ok(())
    }

    #[test]
    fn runaway_dc_predictor_is_malformed() {
        // Two blocks, each coding a DC difference of +2047 then EOB. The
        // second pushes the DC past anything 8-bit samples can produce.
        let data = grayscale_stream(16, 8, 255, 11, &[0x7f, 0xf3, 0xff, 0x00, 0xbf]);
        assert_eq!(
            decode(&data).unwrap_err(),
            Error::Malformed(Malformed::Block {
                mcu: 1,
                component: 1,
                block: 0,
                source: Box::new(Error::Malformed(Malformed::DcOutOfRange(4094))),
            })
        );
    }
}
