// Copyright (c) the JPEG XL Project Authors. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use num_derive::FromPrimitive;
use num_traits::FromPrimitive;

/// Marker codes this codec reads or writes, as the byte after `0xFF`.
#[derive(Copy, Clone, PartialEq, Eq, Debug, FromPrimitive)]
#[repr(u8)]
pub enum Marker {
    Sof0 = 0xc0,
    Dht = 0xc4,
    Jpg = 0xc8,
    Soi = 0xd8,
    Eoi = 0xd9,
    Sos = 0xda,
    Dqt = 0xdb,
    Dnl = 0xdc,
    Dri = 0xdd,
    Dhp = 0xde,
    Exp = 0xdf,
    App0 = 0xe0,
    Com = 0xfe,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MarkerKind {
    Known(Marker),
    /// SOF1..SOF15 other than DHT and JPG, and DAC: non-baseline coding.
    UnsupportedFrame(u8),
    /// RST0..RST7, carrying the index.
    Restart(u8),
    /// APP1..APP15, carrying the index.
    App(u8),
    /// Reserved or otherwise unassigned codes, skipped as opaque segments.
    Other(u8),
}

impl MarkerKind {
    pub fn classify(code: u8) -> MarkerKind {
        if let Some(marker) = Marker::from_u8(code) {
            return MarkerKind::Known(marker);
        }
        match code {
            0xc1..=0xcf => MarkerKind::UnsupportedFrame(code),
            0xd0..=0xd7 => MarkerKind::Restart(code - 0xd0),
            0xe1..=0xef => MarkerKind::App(code - 0xe0),
            _ => MarkerKind::Other(code),
        }
    }
}

/// Whether the marker stands alone, without a length-prefixed payload.
pub fn is_standalone(code: u8) -> bool {
    matches!(code, 0x01 | 0xd0..=0xd9)
}

#[cfg(test)]
mod test {
    use super::*;
    use test_log::test;

    #[test]
    fn classifies_codes() {
        assert_eq!(MarkerKind::classify(0xc0), MarkerKind::Known(Marker::Sof0));
        assert_eq!(MarkerKind::classify(0xc4), MarkerKind::Known(Marker::Dht));
        assert_eq!(MarkerKind::classify(0xc8), MarkerKind::Known(Marker::Jpg));
        assert_eq!(MarkerKind::classify(0xc2), MarkerKind::UnsupportedFrame(0xc2));
        assert_eq!(MarkerKind::classify(0xcc), MarkerKind::UnsupportedFrame(0xcc));
        assert_eq!(MarkerKind::classify(0xd3), MarkerKind::Restart(3));
        assert_eq!(MarkerKind::classify(0xe1), MarkerKind::App(1));
        assert_eq!(MarkerKind::classify(0xfe), MarkerKind::Known(Marker::Com));
        assert_eq!(MarkerKind::classify(0xf0), MarkerKind::Other(0xf0));
    }

    #[test]
    fn standalone_markers() {
        assert!(is_standalone(Marker::Soi as u8));
        assert!(is_standalone(0xd5));
        assert!(!is_standalone(Marker::Sos as u8));
        assert!(!is_standalone(Marker::App0 as u8));
    }
}
