//! Four-character format codes and the sample formats they map to

use crate::Error;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;
use std::str::FromStr;

/// A four-character code identifying a PCM encoding or a pixel layout.
///
/// Codes shorter than four characters are space padded (`"S8  "`), which
/// matches how the native engine spells them.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub struct FourCc([u8; 4]);

impl FourCc {
    // Audio sample encodings
    pub const S8: FourCc = FourCc(*b"S8  ");
    pub const U8: FourCc = FourCc(*b"U8  ");
    pub const S16N: FourCc = FourCc(*b"S16N");
    pub const S32N: FourCc = FourCc(*b"S32N");
    pub const FL32: FourCc = FourCc(*b"FL32");
    pub const FL64: FourCc = FourCc(*b"FL64");

    // Packed pixel layouts
    pub const AYUV: FourCc = FourCc(*b"AYUV");
    pub const RV32: FourCc = FourCc(*b"RV32");
    pub const UYVY: FourCc = FourCc(*b"UYVY");
    pub const Y422: FourCc = FourCc(*b"Y422");
    pub const UYNV: FourCc = FourCc(*b"UYNV");
    pub const HDYC: FourCc = FourCc(*b"HDYC");
    pub const YUY2: FourCc = FourCc(*b"YUY2");
    pub const V422: FourCc = FourCc(*b"V422");
    pub const YUYV: FourCc = FourCc(*b"YUYV");
    pub const YVYU: FourCc = FourCc(*b"YVYU");

    /// Creates a code from its raw bytes
    pub const fn new(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    /// Reads a code from the first four bytes of a native buffer.
    ///
    /// Returns `None` if fewer than four bytes are available.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let head: [u8; 4] = bytes.get(..4)?.try_into().ok()?;
        Some(Self(head))
    }

    /// Returns the raw bytes of the code
    pub fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Numeric form used by the native engine (`vlc_fourcc_t`, little-endian)
    pub fn to_u32(self) -> u32 {
        LittleEndian::read_u32(&self.0)
    }

    /// Builds a code from its numeric native form
    pub fn from_u32(value: u32) -> Self {
        let mut bytes = [0u8; 4];
        LittleEndian::write_u32(&mut bytes, value);
        Self(bytes)
    }

    /// Case-insensitive comparison, as the native engine compares chroma names
    pub fn eq_ignore_ascii_case(&self, other: &FourCc) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }

    /// Returns true if this code matches any of `codes`, ignoring case
    pub fn is_any_of(&self, codes: &[FourCc]) -> bool {
        codes.iter().any(|code| self.eq_ignore_ascii_case(code))
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &byte in &self.0 {
            let c = if byte.is_ascii_graphic() || byte == b' ' {
                byte as char
            } else {
                '?'
            };
            write!(f, "{c}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FourCc(\"{self}\")")
    }
}

impl FromStr for FourCc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.is_empty() || bytes.len() > 4 || !s.is_ascii() {
            return Err(Error::InvalidFourCc(s.to_string()));
        }

        let mut code = *b"    ";
        code[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(code))
    }
}

impl TryFrom<String> for FourCc {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FourCc> for String {
    fn from(code: FourCc) -> Self {
        code.to_string().trim_end().to_string()
    }
}

/// PCM sample encodings delivered in audio samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AudioSampleFormat {
    Int8,
    Int16,
    Int32,
    Float,
    Double,
}

impl AudioSampleFormat {
    /// Size of a single sample of one channel in bytes
    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::Int8 => 1,
            Self::Int16 => 2,
            Self::Int32 | Self::Float => 4,
            Self::Double => 8,
        }
    }

    /// The native code for this encoding
    pub fn fourcc(self) -> FourCc {
        match self {
            Self::Int8 => FourCc::S8,
            Self::Int16 => FourCc::S16N,
            Self::Int32 => FourCc::S32N,
            Self::Float => FourCc::FL32,
            Self::Double => FourCc::FL64,
        }
    }
}

/// Pixel layouts delivered in texture samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TextureSampleFormat {
    /// Packed AYUV, 4 bytes per pixel
    CharAyuv,
    /// Packed BGRA, 4 bytes per pixel
    CharBgra,
    /// Packed UYVY, 2 bytes per pixel
    CharUyvy,
    /// Packed YUY2, 2 bytes per pixel
    CharYuy2,
    /// Packed YVYU, 2 bytes per pixel
    CharYvyu,
}

impl TextureSampleFormat {
    /// Average number of bytes per pixel in the packed layout
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::CharAyuv | Self::CharBgra => 4,
            Self::CharUyvy | Self::CharYuy2 | Self::CharYvyu => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourcc_parse_pads_short_codes() {
        let code: FourCc = "S8".parse().unwrap();
        assert_eq!(code, FourCc::S8);
        assert_eq!(code.as_bytes(), b"S8  ");
        assert_eq!(String::from(code), "S8");
    }

    #[test]
    fn test_fourcc_rejects_invalid_input() {
        assert!("".parse::<FourCc>().is_err());
        assert!("TOOLONG".parse::<FourCc>().is_err());
        assert!("é".parse::<FourCc>().is_err());
    }

    #[test]
    fn test_fourcc_native_numeric_form() {
        // "RGBA" as the native engine stores it
        assert_eq!(FourCc::new(*b"RGBA").to_u32(), 0x4142_4752);
        assert_eq!(FourCc::from_u32(0x4142_4752), FourCc::new(*b"RGBA"));
    }

    #[test]
    fn test_fourcc_case_insensitive_match() {
        let code = FourCc::new(*b"yuy2");
        assert!(code.eq_ignore_ascii_case(&FourCc::YUY2));
        assert!(code.is_any_of(&[FourCc::UYVY, FourCc::YUY2]));
        assert!(!code.is_any_of(&[FourCc::RV32]));
    }

    #[test]
    fn test_fourcc_from_short_buffer() {
        assert_eq!(FourCc::from_bytes(b"RV32\0"), Some(FourCc::RV32));
        assert_eq!(FourCc::from_bytes(b"RV"), None);
    }

    #[test]
    fn test_audio_sample_sizes() {
        assert_eq!(AudioSampleFormat::Int8.bytes_per_sample(), 1);
        assert_eq!(AudioSampleFormat::Int16.bytes_per_sample(), 2);
        assert_eq!(AudioSampleFormat::Float.bytes_per_sample(), 4);
        assert_eq!(AudioSampleFormat::Double.bytes_per_sample(), 8);
        assert_eq!(AudioSampleFormat::Int16.fourcc(), FourCc::S16N);
    }
}
