use log::debug;

use crate::identifier::{self, Identifier};

/// External image-to-code decoding capability.
///
/// `pixels` is tightly packed RGBA, `width * height * 4` bytes.
pub trait FrameDecoder {
    fn decode(&self, pixels: &[u8], width: u32, height: u32) -> Option<String>;
}

impl<F> FrameDecoder for F
where
    F: Fn(&[u8], u32, u32) -> Option<String>,
{
    fn decode(&self, pixels: &[u8], width: u32, height: u32) -> Option<String> {
        self(pixels, width, height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Symbology {
    /// EAN-13: exactly 13 digits.
    #[default]
    Ean13,
}

impl Symbology {
    pub fn accepts(self, payload: &str) -> bool {
        match self {
            Symbology::Ean13 => identifier::is_valid(payload),
        }
    }
}

/// Runs a [`FrameDecoder`] and keeps only payloads that are valid
/// identifiers for the target symbology.
pub struct DecodeAdapter {
    decoder: Box<dyn FrameDecoder>,
    symbology: Symbology,
}

impl DecodeAdapter {
    pub fn new(decoder: Box<dyn FrameDecoder>, symbology: Symbology) -> Self {
        Self { decoder, symbology }
    }

    pub fn decode(&self, pixels: &[u8], width: u32, height: u32) -> Option<Identifier> {
        let payload = self.decoder.decode(pixels, width, height)?;
        let payload = payload.trim();
        if !self.symbology.accepts(payload) {
            debug!("Ignoring payload {payload:?}: not a {:?} code", self.symbology);
            return None;
        }
        Identifier::parse(payload).ok()
    }
}
