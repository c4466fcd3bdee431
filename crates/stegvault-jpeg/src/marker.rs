//! JPEG marker codes (ITU T.81 Table B.1).

/// The marker byte that follows `0xFF`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Marker {
    /// Start of frame, the parameter is the process number (SOF0 = baseline)
    Sof(u8),
    Dht,
    /// Arithmetic coding conditioning
    Dac,
    /// Restart marker 0..=7
    Rst(u8),
    Soi,
    Eoi,
    Sos,
    Dqt,
    Dnl,
    Dri,
    App(u8),
    Com,
    /// Anything else that carries a length field (JPG, DHP, EXP, JPGn, reserved)
    Other(u8),
    /// Temporary private use marker without a length field
    Tem,
}

impl Marker {
    /// Returns `None` for `0x00` (stuffing) and `0xFF` (fill).
    pub fn from_u8(byte: u8) -> Option<Marker> {
        Some(match byte {
            0x00 | 0xFF => return None,
            0x01 => Marker::Tem,
            0xC4 => Marker::Dht,
            0xCC => Marker::Dac,
            0xC0..=0xCF if byte != 0xC8 => Marker::Sof(byte - 0xC0),
            0xD0..=0xD7 => Marker::Rst(byte - 0xD0),
            0xD8 => Marker::Soi,
            0xD9 => Marker::Eoi,
            0xDA => Marker::Sos,
            0xDB => Marker::Dqt,
            0xDC => Marker::Dnl,
            0xDD => Marker::Dri,
            0xE0..=0xEF => Marker::App(byte - 0xE0),
            0xFE => Marker::Com,
            other => Marker::Other(other),
        })
    }

    pub fn to_u8(self) -> u8 {
        match self {
            Marker::Sof(n) => 0xC0 + n,
            Marker::Dht => 0xC4,
            Marker::Dac => 0xCC,
            Marker::Rst(n) => 0xD0 + n,
            Marker::Soi => 0xD8,
            Marker::Eoi => 0xD9,
            Marker::Sos => 0xDA,
            Marker::Dqt => 0xDB,
            Marker::Dnl => 0xDC,
            Marker::Dri => 0xDD,
            Marker::App(n) => 0xE0 + n,
            Marker::Com => 0xFE,
            Marker::Other(byte) => byte,
            Marker::Tem => 0x01,
        }
    }

    /// Whether a two byte length field follows the marker.
    pub fn has_length(self) -> bool {
        !matches!(
            self,
            Marker::Rst(..) | Marker::Soi | Marker::Eoi | Marker::Tem
        )
    }
}
