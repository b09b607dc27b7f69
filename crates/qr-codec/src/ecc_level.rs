use crate::error::QrError;

/// The error correction level in a QR Code symbol.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum EccLevel {
    /// Tolerates about  7% erroneous codewords.
    Low,
    /// Tolerates about 15% erroneous codewords.
    Medium,
    /// Tolerates about 25% erroneous codewords.
    Quartile,
    /// Tolerates about 30% erroneous codewords.
    High,
}

impl EccLevel {
    pub const ALL: [EccLevel; 4] = [
        EccLevel::Low,
        EccLevel::Medium,
        EccLevel::Quartile,
        EccLevel::High,
    ];

    // Row index into the capacity tables.
    pub fn ordinal(self) -> usize {
        use EccLevel::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    // The 2-bit code carried in the format information.
    pub fn format_bits(self) -> u8 {
        use EccLevel::*;
        match self {
            Low => 1,
            Medium => 0,
            Quartile => 3,
            High => 2,
        }
    }

    /// Recovers a level from its 2-bit format code.
    pub fn from_format_bits(bits: u8) -> Result<Self, QrError> {
        use EccLevel::*;
        match bits {
            0 => Ok(Medium),
            1 => Ok(Low),
            2 => Ok(High),
            3 => Ok(Quartile),
            _ => Err(QrError::InvalidEcc(bits)),
        }
    }
}

impl Default for EccLevel {
    fn default() -> Self {
        EccLevel::Medium
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bits_round_trip() {
        for level in EccLevel::ALL {
            assert_eq!(EccLevel::from_format_bits(level.format_bits()).unwrap(), level);
        }
        assert!(EccLevel::from_format_bits(4).is_err());
    }
}
