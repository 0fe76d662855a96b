use crate::{error::SvReconError, utils::util::Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Copy)]
pub enum SvType {
    DELETION,
    DUPLICATION,
    INSERTION,
    INVERSION,
    BND,
    SGL,
    INF,
}

impl SvType {
    pub fn from_u8(bytes: &[u8]) -> Result<Self> {
        match bytes {
            b"DEL" => Ok(SvType::DELETION),
            b"DUP" => Ok(SvType::DUPLICATION),
            b"INS" => Ok(SvType::INSERTION),
            b"INV" => Ok(SvType::INVERSION),
            b"BND" => Ok(SvType::BND),
            b"SGL" => Ok(SvType::SGL),
            b"INF" => Ok(SvType::INF),
            _ => Err(SvReconError::InvalidSvtype {
                value: String::from_utf8_lossy(bytes).into_owned(),
            }),
        }
    }

    /// SGL and INF calls carry only their start breakend.
    pub fn is_single_breakend(self) -> bool {
        matches!(self, SvType::SGL | SvType::INF)
    }
}

impl std::str::FromStr for SvType {
    type Err = SvReconError;
    fn from_str(s: &str) -> Result<Self> {
        Self::from_u8(s.as_bytes())
    }
}

impl std::fmt::Display for SvType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SvType::DELETION => write!(f, "DEL"),
            SvType::DUPLICATION => write!(f, "DUP"),
            SvType::INSERTION => write!(f, "INS"),
            SvType::INVERSION => write!(f, "INV"),
            SvType::BND => write!(f, "BND"),
            SvType::SGL => write!(f, "SGL"),
            SvType::INF => write!(f, "INF"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_svtype() {
        assert_eq!("DEL".parse::<SvType>().unwrap(), SvType::DELETION);
        assert_eq!("INF".parse::<SvType>().unwrap(), SvType::INF);
        assert!(matches!(
            "CNV".parse::<SvType>(),
            Err(SvReconError::InvalidSvtype { .. })
        ));
    }

    #[test]
    fn test_svtype_display_matches_parse() {
        for svtype in [
            SvType::DELETION,
            SvType::DUPLICATION,
            SvType::INSERTION,
            SvType::INVERSION,
            SvType::BND,
            SvType::SGL,
            SvType::INF,
        ] {
            assert_eq!(svtype.to_string().parse::<SvType>().unwrap(), svtype);
        }
    }

    #[test]
    fn test_single_breakend_types() {
        assert!(SvType::SGL.is_single_breakend());
        assert!(SvType::INF.is_single_breakend());
        assert!(!SvType::BND.is_single_breakend());
    }
}
