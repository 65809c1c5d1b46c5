use core::fmt;
use core::num::ParseIntError;
use serde::de::{Deserialize, Deserializer, Visitor};

pub const PART_SIZE_FLAG: &str = "--part-size";
pub const CONNECTIONS_PER_VIP_FLAG: &str = "--connections-per-vip";

const KI_B: u64 = 1024;
const MI_B: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseSizeError {
    InvalidInteger { token: String, source: ParseIntError },
    Overflow { token: String },
}

impl fmt::Display for ParseSizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseSizeError::InvalidInteger { token, source } => {
                write!(f, "invalid part size {:?}: {}", token, source)
            }
            ParseSizeError::Overflow { token } => {
                write!(f, "part size {:?} does not fit in 64 bits", token)
            }
        }
    }
}

impl std::error::Error for ParseSizeError {}

/// A part size exactly as it was written on the command line.
///
/// The token is kept verbatim because it is what the results table shows.
/// Expansion to bytes only happens when a trial asks for it, see [`PartSize::bytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartSize {
    token: String,
}

impl PartSize {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    /// Expands `<n>M` to `n * 1MiB`, `<n>K` to `n * 1KiB` and anything else to `n` bytes.
    ///
    /// Only the upper-case suffixes are recognised and `n` must be a whole number.
    pub fn bytes(&self) -> Result<u64, ParseSizeError> {
        let (digits, multiplier) = if let Some(v) = self.token.strip_suffix('M') {
            (v, MI_B)
        } else if let Some(v) = self.token.strip_suffix('K') {
            (v, KI_B)
        } else {
            (self.token.as_str(), 1)
        };

        let value: u64 = digits
            .parse()
            .map_err(|source| ParseSizeError::InvalidInteger {
                token: self.token.clone(),
                source,
            })?;

        value
            .checked_mul(multiplier)
            .ok_or_else(|| ParseSizeError::Overflow {
                token: self.token.clone(),
            })
    }
}

impl fmt::Display for PartSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token)
    }
}

impl From<&str> for PartSize {
    fn from(value: &str) -> Self {
        PartSize::new(value)
    }
}

impl From<String> for PartSize {
    fn from(value: String) -> Self {
        PartSize::new(value)
    }
}

// Sweep files may spell a byte count as a bare JSON number.
impl<'de> Deserialize<'de> for PartSize {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct PartSizeVisitor;

        impl Visitor<'_> for PartSizeVisitor {
            type Value = PartSize;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a size token such as \"512K\" or a byte count")
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(PartSize::new(v))
            }

            fn visit_string<E>(self, v: String) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(PartSize::new(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(PartSize::new(v.to_string()))
            }
        }

        deserializer.deserialize_any(PartSizeVisitor)
    }
}

/// One point of the sweep grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trial {
    pub part_size_bytes: u64,
    pub connections_per_vip: u32,
}

impl Trial {
    pub fn new(part_size_bytes: u64, connections_per_vip: u32) -> Self {
        Self {
            part_size_bytes,
            connections_per_vip,
        }
    }

    /// The arguments appended to the command template, part size first.
    pub fn args(&self) -> [String; 4] {
        [
            PART_SIZE_FLAG.to_string(),
            self.part_size_bytes.to_string(),
            CONNECTIONS_PER_VIP_FLAG.to_string(),
            self.connections_per_vip.to_string(),
        ]
    }
}

/// Peak throughput of a trial in MiB/s.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Throughput(pub f64);

// Always render a fractional part so whole values read as `200.0`, not `200`.
// Exponents carry a sign and at least two digits: `1e+17`, `1.5e-05`.
impl fmt::Display for Throughput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = format!("{:?}", self.0);
        match repr.split_once('e') {
            Some((mantissa, exp)) => {
                let (sign, digits) = match exp.strip_prefix('-') {
                    Some(digits) => ('-', digits),
                    None => ('+', exp),
                };
                write!(f, "{}e{}{:0>2}", mantissa, sign, digits)
            }
            None => f.write_str(&repr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_kibibytes() {
        assert_eq!(PartSize::new("512K").bytes().unwrap(), 524_288);
        assert_eq!(PartSize::new("1K").bytes().unwrap(), 1024);
    }

    #[test]
    fn expands_mebibytes() {
        assert_eq!(PartSize::new("1M").bytes().unwrap(), 1_048_576);
        assert_eq!(PartSize::new("8M").bytes().unwrap(), 8 * 1_048_576);
    }

    #[test]
    fn plain_digits_are_bytes() {
        assert_eq!(PartSize::new("4096").bytes().unwrap(), 4096);
        assert_eq!(PartSize::new("0").bytes().unwrap(), 0);
    }

    #[test]
    fn rejects_unknown_suffixes_and_fractions() {
        for token in ["1G", "1k", "1.5M", "M", "", "-1K", "abc"] {
            let err = PartSize::new(token).bytes().unwrap_err();
            assert!(
                matches!(err, ParseSizeError::InvalidInteger { .. }),
                "{token:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn reports_overflow() {
        let token = format!("{}M", u64::MAX);
        let err = PartSize::new(token.as_str()).bytes().unwrap_err();
        assert_eq!(err, ParseSizeError::Overflow { token });
    }

    #[test]
    fn error_names_the_token() {
        let err = PartSize::new("12X").bytes().unwrap_err();
        assert!(err.to_string().contains("\"12X\""), "{err}");
    }

    #[test]
    fn display_keeps_the_original_token() {
        assert_eq!(PartSize::new("2M").to_string(), "2M");
    }

    #[test]
    fn trial_args_put_part_size_first() {
        let trial = Trial::new(524_288, 20);
        assert_eq!(
            trial.args(),
            [
                "--part-size".to_string(),
                "524288".to_string(),
                "--connections-per-vip".to_string(),
                "20".to_string(),
            ]
        );
    }

    #[test]
    fn throughput_renders_like_a_float() {
        assert_eq!(Throughput(200.0).to_string(), "200.0");
        assert_eq!(Throughput(123.45).to_string(), "123.45");
    }

    #[test]
    fn throughput_exponents_are_signed_and_padded() {
        assert_eq!(Throughput(1e17).to_string(), "1e+17");
        assert_eq!(Throughput(1.2345e20).to_string(), "1.2345e+20");
        assert_eq!(Throughput(1.5e-5).to_string(), "1.5e-05");
        assert_eq!(Throughput(1e100).to_string(), "1e+100");
        assert_eq!(Throughput(9999999999999998.0).to_string(), "9999999999999998.0");
    }

    #[test]
    fn deserializes_tokens_and_numbers() {
        let sizes: Vec<PartSize> = serde_json::from_str(r#"["512K", 4096]"#).unwrap();
        assert_eq!(sizes, vec![PartSize::new("512K"), PartSize::new("4096")]);
    }
}
