use volta_core::supplier::SupplierError;

/// A catalog data amount resolved to megabytes. Suppliers disagree on
/// units (GB labels vs MB volumes), so adapters convert from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataAmount {
    megabytes: u64,
}

impl DataAmount {
    /// Parse a catalog amount string such as "5GB", "1.5gb" or "500MB".
    pub fn parse(raw: &str) -> Result<Self, SupplierError> {
        let normalized = raw.trim().to_ascii_uppercase();

        let (number, scale) = if let Some(n) = normalized.strip_suffix("GB") {
            (n.trim(), 1000.0)
        } else if let Some(n) = normalized.strip_suffix("MB") {
            (n.trim(), 1.0)
        } else {
            return Err(SupplierError::UnsupportedFormat(raw.to_string()));
        };

        let value: f64 = number
            .parse()
            .map_err(|_| SupplierError::UnsupportedFormat(raw.to_string()))?;
        if !value.is_finite() || value <= 0.0 {
            return Err(SupplierError::UnsupportedFormat(raw.to_string()));
        }

        Ok(Self {
            megabytes: (value * scale).round() as u64,
        })
    }

    pub fn megabytes(&self) -> u64 {
        self.megabytes
    }

    /// GB label in the form suppliers with GB-denominated APIs expect:
    /// "5GB" becomes "5", "1.5GB" becomes "1.5".
    pub fn gigabytes_label(&self) -> String {
        if self.megabytes % 1000 == 0 {
            (self.megabytes / 1000).to_string()
        } else {
            format!("{}", self.megabytes as f64 / 1000.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_gb_amounts() {
        let amount = DataAmount::parse("5GB").unwrap();
        assert_eq!(amount.megabytes(), 5000);
        assert_eq!(amount.gigabytes_label(), "5");
    }

    #[test]
    fn parses_fractional_and_mb_amounts() {
        assert_eq!(DataAmount::parse("1.5GB").unwrap().megabytes(), 1500);
        assert_eq!(DataAmount::parse("1.5GB").unwrap().gigabytes_label(), "1.5");
        assert_eq!(DataAmount::parse("500MB").unwrap().megabytes(), 500);
    }

    #[test]
    fn is_case_and_whitespace_tolerant() {
        assert_eq!(DataAmount::parse(" 10gb ").unwrap().megabytes(), 10_000);
    }

    #[test]
    fn rejects_garbage() {
        for raw in ["", "GB", "fiveGB", "5TB", "-2GB", "0GB"] {
            assert!(
                matches!(
                    DataAmount::parse(raw),
                    Err(SupplierError::UnsupportedFormat(_))
                ),
                "{raw:?} should be rejected"
            );
        }
    }
}
