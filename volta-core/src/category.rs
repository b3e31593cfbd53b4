use serde::{Deserialize, Serialize};

/// Storefront categories. Each storefront sells bundles for exactly one
/// mobile network, so the category determines the network an adapter
/// should target.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ServiceCategory {
    Fastnet,
    Airshare,
    Teledata,
}

impl ServiceCategory {
    pub const ALL: [ServiceCategory; 3] = [
        ServiceCategory::Fastnet,
        ServiceCategory::Airshare,
        ServiceCategory::Teledata,
    ];

    pub fn network(&self) -> Network {
        match self {
            ServiceCategory::Fastnet => Network::Mtn,
            ServiceCategory::Airshare => Network::At,
            ServiceCategory::Teledata => Network::Telecel,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCategory::Fastnet => "fastnet",
            ServiceCategory::Airshare => "airshare",
            ServiceCategory::Teledata => "teledata",
        }
    }
}

impl std::fmt::Display for ServiceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ServiceCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fastnet" => Ok(ServiceCategory::Fastnet),
            "airshare" => Ok(ServiceCategory::Airshare),
            "teledata" => Ok(ServiceCategory::Teledata),
            _ => Err(UnknownCategory(s.to_string())),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown service category: {0}")]
pub struct UnknownCategory(pub String);

/// Mobile networks a bundle can be delivered on. Suppliers that need an
/// explicit network in their payload use the upper-case wire form.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Network {
    Mtn,
    At,
    Telecel,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Mtn => "MTN",
            Network::At => "AT",
            Network::Telecel => "TELECEL",
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
