//! Bid announcement records and the metadata persisted beside each vector

use serde::{Deserialize, Deserializer, Serialize};

/// Separator between title and organization in a derived document
pub const DOCUMENT_SEPARATOR: &str = " | ";

/// One procurement bid announcement as collected from the public API
///
/// Field names follow the upstream API. Anything else the collector kept is
/// ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "bidNtceNm", default, deserialize_with = "lenient_text")]
    pub title: String,

    #[serde(rename = "dminsttNm", default, deserialize_with = "lenient_text")]
    pub organization: String,

    #[serde(rename = "sucsfbidAmt", default, deserialize_with = "lenient_amount")]
    pub awarded_amount: Option<u64>,

    #[serde(rename = "sucsfbidRate", default, deserialize_with = "lenient_text")]
    pub awarded_rate: String,

    #[serde(rename = "bidNtceNo", default, deserialize_with = "lenient_text")]
    pub notice_number: String,

    #[serde(rename = "rlOpengDt", default, deserialize_with = "lenient_text")]
    pub opening_date: String,
}

impl Record {
    /// Text used for embedding: the non-empty parts of title and organization
    ///
    /// An empty result means the record is left out of the index.
    pub fn document(&self) -> String {
        [self.title.as_str(), self.organization.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR)
    }

    /// Metadata copied into the index entry
    pub fn metadata(&self) -> BidMetadata {
        BidMetadata {
            title: self.title.clone(),
            organization: self.organization.clone(),
            awarded_amount: self.awarded_amount.unwrap_or(0).to_string(),
            awarded_rate: self.awarded_rate.clone(),
            notice_number: self.notice_number.clone(),
            opening_date: self.opening_date.clone(),
        }
    }
}

/// Metadata stored with every index entry
///
/// All values are strings; the awarded amount is a string-encoded integer
/// defaulting to `"0"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidMetadata {
    #[serde(rename = "bidNtceNm", default)]
    pub title: String,

    #[serde(rename = "dminsttNm", default)]
    pub organization: String,

    #[serde(rename = "sucsfbidAmt", default = "zero_amount")]
    pub awarded_amount: String,

    #[serde(rename = "sucsfbidRate", default)]
    pub awarded_rate: String,

    #[serde(rename = "bidNtceNo", default)]
    pub notice_number: String,

    #[serde(rename = "rlOpengDt", default)]
    pub opening_date: String,
}

impl BidMetadata {
    /// Payload keys, in the order they are written
    pub const FIELDS: [&'static str; 6] = [
        "bidNtceNm",
        "dminsttNm",
        "sucsfbidAmt",
        "sucsfbidRate",
        "bidNtceNo",
        "rlOpengDt",
    ];

    /// Awarded amount as an integer; unparsable or missing values count as 0
    pub fn amount(&self) -> u64 {
        parse_amount(&self.awarded_amount).unwrap_or(0)
    }

    /// Key/value pairs in `FIELDS` order
    pub fn fields(&self) -> [(&'static str, &str); 6] {
        [
            ("bidNtceNm", self.title.as_str()),
            ("dminsttNm", self.organization.as_str()),
            ("sucsfbidAmt", self.awarded_amount.as_str()),
            ("sucsfbidRate", self.awarded_rate.as_str()),
            ("bidNtceNo", self.notice_number.as_str()),
            ("rlOpengDt", self.opening_date.as_str()),
        ]
    }

    /// Rebuild metadata from a key lookup; missing keys take their defaults
    pub fn from_lookup<'a, F>(mut get: F) -> Self
    where
        F: FnMut(&str) -> Option<&'a str>,
    {
        let mut text = |key: &str| get(key).unwrap_or_default().to_string();
        let title = text("bidNtceNm");
        let organization = text("dminsttNm");
        let awarded_amount = match text("sucsfbidAmt") {
            amount if amount.is_empty() => zero_amount(),
            amount => amount,
        };

        Self {
            title,
            organization,
            awarded_amount,
            awarded_rate: text("sucsfbidRate"),
            notice_number: text("bidNtceNo"),
            opening_date: text("rlOpengDt"),
        }
    }
}

impl Default for BidMetadata {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}

fn zero_amount() -> String {
    "0".to_string()
}

/// Values the upstream API has been seen to send for a single field
#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Unsigned(u64),
    Float(f64),
    Text(String),
    Flag(bool),
}

fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None => String::new(),
        Some(Scalar::Unsigned(n)) => n.to_string(),
        Some(Scalar::Float(f)) => f.to_string(),
        Some(Scalar::Text(s)) => s,
        Some(Scalar::Flag(b)) => b.to_string(),
    })
}

fn lenient_amount<'de, D>(deserializer: D) -> std::result::Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        None | Some(Scalar::Flag(_)) => None,
        Some(Scalar::Unsigned(n)) => Some(n),
        Some(Scalar::Float(f)) => float_amount(f),
        Some(Scalar::Text(s)) => parse_amount(&s),
    })
}

/// Parse amounts such as `"1234"`, `"1,234"` or `"1234.0"`
fn parse_amount(raw: &str) -> Option<u64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned
        .parse::<u64>()
        .ok()
        .or_else(|| cleaned.parse::<f64>().ok().and_then(float_amount))
}

fn float_amount(value: f64) -> Option<u64> {
    (value.is_finite() && value >= 0.0).then(|| value.floor() as u64)
}
