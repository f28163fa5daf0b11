use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const UNKNOWN_CUSTOMER: &str = "Unknown Customer";
pub const PARTICULARS_LIMIT: usize = 100;

/// Payment-system tag of a statement line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    Upi,
    Transfer,
    Cash,
    Neft,
    Rtgs,
    Other,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Upi => "UPI",
            Self::Transfer => "TRANSFER",
            Self::Cash => "CASH",
            Self::Neft => "NEFT",
            Self::Rtgs => "RTGS",
            Self::Other => "OTHER",
        }
    }

    /// Keyword scan over free text; first hit wins.
    pub fn from_particulars(text: &str) -> Self {
        let upper = text.to_uppercase();
        if upper.contains("UPI") {
            Self::Upi
        } else if upper.contains("TRANSFER") {
            Self::Transfer
        } else if upper.contains("NEFT") {
            Self::Neft
        } else if upper.contains("RTGS") {
            Self::Rtgs
        } else if upper.contains("CASH") || upper.contains("ATM") {
            Self::Cash
        } else {
            Self::Other
        }
    }

    /// Exact tag lookup, used for spreadsheet "type" columns.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_uppercase().as_str() {
            "UPI" => Some(Self::Upi),
            "TRANSFER" => Some(Self::Transfer),
            "CASH" => Some(Self::Cash),
            "NEFT" => Some(Self::Neft),
            "RTGS" => Some(Self::Rtgs),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }
}

/// How much of a record was actually read from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Parsed,
    /// The row parsed but its date was replaced by today.
    DateDefaulted,
    /// Placeholder row emitted because nothing in the document parsed.
    Sample,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Income,
    Expense,
}

/// One statement line, ready for the ledger. Carries no id; the sink assigns identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    pub particulars: String,
    pub depositor: String,
    pub withdrawals: f64,
    pub deposits: f64,
    pub balance: Option<f64>,
    #[serde(rename = "type")]
    pub kind: RecordKind,
    pub provenance: Provenance,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_columns: Vec<(String, String)>,
}

impl TransactionRecord {
    pub fn flow(&self) -> Flow {
        if self.withdrawals > 0.0 {
            Flow::Expense
        } else {
            Flow::Income
        }
    }

    pub fn amount(&self) -> f64 {
        if self.withdrawals > 0.0 {
            self.withdrawals
        } else {
            self.deposits
        }
    }

    pub fn is_sample(&self) -> bool {
        self.provenance == Provenance::Sample
    }
}

/// Truncate particulars to the stored width without splitting a char.
pub fn truncate_particulars(text: &str) -> String {
    text.chars().take(PARTICULARS_LIMIT).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StructureSource {
    ExactHeader,
    PartialHeader,
    DataInference,
    Default,
}

/// Column layout inferred once per document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnStructure {
    pub headers: Vec<String>,
    /// Line index of the header row; `None` when the document had none.
    pub header_line: Option<usize>,
    pub column_count: usize,
    pub source: StructureSource,
}

impl ColumnStructure {
    pub fn new(headers: Vec<String>, header_line: Option<usize>, source: StructureSource) -> Self {
        let column_count = headers.len();
        Self {
            headers,
            header_line,
            column_count,
            source,
        }
    }

    /// First line that may hold data.
    pub fn start_line(&self) -> usize {
        self.header_line.map_or(0, |i| i + 1)
    }
}

/// A date plus whether it had to be substituted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedDate {
    pub date: NaiveDate,
    pub defaulted: bool,
}

impl NormalizedDate {
    pub fn iso(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }
}

/// Typed fields routed out of one row by its column headers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowFields {
    pub date: Option<NormalizedDate>,
    pub description: Option<String>,
    pub withdrawal: Option<f64>,
    pub deposit: Option<f64>,
    pub balance: Option<f64>,
    pub amount: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_keyword_scan() {
        assert_eq!(RecordKind::from_particulars("MPAYUPITRTR5092 GOVIND"), RecordKind::Upi);
        assert_eq!(RecordKind::from_particulars("transfer-12345"), RecordKind::Transfer);
        assert_eq!(RecordKind::from_particulars("NEFT CREDIT-SALARY"), RecordKind::Neft);
        assert_eq!(RecordKind::from_particulars("RTGS/HDFC/991"), RecordKind::Rtgs);
        assert_eq!(RecordKind::from_particulars("ATM WITHDRAWAL"), RecordKind::Cash);
        assert_eq!(RecordKind::from_particulars("Opening Balance"), RecordKind::Other);
    }

    #[test]
    fn test_kind_serializes_uppercase() {
        let json = serde_json::to_string(&RecordKind::Upi).unwrap();
        assert_eq!(json, "\"UPI\"");
        assert_eq!(RecordKind::from_tag(" neft "), Some(RecordKind::Neft));
        assert_eq!(RecordKind::from_tag("cheque"), None);
    }

    #[test]
    fn test_flow_follows_withdrawals() {
        let mut rec = TransactionRecord {
            date: NaiveDate::from_ymd_opt(2025, 7, 2).unwrap(),
            particulars: "x".into(),
            depositor: UNKNOWN_CUSTOMER.into(),
            withdrawals: 0.0,
            deposits: 100.0,
            balance: None,
            kind: RecordKind::Other,
            provenance: Provenance::Parsed,
            source_columns: Vec::new(),
        };
        assert_eq!(rec.flow(), Flow::Income);
        assert_eq!(rec.amount(), 100.0);
        rec.withdrawals = 40.0;
        assert_eq!(rec.flow(), Flow::Expense);
        assert_eq!(rec.amount(), 40.0);
    }

    #[test]
    fn test_truncate_particulars_is_char_safe() {
        let long = "₹".repeat(150);
        assert_eq!(truncate_particulars(&long).chars().count(), PARTICULARS_LIMIT);
        assert_eq!(truncate_particulars("short"), "short");
    }

    #[test]
    fn test_start_line() {
        let s = ColumnStructure::new(vec!["Date".into()], Some(3), StructureSource::ExactHeader);
        assert_eq!(s.start_line(), 4);
        let d = ColumnStructure::new(vec!["Date".into()], None, StructureSource::Default);
        assert_eq!(d.start_line(), 0);
        assert_eq!(d.column_count, 1);
    }
}
