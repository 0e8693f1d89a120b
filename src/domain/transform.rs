//! Record builder: extraction record -> downstream header and units records.

use super::address::{parse_address, Address};
use super::record::{labels, Degradation, ExtractionRecord, LineItem};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// Sentinel the downstream system expects in the customer column.
pub const UNKNOWN_CUSTOMER: &str = "#N/A";

/// Normalized work order header, serialized with the downstream column names.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeaderRecord {
    #[serde(rename = "Prism_N")]
    pub prism_id: String,
    #[serde(rename = "PO_NetBuild")]
    pub po_number: String,
    #[serde(rename = "Date_Received")]
    pub date_received: String,
    #[serde(rename = "Coordinator")]
    pub coordinator: String,
    #[serde(rename = "Customer")]
    pub customer: String,
    #[serde(rename = "STS_Rep")]
    pub sts_rep: Option<String>,
    #[serde(rename = "Work_Type")]
    pub work_type: String,
    #[serde(rename = "Address")]
    pub street: String,
    #[serde(rename = "City")]
    pub city: String,
    #[serde(rename = "State")]
    pub state: String,
    #[serde(rename = "Zip")]
    pub zip: String,
    #[serde(rename = "Project_Name")]
    pub project_name: String,
    #[serde(rename = "Estimated_Amount")]
    pub estimated_amount: String,
    /// Populated from "Vendor Name", as the downstream import has always done.
    #[serde(rename = "ECD_Date")]
    pub ecd_date: String,
}

/// Quantities per work item code.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitsRecord {
    #[serde(rename = "Prism_N")]
    pub prism_id: String,
    #[serde(rename = "Project_Name")]
    pub project_name: String,
    #[serde(flatten)]
    pub quantities: BTreeMap<String, i64>,
}

/// Result of [`transform`]: both records plus what had to be defaulted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransformOutput {
    pub header: HeaderRecord,
    pub units: UnitsRecord,
    pub notes: Vec<Degradation>,
}

/// Builds the header and units records. `received` becomes `Date_Received`.
pub fn transform(record: &ExtractionRecord, received: NaiveDate) -> TransformOutput {
    let mut notes = Vec::new();
    let wo = record.work_order();

    let mut required = |value: &Option<String>, label: &str| -> String {
        value.clone().unwrap_or_else(|| {
            notes.push(Degradation::MissingField {
                field: label.to_string(),
            });
            String::new()
        })
    };

    let prism_id = required(&wo.prism_id, labels::PRISM_ID);
    let po_number = required(&wo.po_number, labels::PO_NUMBER);
    let coordinator = required(&wo.coordinator, labels::COORDINATOR);
    let work_type = required(&wo.work_type, labels::WORK_TYPE);
    let estimated_amount = required(&wo.po_amount, labels::PO_AMOUNT);
    let ecd_date = required(&wo.vendor_name, labels::VENDOR_NAME);

    let project_name = record
        .address()
        .get(labels::JOB)
        .unwrap_or_default()
        .to_string();

    let address = match record.address().get(labels::JOB_ADDRESS) {
        Some(raw) => parse_address(raw).unwrap_or_else(|fallback| {
            notes.push(Degradation::MalformedAddress {
                address: raw.to_string(),
            });
            fallback
        }),
        None => {
            notes.push(Degradation::MissingField {
                field: labels::JOB_ADDRESS.to_string(),
            });
            Address::default()
        }
    };

    let (quantities, quantity_notes) = aggregate_units(record.line_items());
    notes.extend(quantity_notes);

    for note in &notes {
        warn!(%note, "Degraded work order data");
    }

    TransformOutput {
        header: HeaderRecord {
            prism_id: prism_id.clone(),
            po_number,
            date_received: received.format("%Y-%m-%d").to_string(),
            coordinator,
            customer: UNKNOWN_CUSTOMER.to_string(),
            sts_rep: None,
            work_type,
            street: address.street,
            city: address.city,
            state: address.state,
            zip: address.zip,
            project_name: project_name.clone(),
            estimated_amount,
            ecd_date,
        },
        units: UnitsRecord {
            prism_id,
            project_name,
            quantities,
        },
        notes,
    }
}

/// Parses a quantity cell as a decimal number truncated toward zero.
pub fn parse_quantity(raw: &str) -> Option<i64> {
    let value: f64 = raw.trim().parse().ok()?;
    if !value.is_finite() || value.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(value.trunc() as i64)
}

/// Sums quantities per code. Items whose quantity does not parse, or would
/// overflow their code's total, are skipped and reported; they never affect
/// other items' sums.
pub fn aggregate_units(items: &[LineItem]) -> (BTreeMap<String, i64>, Vec<Degradation>) {
    let mut totals = BTreeMap::new();
    let mut notes = Vec::new();

    for item in items {
        let total = totals.get(&item.code).copied().unwrap_or(0_i64);
        match parse_quantity(&item.quantity).and_then(|q| total.checked_add(q)) {
            Some(sum) => {
                totals.insert(item.code.clone(), sum);
            }
            None => notes.push(Degradation::InvalidQuantity {
                code: item.code.clone(),
                quantity: item.quantity.clone(),
            }),
        }
    }

    (totals, notes)
}
