//! The extraction record: everything read off page 1 of a work order.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Labels of the form fields the downstream header record is built from.
pub mod labels {
    pub const PRISM_ID: &str = "PRISM ID";
    pub const PO_NUMBER: &str = "PO #";
    pub const COORDINATOR: &str = "Const Coordinator";
    pub const WORK_TYPE: &str = "Const Type";
    pub const PO_AMOUNT: &str = "PO Amount";
    pub const VENDOR_NAME: &str = "Vendor Name";

    /// Address table columns.
    pub const JOB: &str = "Job";
    pub const JOB_ADDRESS: &str = "Job Address";
}

/// Free-form key/value pairs, last write wins.
pub type FieldMap = BTreeMap<String, String>;

/// The named form fields the rest of the pipeline relies on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkOrderFields {
    pub prism_id: Option<String>,
    pub po_number: Option<String>,
    pub coordinator: Option<String>,
    pub work_type: Option<String>,
    pub po_amount: Option<String>,
    pub vendor_name: Option<String>,
}

impl WorkOrderFields {
    fn from_fields(fields: &FieldMap) -> Self {
        let get = |label: &str| fields.get(label).cloned();
        Self {
            prism_id: get(labels::PRISM_ID),
            po_number: get(labels::PO_NUMBER),
            coordinator: get(labels::COORDINATOR),
            work_type: get(labels::WORK_TYPE),
            po_amount: get(labels::PO_AMOUNT),
            vendor_name: get(labels::VENDOR_NAME),
        }
    }
}

/// Header cell -> value cell of the single-row address table, in column order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressTable {
    entries: Vec<(String, String)>,
}

impl AddressTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a column, replacing the value of an existing column with the same header.
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        let header = header.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(h, _)| *h == header) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((header, value)),
        }
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(h, v)| (h.as_str(), v.as_str()))
    }
}

impl<H: Into<String>, V: Into<String>> FromIterator<(H, V)> for AddressTable {
    fn from_iter<I: IntoIterator<Item = (H, V)>>(iter: I) -> Self {
        let mut table = AddressTable::new();
        for (h, v) in iter {
            table.insert(h, v);
        }
        table
    }
}

impl Serialize for AddressTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (h, v) in &self.entries {
            map.serialize_entry(h, v)?;
        }
        map.end()
    }
}

/// One row of the work order (line item) table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct LineItem {
    pub code: String,
    pub description: String,
    pub quantity: String,
    #[serde(rename = "UOM")]
    pub uom: String,
    pub rate: String,
    pub amount: String,
}

impl LineItem {
    /// Column headers a line item table must carry.
    pub const COLUMNS: [&'static str; 6] = ["Code", "Description", "Quantity", "UOM", "Rate", "Amount"];
}

/// A recoverable absence or malformation in the source data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Degradation {
    /// No table was detected; address fields are empty.
    MissingAddressTable,
    /// Fewer than two tables were detected; there are no line items.
    MissingLineItemTable,
    /// A field the header record is built from was not found.
    MissingField { field: String },
    /// The job address did not end in a "City, STATE ZIP" line.
    MalformedAddress { address: String },
    /// A line item quantity could not be read as a number.
    InvalidQuantity { code: String, quantity: String },
}

impl fmt::Display for Degradation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingAddressTable => write!(f, "no address table found"),
            Self::MissingLineItemTable => write!(f, "no line item table found"),
            Self::MissingField { field } => write!(f, "field '{}' not found", field),
            Self::MalformedAddress { address } => {
                write!(f, "address {:?} has no 'City, STATE ZIP' line", address)
            }
            Self::InvalidQuantity { code, quantity } => {
                write!(f, "invalid quantity '{}' for code '{}'", quantity, code)
            }
        }
    }
}

/// Everything extracted from page 1 of a work order.
///
/// Built once per document and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionRecord {
    fields: FieldMap,
    #[serde(skip)]
    work_order: WorkOrderFields,
    #[serde(rename = "address_data")]
    address: AddressTable,
    line_items: Vec<LineItem>,
    notes: Vec<Degradation>,
}

impl ExtractionRecord {
    pub fn new(
        fields: FieldMap,
        address: AddressTable,
        line_items: Vec<LineItem>,
        notes: Vec<Degradation>,
    ) -> Self {
        let work_order = WorkOrderFields::from_fields(&fields);
        Self {
            fields,
            work_order,
            address,
            line_items,
            notes,
        }
    }

    /// All key/value pairs found on the page.
    pub fn fields(&self) -> &FieldMap {
        &self.fields
    }

    /// Value of a free-form field, by its label on the form.
    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields.get(label).map(String::as_str)
    }

    pub fn work_order(&self) -> &WorkOrderFields {
        &self.work_order
    }

    pub fn address(&self) -> &AddressTable {
        &self.address
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Degraded-data conditions met while extracting.
    pub fn notes(&self) -> &[Degradation] {
        &self.notes
    }
}
