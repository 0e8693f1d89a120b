//! Work order data model and the record builder.
//!
//! [`ExtractionRecord`] is what extraction produces; [`transform`] turns it
//! into the [`HeaderRecord`] / [`UnitsRecord`] pair the downstream import
//! consumes.

pub mod address;
pub mod record;
pub mod transform;

pub use address::{parse_address, Address};
pub use record::{
    labels, AddressTable, Degradation, ExtractionRecord, FieldMap, LineItem, WorkOrderFields,
};
pub use transform::{
    aggregate_units, parse_quantity, transform, HeaderRecord, TransformOutput, UnitsRecord,
    UNKNOWN_CUSTOMER,
};
