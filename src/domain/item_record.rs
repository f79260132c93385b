use serde::Serialize;

/// One extracted procurement line item. Field order matters: the sheet sink
/// serializes positionally under `SHEET_HEADER`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRecord {
    pub dispense_number: String,
    pub opening_date: String,
    pub description: String,
    pub state_code: String,
    pub winner: String,
    pub brand: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub total_price: f64,
    pub item_status: String,
}

pub const SHEET_HEADER: [&str; 10] = [
    "Number",
    "Opening Date",
    "Description",
    "State",
    "Winner",
    "Brand",
    "Quantity",
    "Unit Price",
    "Total Price",
    "Item Status",
];
