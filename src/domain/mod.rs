pub mod item_record;
pub mod numeric;
