pub mod row_decoder;
pub mod scan;
pub mod sequential_scan;
pub mod value_decoder;
