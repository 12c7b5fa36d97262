//! Read-only decoder for Jet3 (early Microsoft Access) database files.
//!
//! ```no_run
//! use jet3::{Database, executor::scan::Scanner};
//!
//! let db = Database::open("northwind.mdb")?;
//! for table in db.user_tables()? {
//!     println!("{}", table);
//! }
//! let mut rows = db.rows("Customers")?;
//! while let Some(row) = rows.scan()? {
//!     println!("{:?}", row.values);
//! }
//! # Ok::<(), jet3::DatabaseError>(())
//! ```

pub mod executor;
pub mod storage;
pub mod types;
pub mod utils;

pub use storage::{
    database::{Database, Table, TableColumn},
    header::is_valid_jet3,
    table_def::{Column, TableDefinition},
};
pub use types::{
    error::{DatabaseError, Result},
    row::Row,
    value::{DataType, Value},
};
