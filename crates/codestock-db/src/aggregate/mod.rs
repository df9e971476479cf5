//! # Aggregate Layer
//!
//! Everything that touches more than one table for a single request.
//!
//! ## Fan-in / Fan-out
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  READ (reader.rs)              WRITE (writer.rs)                       │
//! │  ─────────────────             ──────────────────                       │
//! │  products ─┐                   1. products (parent, id known after)    │
//! │  prices ───┼──► ProductView    2. prices   (upsert per currency)       │
//! │  links ────┤                   3. links    (full replace on update)    │
//! │  categories┘                                                            │
//! │                                1. orders         (parent)              │
//! │  orders ───┐                   2. product_orders (upsert per product)  │
//! │  line items┼──► OrderView                                               │
//! │  ProductView (per item)┘                                                │
//! │                                                                         │
//! │  DELETE (cascade.rs)                                                    │
//! │  ───────────────────                                                    │
//! │  children first, parent LAST:                                          │
//! │  product  : links → prices → product                                   │
//! │  company  : (links → prices) per product → products → company          │
//! │  order    : line items → order                                         │
//! │  user     : password → client → role assignments → user → person       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All three operate on a borrowed `SqliteConnection`. [`crate::Catalog`]
//! hands them a transaction so a write or delete is all-or-nothing.

pub mod cascade;
pub mod reader;
pub mod writer;

pub use cascade::{CascadeDeleter, DeleteSummary};
pub use reader::AggregateReader;
pub use writer::AggregateWriter;
