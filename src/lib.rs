//! Capacidad crediticia de productores agropecuarios a partir de tablas CSV
//! en formato entidad-atributo-valor.

pub mod agriculture;
pub mod assets;
pub mod commands;
pub mod config;
pub mod credit;
pub mod csv_parser;
pub mod error;
pub mod facts;
pub mod file_utils;
pub mod geo;
pub mod livestock;
pub mod loader;
pub mod models;
pub mod query;
pub mod view;

pub use csv_parser::{parse_csv, Record};
pub use loader::{load_data_dir, DataSet, Session, TableLayout};
pub use models::Cuit;
pub use view::ProducerView;
