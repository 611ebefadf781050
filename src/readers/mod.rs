pub mod data_file_reader;

pub use data_file_reader::{parse_file_date, DataFileReader};
