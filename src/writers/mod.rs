pub mod data_file_writer;

pub use data_file_writer::DataFileWriter;
