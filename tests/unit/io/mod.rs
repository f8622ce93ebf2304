mod aoi_file;
mod ascii;
mod error;
mod modspec;
mod units;
