pub mod cas_fs;
