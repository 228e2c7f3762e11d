pub mod scratch_storage;
