pub mod handle_storage;
