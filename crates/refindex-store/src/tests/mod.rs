mod common;

mod label_registry;
mod range_index;
