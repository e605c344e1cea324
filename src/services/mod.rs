pub mod metafield_api;
