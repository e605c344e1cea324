mod access_token;

pub use access_token::{AccessToken, SHOPIFY_ACCESS_TOKEN_HEADER};
