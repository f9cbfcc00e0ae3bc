pub mod client;
pub mod cluster;
pub mod common;
pub mod scheduler;

#[cfg(test)]
pub(crate) mod tests;

pub type Error = crate::common::error::SparkHpcError;
pub type Result<T> = std::result::Result<T, Error>;

pub type Map<K, V> = std::collections::HashMap<K, V>;

pub const SPARKHPC_VERSION: &str = {
    match option_env!("SPARKHPC_BUILD_VERSION") {
        Some(version) => version,
        None => const_format::concatcp!(env!("CARGO_PKG_VERSION"), "-dev"),
    }
};
