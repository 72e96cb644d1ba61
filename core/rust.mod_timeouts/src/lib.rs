pub mod audit;
pub mod duration;
pub mod ledger;
pub mod manager;
pub mod members;
pub mod recovery;
pub mod registry;

#[cfg(test)]
pub(crate) mod test_utils;

pub type Error = Box<dyn std::error::Error + Send + Sync>; // This is constant and should be copy pasted

/// Returns the number of seconds since the unix epoch
pub fn get_unix_time() -> i64 {
    chrono::Utc::now().timestamp()
}
