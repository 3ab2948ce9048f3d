pub mod inspect;
pub mod purge_expired;
pub mod serve;
