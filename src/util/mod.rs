pub mod cancel;
pub(crate) mod lock;
