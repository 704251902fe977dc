//! `RwLock` access that survives poisoning: the guard is taken out of the
//! `PoisonError` and a warning is logged.

use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

pub(crate) trait RecoverLock<T> {
    fn read_recovered(&self, source: &'static str, op: &'static str) -> RwLockReadGuard<'_, T>;

    fn write_recovered(&self, source: &'static str, op: &'static str)
    -> RwLockWriteGuard<'_, T>;
}

impl<T> RecoverLock<T> for RwLock<T> {
    fn read_recovered(&self, source: &'static str, op: &'static str) -> RwLockReadGuard<'_, T> {
        self.read()
            .unwrap_or_else(|poisoned| recover(poisoned, source, op, "read"))
    }

    fn write_recovered(
        &self,
        source: &'static str,
        op: &'static str,
    ) -> RwLockWriteGuard<'_, T> {
        self.write()
            .unwrap_or_else(|poisoned| recover(poisoned, source, op, "write"))
    }
}

fn recover<G>(
    poisoned: PoisonError<G>,
    source: &'static str,
    op: &'static str,
    access: &'static str,
) -> G {
    warn!(
        op,
        source,
        access,
        "lock poisoned by an earlier panic; continuing with current contents"
    );
    poisoned.into_inner()
}
