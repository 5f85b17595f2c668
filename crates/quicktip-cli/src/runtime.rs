// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use quicktip_app::{NewTipRecord, SubscriptionId, TipRecord, TipRecordId};
use quicktip_db::Store;
use std::cell::Cell;
use std::rc::Rc;

/// Backs the TUI with a [`Store`]. Every store change bumps the revision
/// so the UI knows to reload history.
pub struct DbRuntime<'a> {
    store: &'a Store,
    revision: Rc<Cell<u64>>,
    subscription: SubscriptionId,
}

impl<'a> DbRuntime<'a> {
    pub fn new(store: &'a Store) -> Self {
        let revision = Rc::new(Cell::new(0u64));
        let counter = Rc::clone(&revision);
        let subscription = store.subscribe(move |change| {
            counter.set(counter.get().wrapping_add(1));
            tracing::trace!(?change, revision = counter.get(), "store changed");
        });
        Self {
            store,
            revision,
            subscription,
        }
    }
}

impl Drop for DbRuntime<'_> {
    fn drop(&mut self) {
        self.store.unsubscribe(self.subscription);
    }
}

impl quicktip_tui::AppRuntime for DbRuntime<'_> {
    fn load_history(&mut self) -> Result<Vec<TipRecord>> {
        self.store.all()
    }

    fn record_tip(&mut self, record: &NewTipRecord) -> Result<TipRecordId> {
        self.store.append(record)
    }

    fn delete_tip(&mut self, id: TipRecordId) -> Result<bool> {
        self.store.delete(id)
    }

    fn revision(&self) -> u64 {
        self.revision.get()
    }
}

#[cfg(test)]
mod tests {
    use super::DbRuntime;
    use anyhow::Result;
    use quicktip_app::{FormState, NewTipRecord};
    use quicktip_db::Store;
    use quicktip_testkit::{TipFaker, fixture_datetime};
    use quicktip_tui::AppRuntime;

    fn bootstrapped_store() -> Result<Store> {
        let store = Store::open_memory()?;
        store.bootstrap()?;
        Ok(store)
    }

    #[test]
    fn record_tip_persists_and_bumps_revision() -> Result<()> {
        let store = bootstrapped_store()?;
        let mut runtime = DbRuntime::new(&store);
        let form = FormState {
            bill_input: "42.50".to_owned(),
            selected_percent_index: 1,
            ..FormState::default()
        };
        let record = form.record(fixture_datetime()).expect("bill entered");

        let before = runtime.revision();
        let id = runtime.record_tip(&record)?;

        assert_ne!(runtime.revision(), before);
        let history = runtime.load_history()?;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].id, id);
        assert_eq!(history[0].tip_amount, 6.375);
        Ok(())
    }

    #[test]
    fn delete_tip_reports_missing_records_without_bumping() -> Result<()> {
        let store = bootstrapped_store()?;
        let mut runtime = DbRuntime::new(&store);
        let id = runtime.record_tip(&NewTipRecord::new(10.0, 20, fixture_datetime()))?;

        assert!(runtime.delete_tip(id)?);
        let after_delete = runtime.revision();
        assert!(!runtime.delete_tip(id)?);
        assert_eq!(runtime.revision(), after_delete);
        assert!(runtime.load_history()?.is_empty());
        Ok(())
    }

    #[test]
    fn writes_outside_the_runtime_are_observed() -> Result<()> {
        let store = bootstrapped_store()?;
        let runtime = DbRuntime::new(&store);
        let before = runtime.revision();

        store.append_all(&TipFaker::new(9).history(fixture_datetime(), 2))?;
        assert_ne!(runtime.revision(), before);
        Ok(())
    }

    #[test]
    fn dropping_runtime_unsubscribes() -> Result<()> {
        let store = bootstrapped_store()?;
        let subscription = DbRuntime::new(&store).subscription;
        assert!(!store.unsubscribe(subscription));
        Ok(())
    }
}
