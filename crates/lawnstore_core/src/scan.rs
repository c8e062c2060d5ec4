//! Full-store cursor scans.

use crate::adapter::Inner;
use crate::error::AdapterResult;
use crate::record::Record;
use lawnstore_engine::{
    Connection, Cursor, CursorStep, Factory, Key, ObjectStore, Request, TransactionMode,
};

impl<F: Factory> Inner<F> {
    /// Every record in key order.
    pub(crate) fn all<D>(&self, done: D)
    where
        D: FnOnce(AdapterResult<Vec<Record>>) + Send + 'static,
    {
        self.scan(
            |cursor| Record {
                key: Some(cursor.key().clone()),
                data: cursor.value().clone(),
            },
            done,
        );
    }

    /// Every key in key order.
    pub(crate) fn keys<D>(&self, done: D)
    where
        D: FnOnce(AdapterResult<Vec<Key>>) + Send + 'static,
    {
        self.scan(|cursor| cursor.key().clone(), done);
    }

    fn scan<T, P, D>(&self, project: P, done: D)
    where
        T: Send + 'static,
        P: Fn(&CursorOf<F>) -> T + Send + 'static,
        D: FnOnce(AdapterResult<Vec<T>>) + Send + 'static,
    {
        match self.manager.store(TransactionMode::ReadOnly) {
            Ok(store) => collect(store.open_cursor(None), Vec::new(), project, done),
            Err(err) => done(Err(err)),
        }
    }
}

type CursorOf<F> = <<<F as Factory>::Connection as Connection>::Store as ObjectStore>::Cursor;

/// Follows the cursor until it reports either end sentinel.
///
/// Steps that completed synchronously are consumed in a loop; only a step
/// still pending in the engine parks the scan on a listener.
fn collect<C, T, P, D>(mut request: Request<CursorStep<C>>, mut acc: Vec<T>, project: P, done: D)
where
    C: Cursor,
    T: Send + 'static,
    P: Fn(&C) -> T + Send + 'static,
    D: FnOnce(AdapterResult<Vec<T>>) + Send + 'static,
{
    loop {
        match request.try_take() {
            Ok(Ok(CursorStep::Positioned(cursor))) => {
                acc.push(project(&cursor));
                request = cursor.advance();
            }
            Ok(Ok(CursorStep::Null | CursorStep::Undefined)) => return done(Ok(acc)),
            Ok(Err(err)) => return done(Err(err.into())),
            Err(pending) => {
                return pending.on_complete(move |result| {
                    collect(Request::completed(result), acc, project, done);
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::adapter::Adapter;
    use crate::config::AdapterConfig;
    use crate::connection::STORE_NAME;
    use crate::error::AdapterError;
    use crate::probe::Environment;
    use lawnstore_engine::{EngineError, Key, MemoryFactory, RequestKind, StoreParams};
    use serde_json::json;

    fn seeded(factory: MemoryFactory) -> Adapter<MemoryFactory> {
        factory.seed_store(
            "scan",
            crate::connection::STORE_VERSION,
            STORE_NAME,
            StoreParams::default(),
            [
                (Key::from("b"), json!(2)),
                (Key::from(3_i64), json!(3)),
                (Key::from("a"), json!(1)),
            ],
        );
        let (adapter, _) =
            Adapter::open(AdapterConfig::new("scan"), Environment::standard(factory)).unwrap();
        adapter
    }

    #[test]
    fn keys_come_back_in_key_order() {
        let adapter = seeded(MemoryFactory::new());
        let mut keys = adapter.keys();
        assert_eq!(
            keys.try_result(),
            Some(Ok(vec![Key::Int(3), Key::from("a"), Key::from("b")]))
        );
    }

    #[test]
    fn undefined_end_terminates_scan() {
        let adapter = seeded(MemoryFactory::new().with_undefined_cursor_end());
        let mut all = adapter.all();
        let records = all.try_result().unwrap().unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].data, json!(1));
    }

    #[test]
    fn advance_failure_ends_scan_with_error() {
        let factory = MemoryFactory::new();
        let adapter = seeded(factory.clone());
        factory.fail_next(RequestKind::Advance, EngineError::failure("torn"));

        let mut all = adapter.all();
        assert_eq!(
            all.try_result(),
            Some(Err(AdapterError::Engine(EngineError::failure("torn"))))
        );
    }
}
