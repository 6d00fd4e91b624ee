//! The host event record: typed data products stored by label.

use crate::{Error, Result};
use std::any::{Any, TypeId};
use std::collections::HashMap;

type ProductKey = (String, TypeId);

/// One event's data products.
///
/// A product is identified by its label together with its type, so the
/// same label may hold, say, a `Vec<EnergyDeposit>` and a `Vec<SimChannel>`.
#[derive(Default)]
pub struct Event {
    id: u64,
    time: f64,
    products: HashMap<ProductKey, Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut labels: Vec<&str> = self.products.keys().map(|(l, _)| l.as_str()).collect();
        labels.sort_unstable();
        f.debug_struct("Event")
            .field("id", &self.id)
            .field("time", &self.time)
            .field("labels", &labels)
            .finish()
    }
}

impl Event {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Sets the event time relative to the start of its run.
    #[must_use]
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Stores `product` under `label`, replacing any product of the same
    /// type and label.
    pub fn put<T: Any + Send + Sync>(&mut self, label: impl Into<String>, product: T) {
        self.products
            .insert((label.into(), TypeId::of::<T>()), Box::new(product));
    }

    /// Looks up a product by type and label.
    pub fn get<T: Any>(&self, label: &str) -> Option<&T> {
        self.products
            .get(&(label.to_string(), TypeId::of::<T>()))
            .and_then(|p| p.downcast_ref::<T>())
    }

    /// Like [`Event::get`], failing with [`Error::InputMissing`].
    pub fn require<T: Any>(&self, label: &str) -> Result<&T> {
        self.get(label).ok_or_else(|| Error::missing(label))
    }

    pub fn contains<T: Any>(&self, label: &str) -> bool {
        self.get::<T>(label).is_some()
    }

    /// Removes and returns a product.
    pub fn take<T: Any>(&mut self, label: &str) -> Option<T> {
        self.products
            .remove(&(label.to_string(), TypeId::of::<T>()))
            .and_then(|p| p.downcast::<T>().ok())
            .map(|b| *b)
    }

    /// Number of stored products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

/// A component that reads from and/or writes to each event in turn.
pub trait EventVisitor {
    /// Processes one event. An error aborts the event and leaves no output
    /// product from this visitor.
    fn visit(&mut self, event: &mut Event) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products_keyed_by_type_and_label() {
        let mut ev = Event::new(3).with_time(1.5);
        ev.put("a", vec![1_i32, 2, 3]);
        ev.put("a", vec![0.5_f64]);
        assert_eq!(ev.len(), 2);
        assert_eq!(ev.get::<Vec<i32>>("a").unwrap(), &vec![1, 2, 3]);
        assert_eq!(ev.get::<Vec<f64>>("a").unwrap().len(), 1);
        assert!(ev.get::<Vec<i32>>("b").is_none());
        assert_eq!(ev.id(), 3);
    }

    #[test]
    fn test_require_reports_label() {
        let ev = Event::new(0);
        let err = ev.require::<Vec<i32>>("badmask").unwrap_err();
        assert_eq!(
            err,
            Error::InputMissing {
                label: "badmask".into()
            }
        );
    }

    #[test]
    fn test_take() {
        let mut ev = Event::new(0);
        ev.put("x", 7_u8);
        assert_eq!(ev.take::<u8>("x"), Some(7));
        assert!(ev.is_empty());
    }
}
