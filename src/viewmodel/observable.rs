use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use tokio::sync::broadcast;

const CHANGE_BUFFER: usize = 64;

/// Names of the observable properties a view can bind to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Property {
    Title,
    IsBusy,
    IsNotBusy,
    Recipes,
    Recipe,
}

/// Title + busy flag shared by every screen model, with change notification.
pub struct ViewModelBase {
    title: RwLock<String>,
    busy: AtomicBool,
    changes: broadcast::Sender<Property>,
}

impl ViewModelBase {
    pub fn new(title: impl Into<String>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self { title: RwLock::new(title.into()), busy: AtomicBool::new(false), changes }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Property> {
        self.changes.subscribe()
    }

    pub fn notify(&self, property: Property) {
        // no subscribers is fine
        let _ = self.changes.send(property);
    }

    pub(crate) fn sender(&self) -> broadcast::Sender<Property> {
        self.changes.clone()
    }

    pub fn title(&self) -> String {
        self.title.read().expect("title lock poisoned").clone()
    }

    pub fn set_title(&self, value: impl Into<String>) {
        let value = value.into();
        {
            let mut title = self.title.write().expect("title lock poisoned");
            if *title == value {
                return;
            }
            *title = value;
        }
        self.notify(Property::Title);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn is_not_busy(&self) -> bool {
        !self.is_busy()
    }

    /// Marks the model busy, or returns None when it already is.
    /// The flag clears when the guard drops.
    pub fn try_begin_busy(&self) -> Option<BusyGuard<'_>> {
        if self.busy.swap(true, Ordering::SeqCst) {
            return None;
        }
        self.notify_busy();
        Some(BusyGuard { base: self })
    }

    fn notify_busy(&self) {
        self.notify(Property::IsBusy);
        self.notify(Property::IsNotBusy);
    }
}

pub struct BusyGuard<'a> {
    base: &'a ViewModelBase,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.base.busy.store(false, Ordering::SeqCst);
        self.base.notify_busy();
    }
}

/// Ordered collection whose replacement is published as one change.
pub struct ObservableList<T> {
    items: RwLock<Vec<T>>,
    property: Property,
    changes: broadcast::Sender<Property>,
}

impl<T: Clone> ObservableList<T> {
    pub fn new(property: Property, changes: broadcast::Sender<Property>) -> Self {
        Self { items: RwLock::new(Vec::new()), property, changes }
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.items.read().expect("list lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().expect("list lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.items.read().expect("list lock poisoned").get(index).cloned()
    }

    /// Clear then append in order, under a single write lock.
    pub fn replace_all(&self, new_items: impl IntoIterator<Item = T>) {
        {
            let mut items = self.items.write().expect("list lock poisoned");
            items.clear();
            items.extend(new_items);
        }
        let _ = self.changes.send(self.property);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut broadcast::Receiver<Property>) -> Vec<Property> {
        let mut out = Vec::new();
        while let Ok(p) = rx.try_recv() {
            out.push(p);
        }
        out
    }

    #[test]
    fn title_notifies_only_on_change() {
        let base = ViewModelBase::new("Recipes");
        let mut rx = base.subscribe();
        base.set_title("Recipes");
        assert!(drain(&mut rx).is_empty());
        base.set_title("Tarte Details");
        assert_eq!(drain(&mut rx), vec![Property::Title]);
        assert_eq!(base.title(), "Tarte Details");
    }

    #[test]
    fn busy_guard_is_exclusive_and_released_on_drop() {
        let base = ViewModelBase::new("t");
        let mut rx = base.subscribe();
        {
            let _g = base.try_begin_busy().expect("first guard");
            assert!(base.is_busy());
            assert!(!base.is_not_busy());
            assert!(base.try_begin_busy().is_none());
        }
        assert!(base.is_not_busy());
        assert_eq!(
            drain(&mut rx),
            vec![Property::IsBusy, Property::IsNotBusy, Property::IsBusy, Property::IsNotBusy]
        );
    }

    #[test]
    fn replace_all_keeps_order_and_notifies_once() {
        let base = ViewModelBase::new("t");
        let mut rx = base.subscribe();
        let list = ObservableList::new(Property::Recipes, base.sender());
        list.replace_all(vec![3, 1, 2]);
        list.replace_all(vec![9]);
        assert_eq!(list.snapshot(), vec![9]);
        assert_eq!(list.get(0), Some(9));
        assert_eq!(list.get(1), None);
        assert_eq!(drain(&mut rx), vec![Property::Recipes, Property::Recipes]);
    }
}
